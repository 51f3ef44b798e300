use serde::{Deserialize, Serialize};

/// Result returned when a sound has been written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub path: String,
    pub sample_rate: u32,
    pub clip_count: usize,
    pub total_samples: usize,
    /// Header plus sample data.
    pub bytes_written: u64,
    pub duration_secs: f64,
    /// SHA-256 hex digest of every byte written.
    pub checksum: String,
}

impl SaveReport {
    pub fn metadata(&self) -> RecordingMetadata {
        RecordingMetadata::from_report(self)
    }
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub sample_rate: u32,
    pub clip_count: usize,
    pub total_samples: usize,
    pub duration_secs: f64,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn from_report(report: &SaveReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: report.path.clone(),
            sample_rate: report.sample_rate,
            clip_count: report.clip_count,
            total_samples: report.total_samples,
            duration_secs: report.duration_secs,
            checksum: report.checksum.clone(),
        }
    }
}
