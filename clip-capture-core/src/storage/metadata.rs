use std::io::{Read, Write};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;
use crate::storage::wav_codec::write_fully;
use crate::traits::storage::Storage;

/// Sidecar path for a recording: `/rec/take.wav` becomes `/rec/take.metadata.json`.
pub fn metadata_path(recording_path: &str) -> String {
    let stem = recording_path.strip_suffix(".wav").unwrap_or(recording_path);
    format!("{}.metadata.json", stem)
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(
    storage: &dyn Storage,
    metadata: &RecordingMetadata,
    recording_path: &str,
) -> Result<(), CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    let mut writer = storage
        .open_write(&path)
        .map_err(|e| CaptureError::WriteError(format!("unable to create {}: {}", path, e)))?;
    write_fully(&mut writer, json.as_bytes())?;
    writer
        .flush()
        .map_err(|e| CaptureError::WriteError(format!("flush failed: {}", e)))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(storage: &dyn Storage, recording_path: &str) -> Result<RecordingMetadata, CaptureError> {
    let path = metadata_path(recording_path);
    if !storage.exists(&path) {
        return Err(CaptureError::SourceMissing(path));
    }
    let mut json = String::new();
    storage
        .open_read(&path)
        .and_then(|mut reader| reader.read_to_string(&mut json))
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata: RecordingMetadata = serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}
