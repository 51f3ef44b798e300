use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use crate::processing::wav_format::MAX_SAMPLE_RATE;

/// Largest gain shift that keeps at least one significant bit of a 16-bit sample.
pub const MAX_GAIN_SHIFT: u32 = 15;

/// Configuration for a capture session and the sounds it feeds.
///
/// Immutable once a session is built, except for the gain which the session
/// exposes as a runtime knob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Sampling rate in Hz (default: 44100). Mono, 16-bit.
    pub sample_rate: u32,

    /// Samples per full clip (default: 22050, half a second at 44.1 kHz).
    pub clip_size: usize,

    /// Expected clip count per sound, used to pre-size clip storage (default: 40).
    pub reserve_clip_count: usize,

    /// Left shift applied to every captured sample (default: 3).
    pub gain_shift: u32,

    /// Maximum samples requested from the hardware source per read (default: 1024).
    pub chunk_size: usize,

    /// Number of completed clips the handoff queue holds (default: 3).
    pub queue_depth: usize,

    /// Hardware read timeout in milliseconds (default: 100).
    pub read_timeout_ms: u64,

    /// How long a full queue may block the producer before the clip is dropped (default: 100).
    pub send_timeout_ms: u64,

    /// Pause between capture loop iterations in milliseconds (default: 1).
    pub tick_ms: u64,
}

impl CaptureConfiguration {
    /// Parse a JSON document; keys that are absent take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::InvalidArgument(format!("bad configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate == 0 {
            return Err(CaptureError::InvalidArgument("sample rate must be positive".into()));
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(CaptureError::InvalidArgument(format!(
                "sample rate {} exceeds {}",
                self.sample_rate, MAX_SAMPLE_RATE
            )));
        }
        if self.clip_size == 0 {
            return Err(CaptureError::InvalidArgument("clip size must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(CaptureError::InvalidArgument("chunk size must be positive".into()));
        }
        if self.queue_depth == 0 {
            return Err(CaptureError::InvalidArgument("queue depth must be positive".into()));
        }
        if self.gain_shift > MAX_GAIN_SHIFT {
            return Err(CaptureError::InvalidArgument(format!(
                "gain shift {} exceeds {}",
                self.gain_shift, MAX_GAIN_SHIFT
            )));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            clip_size: 22050,
            reserve_clip_count: 40,
            gain_shift: 3,
            chunk_size: 1024,
            queue_depth: 3,
            read_timeout_ms: 100,
            send_timeout_ms: 100,
            tick_ms: 1,
        }
    }
}
