//! In-process sample source that replays a fixed recording.
//!
//! Stands in for the microphone when simulating a capture session: samples
//! come out in chunks no larger than the caller's buffer, and once the
//! recording is exhausted every read waits out its timeout and returns
//! nothing, the way an idle peripheral would.

use std::thread;
use std::time::Duration;

use crate::models::error::CaptureError;
use crate::traits::sample_source::SampleSource;

#[derive(Debug, Clone)]
pub struct ReplaySource {
    samples: Vec<i16>,
    position: usize,
    max_per_read: Option<usize>,
    configured_rate: Option<u32>,
}

impl ReplaySource {
    pub fn new(samples: Vec<i16>) -> Self {
        Self {
            samples,
            position: 0,
            max_per_read: None,
            configured_rate: None,
        }
    }

    /// Cap every read at `max` samples to simulate partial reads.
    pub fn with_max_read(mut self, max: usize) -> Self {
        self.max_per_read = Some(max.max(1));
        self
    }

    /// Samples not yet delivered.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }

    /// Rate passed to the last `configure` call.
    pub fn configured_rate(&self) -> Option<u32> {
        self.configured_rate
    }
}

impl SampleSource for ReplaySource {
    fn configure(&mut self, sample_rate: u32) -> Result<(), CaptureError> {
        if sample_rate == 0 {
            return Err(CaptureError::DriverError("sample rate must be positive".into()));
        }
        self.configured_rate = Some(sample_rate);
        Ok(())
    }

    fn read_samples(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, CaptureError> {
        let remaining = self.remaining();
        if remaining == 0 {
            thread::sleep(timeout);
            return Ok(0);
        }

        let count = buf
            .len()
            .min(remaining)
            .min(self.max_per_read.unwrap_or(usize::MAX));
        buf[..count].copy_from_slice(&self.samples[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}
