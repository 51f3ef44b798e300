use std::time::Duration;

use crate::models::error::CaptureError;

/// Interface for the real-time hardware source feeding the capture loop.
///
/// Implementations deliver mono 16-bit samples. Pin mapping, clocking and
/// DMA setup are the implementation's business; the capture session only
/// configures the rate and pulls samples.
pub trait SampleSource: Send {
    /// Prepare the source for mono 16-bit capture at `sample_rate`.
    ///
    /// Failure here is fatal to `CaptureSession::start` and should be
    /// reported as `CaptureError::DriverError`.
    fn configure(&mut self, sample_rate: u32) -> Result<(), CaptureError>;

    /// Block for at most `timeout` and fill the front of `buf` with samples.
    ///
    /// Returns the number of samples written. `Ok(0)` and errors are both
    /// treated as a transient bad read by the capture loop.
    fn read_samples(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, CaptureError>;
}
