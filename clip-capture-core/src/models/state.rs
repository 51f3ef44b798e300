/// Capture session state machine.
///
/// State transitions:
/// ```text
/// stopped → running → stopped
/// ```
/// `start` while running is rejected rather than spawning a second loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Stopped,
    Running,
}

impl CaptureState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}
