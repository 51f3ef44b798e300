/// Counters kept by the capture loop for debugging sample loss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    /// Clips accepted by the handoff queue.
    pub clips_dispatched: u64,
    /// Clips discarded because the queue stayed full past the send timeout.
    pub clips_dropped: u64,
    /// Samples obtained from the hardware source.
    pub samples_captured: u64,
    /// Reads that returned nothing or failed.
    pub read_errors: u64,
    /// Reads that returned fewer samples than requested.
    pub partial_reads: u64,
    /// Highest queue occupancy seen right after a dispatch.
    pub queue_high_water: usize,
    /// Samples in the partial clip thrown away when capture stopped.
    pub samples_discarded: u64,
}

impl CaptureDiagnostics {
    /// Fraction of completed clips that reached the consumer side of the queue.
    pub fn delivery_ratio(&self) -> f64 {
        let total = self.clips_dispatched + self.clips_dropped;
        if total == 0 {
            return 1.0;
        }
        self.clips_dispatched as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn delivery_ratio_without_traffic_is_one() {
        assert_relative_eq!(CaptureDiagnostics::default().delivery_ratio(), 1.0);
    }

    #[test]
    fn delivery_ratio_counts_drops() {
        let diagnostics = CaptureDiagnostics {
            clips_dispatched: 3,
            clips_dropped: 1,
            ..Default::default()
        };
        assert_relative_eq!(diagnostics.delivery_ratio(), 0.75);
    }
}
