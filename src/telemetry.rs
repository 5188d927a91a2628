/// Telemetry events emitted by the runner as steps complete
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// A step finished successfully
    StepCompleted {
        documents_returned: u64,
        duration_ms: u64,
    },
    /// A step failed and the run was aborted
    StepFailed,
}

/// Statistics aggregated from telemetry events
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub steps_completed: usize,
    pub steps_failed: usize,
    pub documents_returned: u64,
    pub step_durations_ms: Vec<u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a telemetry event
    pub fn update(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::StepCompleted {
                documents_returned,
                duration_ms,
            } => {
                self.steps_completed += 1;
                self.documents_returned += documents_returned;
                self.step_durations_ms.push(*duration_ms);
            }
            TelemetryEvent::StepFailed => {
                self.steps_failed += 1;
            }
        }
    }

    /// Calculate percentile from step durations
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.step_durations_ms.is_empty() {
            return None;
        }

        let mut sorted = self.step_durations_ms.clone();
        sorted.sort_unstable();

        let index = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        let index = index.saturating_sub(1).min(sorted.len() - 1);

        Some(sorted[index])
    }

    /// Get p50, p90, p99 percentiles
    pub fn get_percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        (
            self.percentile(50.0),
            self.percentile(90.0),
            self.percentile(99.0),
        )
    }
}
