//! Per-step and cumulative counters for the simulation loop.

/// Timing and bookkeeping for a single step.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the whole step.
    pub total_us: u64,
    /// Time spent running the fired reaction's actions.
    pub execute_us: u64,
    /// Reactions rescheduled because of dependencies or topology changes.
    pub reactions_updated: usize,
    /// Edges gained or lost during the step.
    pub edge_changes: usize,
    /// Nodes added during the step.
    pub nodes_added: usize,
    /// Nodes removed during the step.
    pub nodes_removed: usize,
}

/// Cumulative counters since the simulation was created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationStats {
    /// Steps whose conditions held and whose actions ran.
    pub executed: u64,
    /// Steps whose conditions did not hold.
    pub skipped: u64,
    /// Total dependency-driven reschedules.
    pub reschedules: u64,
    /// Total wall-clock time spent stepping, in microseconds.
    pub busy_us: u64,
    /// Metrics of the most recent step.
    pub last_step: StepMetrics,
}

impl SimulationStats {
    /// Steps taken, executed or skipped.
    pub fn steps(&self) -> u64 {
        self.executed + self.skipped
    }

    pub(crate) fn record(&mut self, metrics: StepMetrics, executed: bool) {
        if executed {
            self.executed += 1;
        } else {
            self.skipped += 1;
        }
        self.reschedules += metrics.reactions_updated as u64;
        self.busy_us += metrics.total_us;
        self.last_step = metrics;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zero() {
        let stats = SimulationStats::default();
        assert_eq!(stats.steps(), 0);
        assert_eq!(stats.last_step, StepMetrics::default());
    }

    #[test]
    fn record_accumulates() {
        let mut stats = SimulationStats::default();
        stats.record(
            StepMetrics {
                total_us: 5,
                reactions_updated: 2,
                ..StepMetrics::default()
            },
            true,
        );
        stats.record(StepMetrics::default(), false);
        assert_eq!(stats.executed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.reschedules, 2);
        assert_eq!(stats.busy_us, 5);
        assert_eq!(stats.steps(), 2);
    }
}
