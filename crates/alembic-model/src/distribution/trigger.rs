use alembic_core::Time;

use super::{check_propensity, TimeDistribution};
use crate::environment::Environment;
use crate::error::DistributionError;

/// Fires exactly once, at a fixed instant.
///
/// The engine's initial scheduling call also arrives with
/// `executed = true`; the first update is treated as a dry run so that
/// it does not retire the trigger before it ever fired. A trigger first
/// scheduled after its event fires at that moment.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    event: Time,
    tau: Time,
    dry_run_done: bool,
}

impl Trigger {
    /// A trigger firing at `event`.
    pub fn new(event: Time) -> Self {
        Self {
            event,
            tau: event,
            dry_run_done: false,
        }
    }

    /// When the trigger fires.
    pub fn event(&self) -> Time {
        self.event
    }
}

impl TimeDistribution for Trigger {
    fn name(&self) -> &str {
        "trigger"
    }

    fn update(
        &mut self,
        now: Time,
        executed: bool,
        propensity: f64,
        _env: &Environment,
    ) -> Result<(), DistributionError> {
        check_propensity(propensity)?;
        if !self.dry_run_done {
            // Attached after its event: fire as soon as possible instead.
            self.tau = self.event.max(now);
            self.dry_run_done = true;
        } else if executed && now >= self.tau {
            self.tau = Time::INFINITY;
        }
        Ok(())
    }

    fn next_occurrence(&self) -> Time {
        self.tau
    }

    /// A trigger has no rate.
    fn rate(&self) -> f64 {
        0.0
    }

    fn clone_on_new_node(&mut self, start: Time) -> Box<dyn TimeDistribution> {
        Box::new(Trigger::new(self.event.max(start)))
    }
}
