//! Commands: closures run on the loop thread between steps.

use alembic_core::Status;
use tracing::warn;

use crate::simulation::Simulation;

/// A unit of work queued for the loop thread.
///
/// Commands run strictly between steps, in submission order, with
/// exclusive access to the [`Simulation`].
pub type Command = Box<dyn FnOnce(&mut CommandContext<'_>) + Send + 'static>;

/// What a [`Command`] can see and do.
pub struct CommandContext<'a> {
    simulation: &'a mut Simulation,
    status: Status,
    requested: Option<Status>,
    single_step: bool,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(simulation: &'a mut Simulation, status: Status) -> Self {
        Self {
            simulation,
            status,
            requested: None,
            single_step: false,
        }
    }

    /// The simulation.
    pub fn simulation(&self) -> &Simulation {
        &*self.simulation
    }

    /// The simulation, mutably.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut *self.simulation
    }

    /// Status as it will be after this command, including any request
    /// already made by it.
    pub fn status(&self) -> Status {
        self.requested.unwrap_or(self.status)
    }

    /// Ask for a status change. Illegal transitions are logged and
    /// ignored; the return value says whether the request was accepted.
    pub fn request_status(&mut self, next: Status) -> bool {
        let current = self.status();
        if current.can_transition_to(next) {
            self.requested = Some(next);
            true
        } else {
            warn!(from = %current, to = %next, "illegal status transition ignored");
            false
        }
    }

    /// Run exactly one step, then pause.
    pub fn request_step(&mut self) -> bool {
        if self.request_status(Status::Running) {
            self.single_step = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn into_requests(self) -> (Option<Status>, bool) {
        (self.requested, self.single_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use alembic_model::Environment;

    fn sim() -> Simulation {
        Simulation::new(Environment::new(1), SimulationConfig::default()).unwrap()
    }

    #[test]
    fn pause_from_init_is_ignored() {
        let mut sim = sim();
        let mut ctx = CommandContext::new(&mut sim, Status::Init);
        assert!(!ctx.request_status(Status::Paused));
        assert_eq!(ctx.into_requests(), (None, false));
    }

    #[test]
    fn requests_chain_within_one_command() {
        let mut sim = sim();
        let mut ctx = CommandContext::new(&mut sim, Status::Init);
        assert!(ctx.request_status(Status::Running));
        assert!(ctx.request_status(Status::Paused));
        assert_eq!(ctx.status(), Status::Paused);
    }

    #[test]
    fn nothing_leaves_stopped() {
        let mut sim = sim();
        let mut ctx = CommandContext::new(&mut sim, Status::Stopped);
        assert!(!ctx.request_status(Status::Running));
        assert!(!ctx.request_step());
    }

    #[test]
    fn step_requests_running() {
        let mut sim = sim();
        let mut ctx = CommandContext::new(&mut sim, Status::Paused);
        assert!(ctx.request_step());
        assert_eq!(ctx.into_requests(), (Some(Status::Running), true));
    }
}
