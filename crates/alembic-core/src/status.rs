//! Engine lifecycle status.

use std::fmt;

/// Lifecycle status of a simulation engine.
///
/// Legal transitions:
///
/// ```text
/// Init ──play/step──► Running ◄──play── Paused
///                        │ └────pause────►  │
///                        ▼                  ▼
///                 Terminated | Stopped   Stopped
/// ```
///
/// `Terminated` (queue exhausted or a bound reached) and `Stopped`
/// (explicit command or fatal error) are both final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Created and initialised, never run.
    Init,
    /// The loop thread is executing steps.
    Running,
    /// The loop thread is waiting for commands.
    Paused,
    /// The run ended naturally.
    Terminated,
    /// The run was stopped by command or by a fatal error.
    Stopped,
}

impl Status {
    /// Whether no further transition is possible.
    pub fn is_final(self) -> bool {
        matches!(self, Status::Terminated | Status::Stopped)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Re-entering the current non-final status is allowed (it is a
    /// no-op); leaving a final status never is.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;
        match (self, next) {
            (Terminated | Stopped, _) => false,
            (_, Init) => false,
            (Init | Running | Paused, Running) => true,
            (Running | Paused, Paused) => true,
            (_, Stopped | Terminated) => true,
            (Init, Paused) => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Terminated => write!(f, "terminated"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_states_reject_everything() {
        for s in [Status::Init, Status::Running, Status::Paused, Status::Stopped] {
            assert!(!Status::Stopped.can_transition_to(s));
            assert!(!Status::Terminated.can_transition_to(s));
        }
    }

    #[test]
    fn pause_only_from_running_or_paused() {
        assert!(Status::Running.can_transition_to(Status::Paused));
        assert!(!Status::Init.can_transition_to(Status::Paused));
    }

    #[test]
    fn stop_from_any_non_final_state() {
        for s in [Status::Init, Status::Running, Status::Paused] {
            assert!(s.can_transition_to(Status::Stopped));
        }
    }
}
