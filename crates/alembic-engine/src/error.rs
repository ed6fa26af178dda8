//! Error types for the simulation loop and the threaded engine.

use alembic_core::{ReactionId, Status, Time};
use alembic_model::{DistributionError, ReactionError, TopologyError};
use thiserror::Error;

use crate::config::ConfigError;

/// Fatal errors raised while stepping a simulation.
///
/// Once one of these is returned the simulation must not be stepped
/// again; the engine records it and stops.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimulationError {
    /// A time distribution rejected its input or produced a bad sample.
    #[error("scheduling {reaction} failed: {source}")]
    Scheduling {
        /// The reaction being rescheduled.
        reaction: ReactionId,
        /// What went wrong.
        source: DistributionError,
    },
    /// The scheduler's minimum lies before the current time.
    #[error("next event at {scheduled} precedes current time {now}")]
    TimeWentBackwards {
        /// Current simulated time.
        now: Time,
        /// The offending scheduled time.
        scheduled: Time,
    },
    /// A structural edit referenced a missing node or neighborhood.
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// A condition or action failed.
    #[error("reaction {reaction} failed: {source}")]
    Reaction {
        /// The failing reaction.
        reaction: ReactionId,
        /// The underlying failure.
        source: ReactionError,
    },
    /// The scheduler or dependency graph referenced an unknown reaction.
    #[error("unknown reaction {reaction}")]
    UnknownReaction {
        /// The dangling id.
        reaction: ReactionId,
    },
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SimulationError {
    /// Route a reaction failure to the right variant.
    pub(crate) fn from_reaction(reaction: ReactionId, err: ReactionError) -> Self {
        match err {
            ReactionError::Distribution(source) => Self::Scheduling { reaction, source },
            ReactionError::Topology(source) => Self::Topology(source),
            source => Self::Reaction { reaction, source },
        }
    }
}

/// Errors returned by [`Engine`](crate::Engine) methods on the caller side.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    /// The engine reached a final status; no command can run anymore.
    #[error("engine already finished with status {status}")]
    AlreadyStopped {
        /// The final status.
        status: Status,
    },
    /// The loop thread could not be spawned.
    #[error("failed to spawn loop thread: {reason}")]
    ThreadSpawnFailed {
        /// Description from the OS.
        reason: String,
    },
    /// The loop thread panicked.
    #[error("loop thread panicked")]
    Join,
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
