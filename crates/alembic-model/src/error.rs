//! Error types for the simulation model.

use alembic_core::{NodeId, TimeError};
use thiserror::Error;

/// Errors from time distributions: malformed parameters, NaN or
/// negative propensities, and negative sampled delays.
///
/// All of these are fatal scheduling errors for the engine.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DistributionError {
    /// A rate parameter was not finite and strictly positive.
    #[error("rate must be finite and positive, got {value}")]
    InvalidRate {
        /// The rejected rate.
        value: f64,
    },
    /// The aggregated propensity was NaN, infinite or negative.
    #[error("propensity must be finite and non-negative, got {value}")]
    InvalidPropensity {
        /// The rejected propensity.
        value: f64,
    },
    /// A sampled time delta was negative.
    #[error("sampled delay {value} is negative")]
    NegativeDelay {
        /// The rejected sample.
        value: f64,
    },
    /// Rescaling the remaining wait was attempted with a zero propensity.
    #[error("cannot rescale remaining time by a zero propensity")]
    ZeroPropensityRescale,
    /// Distribution parameters were rejected by the sampler.
    #[error("invalid distribution parameters: {reason}")]
    InvalidParameters {
        /// Description of the problem.
        reason: String,
    },
    /// A time computation failed.
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Errors from environment topology bookkeeping.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TopologyError {
    /// The node is not (or no longer) in the environment.
    #[error("node {node} is not in the environment")]
    UnknownNode {
        /// The missing node.
        node: NodeId,
    },
    /// A node with this id is already in the environment.
    #[error("node {node} is already in the environment")]
    DuplicateNode {
        /// The duplicated id.
        node: NodeId,
    },
    /// The neighbor cache has no entry for a live node.
    #[error("no cached neighborhood for node {node}")]
    MissingNeighborhood {
        /// The node without a neighborhood.
        node: NodeId,
    },
    /// A position has the wrong number of coordinates.
    #[error("position has {got} dimensions, environment has {expected}")]
    DimensionMismatch {
        /// Dimensions of the environment.
        expected: usize,
        /// Dimensions of the rejected position.
        got: usize,
    },
    /// A position has a NaN or infinite coordinate.
    #[error("position of node {node} is not finite")]
    NonFinitePosition {
        /// The node being placed.
        node: NodeId,
    },
}

/// Errors raised while evaluating or executing a reaction.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ReactionError {
    /// A user condition or action failed.
    #[error("'{name}' failed: {reason}")]
    Failed {
        /// Name of the failing condition or action.
        name: String,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The reaction touched a node or neighborhood that does not exist.
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// The time distribution rejected its input.
    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

impl ReactionError {
    /// Shorthand for [`ReactionError::Failed`].
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
