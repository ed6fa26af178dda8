//! Simulation model for Alembic: the environment and everything living
//! in it.
//!
//! - [`Environment`]: node store, positions, neighbor cache, layers and
//!   the per-environment node id counter.
//! - [`LinkingRule`]: how neighborhoods are computed
//!   ([`NoLinks`], [`ConnectWithinDistance`], [`ClosestN`]).
//! - [`Reaction`]: conditions, actions and a [`TimeDistribution`].
//! - [`distribution`]: the time distribution variants.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod distribution;
pub mod environment;
pub mod error;
pub mod layer;
pub mod linking;
pub mod neighborhood;
pub mod node;
pub mod reaction;

pub use distribution::{
    AnyRealDistribution, DiracComb, ExponentialTime, LogNormal, RandomDiracComb, TimeDistribution,
    Trigger,
};
pub use environment::Environment;
pub use error::{DistributionError, ReactionError, TopologyError};
pub use layer::{FunctionLayer, Layer, UniformLayer};
pub use linking::{ClosestN, ConnectWithinDistance, LinkingRule, NoLinks};
pub use neighborhood::{NeighborCache, Neighborhood, TopologyChanges};
pub use node::Node;
pub use reaction::{
    gated_propensity, mass_action_propensity, Action, ActionContext, CloneRequest, Condition,
    Kinetics, NodeView, Reaction,
};
