//! Linking rules decide which nodes are neighbors.
//!
//! A rule is *locally consistent* when adding, removing or moving one
//! node can only change edges that touch that node. For such rules the
//! environment recomputes a single neighborhood. Otherwise it
//! propagates recomputation through every node whose neighborhood
//! changed until nothing changes.

mod closest_n;
mod within_distance;

pub use closest_n::ClosestN;
pub use within_distance::ConnectWithinDistance;

use alembic_core::NodeId;

use crate::environment::Positions;
use crate::error::TopologyError;
use crate::neighborhood::Neighborhood;

/// Computes the neighborhood of a node from the current positions.
pub trait LinkingRule: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Neighbors of `center` given every node's position.
    ///
    /// Implementations must be symmetric: `b` is in the neighborhood of
    /// `a` exactly when `a` is in the neighborhood of `b`.
    fn compute_neighborhood(
        &self,
        center: NodeId,
        positions: &Positions,
    ) -> Result<Neighborhood, TopologyError>;

    /// Whether changes around one node can only affect that node's edges.
    fn is_locally_consistent(&self) -> bool;
}

/// No node is ever linked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoLinks;

impl LinkingRule for NoLinks {
    fn name(&self) -> &str {
        "no-links"
    }

    fn compute_neighborhood(
        &self,
        center: NodeId,
        positions: &Positions,
    ) -> Result<Neighborhood, TopologyError> {
        positions.get(center)?;
        Ok(Neighborhood::empty(center))
    }

    fn is_locally_consistent(&self) -> bool {
        true
    }
}
