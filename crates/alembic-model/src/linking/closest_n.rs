use alembic_core::{NodeId, Position};

use crate::environment::Positions;
use crate::error::TopologyError;
use crate::linking::LinkingRule;
use crate::neighborhood::Neighborhood;

/// Links each node to its `n` closest nodes, symmetrically.
///
/// `b` is a neighbor of `a` when `b` is among the `n` nodes closest to
/// `a`, or `a` is among the `n` nodes closest to `b`. Distance ties are
/// broken by node id. Moving one node can change who is closest to
/// nodes it never touched, so this rule is not locally consistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClosestN {
    n: usize,
}

impl ClosestN {
    /// Link every node to (at least) its `n` nearest nodes.
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// The neighbor count.
    pub fn n(&self) -> usize {
        self.n
    }

    fn nearest(&self, center: NodeId, here: &Position, positions: &Positions) -> Vec<NodeId> {
        let mut ranked: Vec<(f64, NodeId)> = positions
            .iter()
            .filter(|(id, _)| *id != center)
            .map(|(id, pos)| (here.distance(pos), id))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.into_iter().take(self.n).map(|(_, id)| id).collect()
    }
}

impl LinkingRule for ClosestN {
    fn name(&self) -> &str {
        "closest-n"
    }

    fn compute_neighborhood(
        &self,
        center: NodeId,
        positions: &Positions,
    ) -> Result<Neighborhood, TopologyError> {
        let here = positions.get(center)?;
        let mut neighbors = self.nearest(center, here, positions);
        for (other, pos) in positions.iter() {
            if other == center || neighbors.contains(&other) {
                continue;
            }
            if self.nearest(other, pos, positions).contains(&center) {
                neighbors.push(other);
            }
        }
        Ok(Neighborhood::new(center, neighbors))
    }

    fn is_locally_consistent(&self) -> bool {
        false
    }
}
