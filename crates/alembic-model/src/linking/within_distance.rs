use alembic_core::NodeId;

use crate::environment::Positions;
use crate::error::TopologyError;
use crate::linking::LinkingRule;
use crate::neighborhood::Neighborhood;

/// Links every pair of nodes at Euclidean distance `<= range`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectWithinDistance {
    range: f64,
}

impl ConnectWithinDistance {
    /// A rule linking nodes closer than `range`.
    pub fn new(range: f64) -> Self {
        Self { range }
    }

    /// The linking radius.
    pub fn range(&self) -> f64 {
        self.range
    }
}

impl LinkingRule for ConnectWithinDistance {
    fn name(&self) -> &str {
        "connect-within-distance"
    }

    fn compute_neighborhood(
        &self,
        center: NodeId,
        positions: &Positions,
    ) -> Result<Neighborhood, TopologyError> {
        let here = positions.get(center)?;
        let neighbors = positions
            .iter()
            .filter(|(id, pos)| *id != center && here.distance(pos) <= self.range)
            .map(|(id, _)| id);
        Ok(Neighborhood::new(center, neighbors))
    }

    fn is_locally_consistent(&self) -> bool {
        true
    }
}
