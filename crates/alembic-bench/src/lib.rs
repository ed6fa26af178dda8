//! Benchmark profiles for the Alembic simulation kernel.
//!
//! - [`grid_profile`]: a square lattice of reacting nodes, 4-connected
//! - [`wandering_profile`]: nodes on a line that keep moving, stressing
//!   the neighbor cache
//! - [`scatter_positions`]: deterministic random positions via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;

use alembic_core::{Context, Position};
use alembic_engine::{Simulation, SimulationConfig};
use alembic_model::{ConnectWithinDistance, Environment, ExponentialTime, Kinetics, Reaction};
use alembic_test_utils::{ChangeConcentration, ConcentrationCondition, MoveBy};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A `side × side` lattice with unit spacing, linked to its four
/// nearest neighbors.
///
/// Every node carries a mass-action decay that reads its neighborhood
/// and a producer that reads only itself, so each event dirties a
/// handful of reactions around the firing node.
pub fn grid_profile(side: usize, seed: u64) -> Result<Simulation, Box<dyn Error>> {
    let mut env = Environment::with_linking_rule(2, ConnectWithinDistance::new(1.0));
    let mut nodes = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let node = env.create_node().with_concentration("a", 10.0);
            let id = env.add_node(node, Position::from([row as f64, col as f64]))?;
            nodes.push(id);
        }
    }
    let mut sim = Simulation::new(env, SimulationConfig::with_seed(seed))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for id in nodes {
        let decay = Reaction::new(ExponentialTime::new(1.0, ChaCha8Rng::seed_from_u64(rng.gen()))?)
            .with_condition(ConcentrationCondition::at_least("a", 1.0))
            .with_condition(
                ConcentrationCondition::at_least("a", 1.0).in_context(Context::Neighborhood),
            )
            .with_action(ChangeConcentration::new("a", -1.0))
            .with_kinetics(Kinetics::MassAction);
        let produce = Reaction::new(ExponentialTime::new(5.0, ChaCha8Rng::seed_from_u64(rng.gen()))?)
            .with_action(ChangeConcentration::new("a", 1.0));
        sim.add_reaction(id, decay)?;
        sim.add_reaction(id, produce)?;
    }
    Ok(sim)
}

/// `n` nodes scattered on `[0, n)` that step left and right at random,
/// linked within `range`.
pub fn wandering_profile(n: usize, range: f64, seed: u64) -> Result<Simulation, Box<dyn Error>> {
    let env = Environment::with_linking_rule(1, ConnectWithinDistance::new(range));
    let mut sim = Simulation::new(env, SimulationConfig::with_seed(seed))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for x in scatter_positions(n, n as f64, seed) {
        let node = sim.env().create_node();
        let left = Reaction::new(ExponentialTime::new(1.0, ChaCha8Rng::seed_from_u64(rng.gen()))?)
            .with_action(MoveBy::new([-0.5]));
        let right = Reaction::new(ExponentialTime::new(1.0, ChaCha8Rng::seed_from_u64(rng.gen()))?)
            .with_action(MoveBy::new([0.5]));
        sim.add_node(node, Position::from([x]), [left, right])?;
    }
    Ok(sim)
}

/// `n` deterministic coordinates in `[0, extent)`.
pub fn scatter_positions(n: usize, extent: f64, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    (0..n).map(|_| rng.gen_range(0.0..extent)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alembic_engine::StepOutcome;

    #[test]
    fn grid_profile_links_four_neighbors() {
        let sim = grid_profile(4, 42).unwrap();
        assert_eq!(sim.env().node_count(), 16);
        assert_eq!(sim.reactions().len(), 32);
        let degrees: Vec<usize> = sim
            .env()
            .neighbor_cache()
            .iter()
            .map(|n| n.len())
            .collect();
        assert_eq!(degrees.iter().max(), Some(&4));
        assert_eq!(degrees.iter().min(), Some(&2));
    }

    #[test]
    fn profiles_step() {
        let mut sim = wandering_profile(20, 2.0, 7).unwrap();
        for _ in 0..100 {
            assert!(!matches!(sim.step().unwrap(), StepOutcome::Finished(_)));
        }
        assert!(sim.env().neighbor_cache().is_symmetric());
    }

    #[test]
    fn scatter_positions_deterministic() {
        let a = scatter_positions(50, 10.0, 3);
        assert_eq!(a, scatter_positions(50, 10.0, 3));
        assert!(a.iter().all(|&x| (0.0..10.0).contains(&x)));
    }
}
