//! Reusable environments and reactions.

use alembic_core::{Molecule, NodeId, Position, Time};
use alembic_model::{
    ConnectWithinDistance, DiracComb, Environment, ExponentialTime, Kinetics, Reaction,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{ChangeConcentration, ConcentrationCondition};

/// Seeded generator for distributions.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn t(secs: f64) -> Time {
    Time::from_secs(secs).unwrap()
}

/// A Dirac comb of the given rate starting at zero.
pub fn dirac(rate: f64) -> DiracComb {
    DiracComb::new(rate).unwrap()
}

/// Exponential times of the given rate.
pub fn exponential(rate: f64, seed: u64) -> ExponentialTime {
    ExponentialTime::new(rate, rng(seed)).unwrap()
}

/// A 1-D environment with `n` nodes at `0, spacing, 2*spacing, ...`
/// linked within `range`.
pub fn line_environment(n: usize, spacing: f64, range: f64) -> (Environment, Vec<NodeId>) {
    let mut env = Environment::with_linking_rule(1, ConnectWithinDistance::new(range));
    let ids = (0..n)
        .map(|i| {
            let node = env.create_node();
            env.add_node(node, Position::from([i as f64 * spacing])).unwrap()
        })
        .collect();
    (env, ids)
}

/// Adds `delta` of `molecule` at the given rate, unconditionally.
pub fn producer(rate: f64, molecule: &str, delta: f64) -> Reaction {
    Reaction::new(dirac(rate)).with_action(ChangeConcentration::new(molecule, delta))
}

/// Mass-action decay: consumes one `molecule` at rate `k × amount`.
pub fn decay(rate: f64, molecule: &str, seed: u64) -> Reaction {
    Reaction::new(exponential(rate, seed))
        .with_condition(ConcentrationCondition::at_least(molecule, 1.0))
        .with_action(ChangeConcentration::new(molecule, -1.0))
        .with_kinetics(Kinetics::MassAction)
}

/// Concentration of `molecule` on `node`, zero if absent.
pub fn amount(env: &Environment, node: NodeId, molecule: &str) -> f64 {
    env.node(node)
        .ok()
        .and_then(|n| n.concentration(&Molecule::new(molecule)))
        .unwrap_or(0.0)
}
