//! Properties that must hold after every step.

use alembic_core::{Context, Position, ReactionId, Time};
use alembic_engine::{Simulation, SimulationConfig, StepOutcome};
use alembic_model::{
    mass_action_propensity, Condition, ConnectWithinDistance, Environment, ExponentialTime,
    Kinetics, NodeView, Reaction,
};
use alembic_test_utils::fixtures::{line_environment, rng};
use alembic_test_utils::{ChangeConcentration, ConcentrationCondition, MoveBy, RecordingMonitor};
use proptest::prelude::*;

/// A chain where every node reads its neighborhood and writes to itself.
fn chain(seed: u64, nodes: usize) -> Simulation {
    let (mut env, ids) = line_environment(nodes, 1.0, 1.0);
    for &id in &ids {
        env.node_mut(id).unwrap().set_concentration("a".into(), 4.0);
    }
    let mut sim = Simulation::new(env, SimulationConfig::with_seed(seed)).unwrap();
    for (i, &id) in ids.iter().enumerate() {
        let stream = seed * 1000 + i as u64;
        sim.add_reaction(
            id,
            Reaction::new(ExponentialTime::new(1.0, rng(stream)).unwrap())
                .with_condition(ConcentrationCondition::at_least("a", 1.0))
                .with_condition(
                    ConcentrationCondition::at_least("a", 2.0).in_context(Context::Neighborhood),
                )
                .with_action(ChangeConcentration::new("a", -1.0))
                .with_kinetics(Kinetics::MassAction),
        )
        .unwrap();
        sim.add_reaction(
            id,
            Reaction::new(ExponentialTime::new(0.3, rng(stream + 500)).unwrap())
                .with_condition(ConcentrationCondition::at_least("a", 0.0))
                .with_action(ChangeConcentration::new("a", 1.0)),
        )
        .unwrap();
    }
    sim
}

fn fresh_propensity(sim: &Simulation, id: ReactionId) -> f64 {
    let entry = sim.reactions().get(id).unwrap();
    let view = NodeView::new(sim.env(), entry.node, sim.time());
    let contributions: Vec<f64> = entry
        .reaction
        .conditions()
        .iter()
        .map(|c| c.propensity_contribution(&view).unwrap())
        .collect();
    mass_action_propensity(entry.reaction.rate(), contributions)
}

#[test]
fn time_never_decreases() {
    let mut sim = chain(3, 8);
    let monitor = RecordingMonitor::new();
    sim.add_output_monitor(monitor.clone());
    for _ in 0..500 {
        if matches!(sim.step().unwrap(), StepOutcome::Finished(_)) {
            break;
        }
    }
    let times: Vec<Time> = monitor.steps().into_iter().map(|(_, time)| time).collect();
    assert!(!times.is_empty());
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(sim.time(), *times.last().unwrap());
}

#[test]
fn propensities_track_their_inputs() {
    let mut sim = chain(5, 6);
    sim.initialize().unwrap();
    for _ in 0..400 {
        if matches!(sim.step().unwrap(), StepOutcome::Finished(_)) {
            break;
        }
        for (id, entry) in sim.reactions().iter() {
            let expected = fresh_propensity(&sim, id);
            assert_eq!(
                entry.reaction.propensity(),
                expected,
                "stale propensity for {id} at step {}",
                sim.step_count()
            );
        }
    }
}

#[test]
fn scheduled_times_match_reactions() {
    let mut sim = chain(9, 5);
    for _ in 0..200 {
        sim.step().unwrap();
        for (id, entry) in sim.reactions().iter() {
            assert_eq!(sim.scheduler().tau_of(id), Some(entry.reaction.tau()));
            assert!(entry.reaction.tau() >= sim.time());
        }
    }
}

/// Nodes wander along a line; links must always equal the geometric
/// truth and stay symmetric.
fn wanderers(seed: u64, starts: &[f64], range: f64) -> Simulation {
    let mut env = Environment::with_linking_rule(1, ConnectWithinDistance::new(range));
    let nodes: Vec<_> = starts.iter().map(|_| env.create_node()).collect();
    let mut sim = Simulation::new(env, SimulationConfig::with_seed(seed)).unwrap();
    for (i, (node, &x)) in nodes.into_iter().zip(starts).enumerate() {
        let stream = seed * 100 + i as u64;
        sim.add_node(
            node,
            Position::from([x]),
            [
                Reaction::new(ExponentialTime::new(1.0, rng(stream)).unwrap())
                    .with_action(MoveBy::new([0.7])),
                Reaction::new(ExponentialTime::new(1.0, rng(stream + 50)).unwrap())
                    .with_action(MoveBy::new([-0.7])),
            ],
        )
        .unwrap();
    }
    sim
}

fn assert_links_match_geometry(sim: &Simulation, range: f64) {
    let env = sim.env();
    assert!(env.neighbor_cache().is_symmetric());
    let positions: Vec<_> = env.positions().iter().collect();
    for &(a, pa) in &positions {
        for &(b, pb) in &positions {
            if a == b {
                continue;
            }
            let linked = env.neighborhood(a).unwrap().contains(b);
            assert_eq!(linked, pa.distance(pb) <= range, "{a} vs {b}");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn neighbor_links_stay_consistent_under_movement(
        seed in 0u64..1000,
        starts in prop::collection::vec(-5.0f64..5.0, 2..8),
    ) {
        let range = 1.5;
        let mut sim = wanderers(seed, &starts, range);
        assert_links_match_geometry(&sim, range);
        for _ in 0..60 {
            sim.step().unwrap();
            assert_links_match_geometry(&sim, range);
        }
    }
}
