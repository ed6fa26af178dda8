//! Status state machine and command handling of the threaded engine.

use std::sync::atomic::Ordering;
use std::time::Duration;

use alembic_core::{Position, Status};
use alembic_engine::{Engine, EngineConfig, EngineError, Simulation, SimulationConfig, SimulationError};
use alembic_model::{Environment, Reaction};
use alembic_test_utils::fixtures::{dirac, producer, t};
use alembic_test_utils::{CountingAction, FailingAction, RecordingMonitor};

const WAIT: Duration = Duration::from_secs(10);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A simulation with one comb that never runs out.
fn endless() -> Simulation {
    let mut env = Environment::new(1);
    let node = env.create_node();
    let mut sim = Simulation::new(env, SimulationConfig::with_seed(1)).unwrap();
    sim.add_node(node, Position::origin(1), [producer(1.0, "a", 1.0)])
        .unwrap();
    sim
}

/// A simulation that terminates after `steps` steps.
fn bounded(steps: u64) -> Simulation {
    let mut env = Environment::new(1);
    let node = env.create_node();
    let config = SimulationConfig {
        max_steps: Some(steps),
        ..SimulationConfig::with_seed(1)
    };
    let mut sim = Simulation::new(env, config).unwrap();
    sim.add_node(node, Position::origin(1), [producer(1.0, "a", 1.0)])
        .unwrap();
    sim
}

#[test]
fn starts_in_init() {
    let engine = Engine::start(endless()).unwrap();
    assert_eq!(engine.wait_for(Status::Init, Duration::ZERO), Status::Init);
    engine.stop().unwrap();
    assert_eq!(engine.wait_for(Status::Stopped, WAIT), Status::Stopped);
}

#[test]
fn paused_running_stopped_then_play_is_rejected() {
    init_tracing();
    let engine = Engine::start(endless()).unwrap();
    engine.play().unwrap();
    assert_eq!(engine.wait_for(Status::Running, WAIT), Status::Running);
    engine.pause().unwrap();
    assert_eq!(engine.wait_for(Status::Paused, WAIT), Status::Paused);
    engine.play().unwrap();
    assert_eq!(engine.wait_for(Status::Running, WAIT), Status::Running);
    engine.stop().unwrap();
    assert_eq!(engine.wait_for(Status::Stopped, WAIT), Status::Stopped);

    assert_eq!(
        engine.play(),
        Err(EngineError::AlreadyStopped {
            status: Status::Stopped
        })
    );
    assert_eq!(engine.status(), Status::Stopped);
    assert!(engine.error().is_none());
}

#[test]
fn pause_from_init_is_ignored() {
    let engine = Engine::start(endless()).unwrap();
    engine.pause().unwrap();
    // A later command proves the pause was processed.
    engine.step().unwrap();
    assert_eq!(engine.wait_for(Status::Paused, WAIT), Status::Paused);
    assert_eq!(engine.snapshot().step, 1);
}

#[test]
fn step_runs_exactly_one_reaction() {
    init_tracing();
    let engine = Engine::start(endless()).unwrap();
    let monitor = RecordingMonitor::new();
    engine.add_output_monitor(monitor.clone()).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    for _ in 0..3 {
        engine.step().unwrap();
        // Commands queued behind a step observe its result.
        let tx = tx.clone();
        engine
            .add_command(move |ctx| {
                tx.send((ctx.status(), ctx.simulation().step_count())).unwrap();
            })
            .unwrap();
    }
    let observed: Vec<(Status, u64)> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
    assert_eq!(
        observed,
        vec![(Status::Paused, 1), (Status::Paused, 2), (Status::Paused, 3)]
    );
    engine.stop().unwrap();
    let sim = engine.join().unwrap();
    assert_eq!(sim.step_count(), 3);
    assert_eq!(sim.time(), t(3.0));
    let recording = monitor.recording();
    assert_eq!(recording.initialized, 1);
    assert_eq!(recording.steps.len(), 3);
    assert_eq!(recording.finished.len(), 1);
}

#[test]
fn terminates_at_bound_and_rejects_commands() {
    let engine = Engine::start(bounded(5)).unwrap();
    engine.play().unwrap();
    assert_eq!(engine.wait_for(Status::Terminated, WAIT), Status::Terminated);
    assert_eq!(engine.snapshot().step, 5);
    assert!(matches!(
        engine.step(),
        Err(EngineError::AlreadyStopped {
            status: Status::Terminated
        })
    ));
}

#[test]
fn wait_for_times_out_and_reports_observed_status() {
    let engine = Engine::start(endless()).unwrap();
    let observed = engine.wait_for(Status::Running, Duration::from_millis(20));
    assert_eq!(observed, Status::Init);
}

#[test]
fn wait_for_returns_early_on_final_status() {
    let engine = Engine::start(bounded(2)).unwrap();
    engine.play().unwrap();
    // Paused will never come; termination ends the wait.
    assert_eq!(engine.wait_for(Status::Paused, Engine::UNBOUNDED), Status::Terminated);
}

#[test]
fn action_failure_stops_with_error() {
    init_tracing();
    let mut env = Environment::new(1);
    let node = env.create_node();
    let mut sim = Simulation::new(env, SimulationConfig::default()).unwrap();
    sim.add_node(
        node,
        Position::origin(1),
        [Reaction::new(dirac(1.0)).with_action(FailingAction::new("exploded"))],
    )
    .unwrap();
    let engine = Engine::start(sim).unwrap();
    let monitor = RecordingMonitor::new();
    engine.add_output_monitor(monitor.clone()).unwrap();
    engine.play().unwrap();

    assert_eq!(engine.wait_for(Status::Stopped, WAIT), Status::Stopped);
    let err = engine.error().expect("error recorded");
    assert!(matches!(*err, SimulationError::Reaction { .. }));
    assert!(err.to_string().contains("exploded"));
    assert_eq!(monitor.recording().finished.len(), 1);
    assert!(engine.play().is_err());
}

#[test]
fn custom_commands_run_between_steps_in_order() {
    let mut env = Environment::new(1);
    let node = env.create_node();
    let mut sim = Simulation::new(env, SimulationConfig::default()).unwrap();
    let (counter, count) = CountingAction::new();
    let node = sim
        .add_node(node, Position::origin(1), [Reaction::new(dirac(1.0)).with_action(counter)])
        .unwrap();
    let engine = Engine::start(sim).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    for i in 0..5u64 {
        let tx = tx.clone();
        engine
            .add_command(move |ctx| {
                let steps = ctx.simulation().step_count();
                tx.send((i, steps)).unwrap();
                ctx.request_step();
            })
            .unwrap();
    }
    engine.stop().unwrap();
    assert_eq!(engine.wait_for(Status::Stopped, WAIT), Status::Stopped);

    // Each command sees the step requested by the one before it.
    let seen: Vec<(u64, u64)> = rx.try_iter().collect();
    assert_eq!(seen, (0..5).map(|i| (i, i)).collect::<Vec<_>>());
    let sim = engine.join().unwrap();
    assert_eq!(count.load(Ordering::SeqCst) as u64, sim.stats().executed);
    assert!(sim.env().contains_node(node));
}

#[test]
fn join_stops_a_paused_engine() {
    let engine = Engine::start(endless()).unwrap();
    let sim = engine.join().unwrap();
    assert_eq!(sim.step_count(), 0);
}

#[test]
fn join_stops_a_running_engine() {
    let engine = Engine::start(endless()).unwrap();
    let monitor = RecordingMonitor::new();
    engine.add_output_monitor(monitor.clone()).unwrap();
    engine.play().unwrap();
    assert_eq!(engine.wait_for(Status::Running, WAIT), Status::Running);
    let sim = engine.join().unwrap();
    assert_eq!(monitor.recording().finished, vec![(sim.time(), sim.step_count())]);
}

#[test]
fn step_request_overridden_by_pause_does_not_leak_into_play() {
    init_tracing();
    let engine = Engine::start(endless()).unwrap();
    engine
        .add_command(|ctx| {
            ctx.request_step();
            ctx.request_status(Status::Paused);
        })
        .unwrap();
    assert_eq!(engine.wait_for(Status::Paused, WAIT), Status::Paused);
    engine.play().unwrap();
    assert_eq!(engine.wait_for(Status::Running, WAIT), Status::Running);
    // A leftover single step would drop back to Paused after one step.
    assert_eq!(
        engine.wait_for(Status::Paused, Duration::from_millis(300)),
        Status::Running
    );
    assert!(engine.snapshot().step > 1);
    engine.stop().unwrap();
    assert_eq!(engine.wait_for(Status::Stopped, WAIT), Status::Stopped);
}

#[test]
fn monitors_added_by_commands_and_engine_get_distinct_ids() {
    let engine = Engine::start(endless()).unwrap();
    let first = RecordingMonitor::new();
    let second = RecordingMonitor::new();

    let (tx, rx) = crossbeam_channel::bounded(1);
    let added = first.clone();
    engine
        .add_command(move |ctx| {
            tx.send(ctx.simulation_mut().add_output_monitor(added)).unwrap();
        })
        .unwrap();
    let from_command = rx.recv_timeout(WAIT).unwrap();
    let from_engine = engine.add_output_monitor(second.clone()).unwrap();
    assert_ne!(from_command, from_engine);

    engine.step().unwrap();
    let (tx, rx) = crossbeam_channel::bounded(1);
    engine
        .add_command(move |ctx| {
            tx.send(ctx.simulation().monitor_count()).unwrap();
        })
        .unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);
    assert_eq!(first.recording().steps.len(), 1);
    assert_eq!(second.recording().steps.len(), 1);
    engine.stop().unwrap();
    assert_eq!(engine.wait_for(Status::Stopped, WAIT), Status::Stopped);
}

#[test]
fn rejects_blank_thread_name() {
    let config = EngineConfig {
        thread_name: String::new(),
    };
    assert!(matches!(
        Engine::new(endless(), config),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn removed_monitor_stops_receiving() {
    let engine = Engine::start(endless()).unwrap();
    let monitor = RecordingMonitor::new();
    let id = engine.add_output_monitor(monitor.clone()).unwrap();
    engine.step().unwrap();
    assert_eq!(engine.wait_for(Status::Paused, WAIT), Status::Paused);
    engine.remove_output_monitor(id).unwrap();
    engine.step().unwrap();
    engine.stop().unwrap();
    assert_eq!(engine.wait_for(Status::Stopped, WAIT), Status::Stopped);
    assert_eq!(monitor.recording().steps.len(), 1);
    assert!(monitor.recording().finished.is_empty());
}
