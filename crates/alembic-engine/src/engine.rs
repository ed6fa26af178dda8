//! User-facing threaded [`Engine`] and its status monitor.
//!
//! ```text
//! Caller thread(s)                     Loop thread
//!     |                                    |
//!     |--add_command()/play()/...--------->| commands.recv()     (Init, Paused)
//!     |   [unbounded crossbeam channel]    | commands.try_recv() (Running)
//!     |                                    | simulation.step()
//!     |                                    | shared.publish() + notify_all
//!     |<--wait_for(): Condvar wait---------|
//!     |<--status()/snapshot(): Mutex read--|
//! ```
//!
//! The loop thread is the only thread that touches the simulation.
//! Callers observe it through [`EngineSnapshot`]s published after every
//! step and status change.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use alembic_core::{MonitorId, Status, Time};
use crossbeam_channel::Sender;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::command::{Command, CommandContext};
use crate::config::EngineConfig;
use crate::error::{EngineError, SimulationError};
use crate::loop_thread::LoopThreadState;
use crate::metrics::SimulationStats;
use crate::monitor::{MonitorIds, OutputMonitor};
use crate::simulation::Simulation;

// ── EngineSnapshot ───────────────────────────────────────────────

/// State of the engine as last published by the loop thread.
#[derive(Clone, Debug)]
pub struct EngineSnapshot {
    /// Current status.
    pub status: Status,
    /// Simulated time.
    pub time: Time,
    /// Steps taken.
    pub step: u64,
    /// The fatal error, if the simulation failed.
    pub error: Option<Arc<SimulationError>>,
    /// Cumulative counters.
    pub stats: SimulationStats,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            status: Status::Init,
            time: Time::ZERO,
            step: 0,
            error: None,
            stats: SimulationStats::default(),
        }
    }
}

// ── Shared ───────────────────────────────────────────────────────

/// Snapshot plus the condition variable signalled on every publish.
#[derive(Default)]
pub(crate) struct Shared {
    state: Mutex<EngineSnapshot>,
    changed: Condvar,
}

impl Shared {
    pub(crate) fn publish(&self, status: Status, simulation: &Simulation) {
        let mut state = self.state.lock();
        state.status = status;
        state.time = simulation.time();
        state.step = simulation.step_count();
        state.stats = simulation.stats().clone();
        drop(state);
        self.changed.notify_all();
    }

    pub(crate) fn record_error(&self, err: SimulationError) {
        self.state.lock().error = Some(Arc::new(err));
    }

    fn status(&self) -> Status {
        self.state.lock().status
    }
}

// ── Engine ───────────────────────────────────────────────────────

/// Runs a [`Simulation`] on a dedicated thread.
///
/// All interaction goes through commands, which the loop thread applies
/// between steps in submission order. The engine starts in
/// [`Status::Init`]; [`play`](Self::play) starts stepping.
///
/// Dropping an engine stops its loop thread and waits for it.
pub struct Engine {
    commands: Option<Sender<Command>>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<Simulation>>,
    monitor_ids: MonitorIds,
}

impl Engine {
    /// Timeout for [`wait_for`](Self::wait_for) that never elapses.
    pub const UNBOUNDED: Duration = Duration::MAX;

    /// Spawn the loop thread with default configuration.
    pub fn start(simulation: Simulation) -> Result<Self, EngineError> {
        Self::new(simulation, EngineConfig::default())
    }

    /// Spawn the loop thread.
    pub fn new(simulation: Simulation, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let shared = Arc::new(Shared::default());
        let monitor_ids = simulation.monitor_ids();
        let (tx, rx) = crossbeam_channel::unbounded();

        let loop_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || LoopThreadState::new(simulation, rx, loop_shared).run())
            .map_err(|e| EngineError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;
        debug!(thread = %config.thread_name, "engine started");

        Ok(Self {
            commands: Some(tx),
            shared,
            thread: Some(thread),
            monitor_ids,
        })
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Queue `command` for the loop thread.
    ///
    /// Fails with [`EngineError::AlreadyStopped`] once the engine has
    /// reached a final status.
    pub fn add_command(
        &self,
        command: impl FnOnce(&mut CommandContext<'_>) + Send + 'static,
    ) -> Result<(), EngineError> {
        let status = self.shared.status();
        if status.is_final() {
            return Err(EngineError::AlreadyStopped { status });
        }
        let sender = self
            .commands
            .as_ref()
            .ok_or(EngineError::AlreadyStopped { status })?;
        sender
            .send(Box::new(command))
            .map_err(|_| EngineError::AlreadyStopped {
                status: self.shared.status(),
            })
    }

    /// Start or resume stepping.
    pub fn play(&self) -> Result<(), EngineError> {
        self.add_command(|ctx| {
            ctx.request_status(Status::Running);
        })
    }

    /// Pause after the current step.
    pub fn pause(&self) -> Result<(), EngineError> {
        self.add_command(|ctx| {
            ctx.request_status(Status::Paused);
        })
    }

    /// Run exactly one more step, then pause.
    pub fn step(&self) -> Result<(), EngineError> {
        self.add_command(|ctx| {
            ctx.request_step();
        })
    }

    /// Stop for good. The loop thread exits.
    pub fn stop(&self) -> Result<(), EngineError> {
        self.add_command(|ctx| {
            ctx.request_status(Status::Stopped);
        })
    }

    /// Register `monitor` on the loop thread.
    pub fn add_output_monitor(&self, monitor: impl OutputMonitor) -> Result<MonitorId, EngineError> {
        let id = self.monitor_ids.allocate();
        self.add_command(move |ctx| {
            ctx.simulation_mut()
                .insert_output_monitor(id, Box::new(monitor));
        })?;
        Ok(id)
    }

    /// Unregister monitor `id` on the loop thread.
    pub fn remove_output_monitor(&self, id: MonitorId) -> Result<(), EngineError> {
        self.add_command(move |ctx| {
            ctx.simulation_mut().remove_output_monitor(id);
        })
    }

    // ── Observation ──────────────────────────────────────────────

    /// Current status.
    pub fn status(&self) -> Status {
        self.shared.status()
    }

    /// The error that stopped the simulation, if any.
    pub fn error(&self) -> Option<Arc<SimulationError>> {
        self.shared.state.lock().error.clone()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.shared.state.lock().clone()
    }

    /// Block until the status is `target`, the status becomes final, or
    /// `timeout` elapses. Returns the status observed last.
    ///
    /// [`Duration::ZERO`] returns immediately; [`Engine::UNBOUNDED`]
    /// waits indefinitely.
    pub fn wait_for(&self, target: Status, timeout: Duration) -> Status {
        let mut state = self.shared.state.lock();
        if timeout.is_zero() {
            return state.status;
        }
        let deadline = Instant::now().checked_add(timeout);
        while state.status != target && !state.status.is_final() {
            match deadline {
                Some(deadline) => {
                    if self.shared.changed.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.shared.changed.wait(&mut state),
            }
        }
        state.status
    }

    /// Stop the engine, wait for the loop thread and take the simulation back.
    ///
    /// Commands queued before the call still run. To let a bounded run
    /// finish, wait for [`Status::Terminated`] first.
    pub fn join(mut self) -> Result<Simulation, EngineError> {
        self.shut_down();
        let handle = self.thread.take().ok_or(EngineError::Join)?;
        handle.join().map_err(|_| EngineError::Join)
    }

    /// Queue a final stop and close the channel.
    fn shut_down(&mut self) {
        if let Some(sender) = self.commands.take() {
            // Fails only if the loop thread already exited.
            let _ = sender.send(Box::new(|ctx: &mut CommandContext<'_>| {
                ctx.request_status(Status::Stopped);
            }));
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shut_down();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
