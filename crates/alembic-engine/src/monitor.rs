//! Output monitors: observers notified from the loop thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alembic_core::{MonitorId, ReactionId, Time};
use alembic_model::Environment;
use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::warn;

/// Observer of a running simulation.
///
/// Every callback runs synchronously on the thread that steps the
/// simulation, between steps, so the environment it receives is never
/// being mutated concurrently.
pub trait OutputMonitor: Send + 'static {
    /// The simulation finished initializing (or the monitor was added
    /// to an already initialized simulation).
    fn initialized(&mut self, env: &Environment);

    /// A step completed. `reaction` is the reaction that was popped,
    /// whether or not its conditions held.
    fn step_done(&mut self, env: &Environment, reaction: Option<ReactionId>, time: Time, step: u64);

    /// The simulation terminated, was stopped, or failed.
    fn finished(&mut self, env: &Environment, time: Time, step: u64);
}

/// Source of monitor ids, shared between a simulation and the engine
/// that drives it so ids handed out on either side never collide.
#[derive(Clone, Debug, Default)]
pub(crate) struct MonitorIds(Arc<AtomicU64>);

impl MonitorIds {
    pub(crate) fn allocate(&self) -> MonitorId {
        MonitorId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Registered monitors, notified in registration order.
#[derive(Default)]
pub(crate) struct MonitorRegistry {
    monitors: IndexMap<MonitorId, Box<dyn OutputMonitor>>,
    ids: MonitorIds,
}

impl MonitorRegistry {
    pub(crate) fn allocate_id(&self) -> MonitorId {
        self.ids.allocate()
    }

    pub(crate) fn ids(&self) -> MonitorIds {
        self.ids.clone()
    }

    /// Register under an id from [`allocate_id`](Self::allocate_id).
    /// An id that is already taken is refused and the monitor is returned.
    pub(crate) fn insert(
        &mut self,
        id: MonitorId,
        monitor: Box<dyn OutputMonitor>,
    ) -> Result<(), Box<dyn OutputMonitor>> {
        match self.monitors.entry(id) {
            Entry::Occupied(_) => {
                warn!(monitor = id.0, "monitor id already registered");
                Err(monitor)
            }
            Entry::Vacant(slot) => {
                slot.insert(monitor);
                Ok(())
            }
        }
    }

    pub(crate) fn remove(&mut self, id: MonitorId) -> Option<Box<dyn OutputMonitor>> {
        self.monitors.shift_remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.monitors.len()
    }

    pub(crate) fn initialized(&mut self, env: &Environment) {
        for monitor in self.monitors.values_mut() {
            monitor.initialized(env);
        }
    }

    pub(crate) fn step_done(
        &mut self,
        env: &Environment,
        reaction: Option<ReactionId>,
        time: Time,
        step: u64,
    ) {
        for monitor in self.monitors.values_mut() {
            monitor.step_done(env, reaction, time, step);
        }
    }

    pub(crate) fn finished(&mut self, env: &Environment, time: Time, step: u64) {
        for monitor in self.monitors.values_mut() {
            monitor.finished(env, time, step);
        }
    }
}
