//! Single-threaded discrete-event step loop.
//!
//! [`Simulation`] owns the environment, every reaction, the scheduler
//! and the dependency graph. Each [`step()`](Simulation::step):
//!
//! 1. peeks the reaction due first and checks the termination bounds;
//! 2. advances the clock to its time;
//! 3. if its conditions hold, runs its actions, applies node clones,
//!    drains the environment's topology log and reschedules every
//!    invalidated reaction (`executed = false`);
//! 4. reschedules the fired reaction itself (`executed = true`);
//! 5. notifies output monitors.
//!
//! [`Engine`](crate::Engine) runs the same loop on a dedicated thread.
//!
//! # Ownership model
//!
//! `Simulation` is [`Send`] but not [`Sync`]: all mutation goes through
//! `&mut self`, so the borrow checker rules out concurrent access.

use std::time::Instant;

use alembic_core::{MonitorId, NodeId, Position, ReactionId, Time};
use alembic_model::{
    ActionContext, CloneRequest, Environment, Node, NodeView, Reaction, TopologyChanges,
};
use indexmap::IndexSet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::config::SimulationConfig;
use crate::dependency::DependencyGraph;
use crate::error::SimulationError;
use crate::metrics::{SimulationStats, StepMetrics};
use crate::monitor::{MonitorIds, MonitorRegistry, OutputMonitor};
use crate::scheduler::Scheduler;
use crate::store::ReactionStore;

const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Simulation>();
    }
};

// ── StepOutcome ──────────────────────────────────────────────────

/// Why a simulation stopped producing steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishReason {
    /// Nothing is scheduled before [`Time::INFINITY`].
    Exhausted,
    /// The next event lies after the configured end time.
    EndTime,
    /// The configured step bound was reached.
    MaxSteps,
}

/// Result of one call to [`Simulation::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// The reaction's conditions held and its actions ran.
    Executed {
        /// The fired reaction.
        reaction: ReactionId,
        /// Its host node.
        node: NodeId,
        /// The simulated time of the step.
        time: Time,
    },
    /// The reaction was due but its conditions did not hold.
    Skipped {
        /// The popped reaction.
        reaction: ReactionId,
        /// Its host node.
        node: NodeId,
        /// The simulated time of the step.
        time: Time,
    },
    /// No further step is possible.
    Finished(FinishReason),
}

// ── Simulation ───────────────────────────────────────────────────

/// A discrete-event simulation over an [`Environment`].
pub struct Simulation {
    env: Environment,
    reactions: ReactionStore,
    scheduler: Scheduler,
    graph: DependencyGraph,
    rng: ChaCha8Rng,
    monitors: MonitorRegistry,
    config: SimulationConfig,
    time: Time,
    step: u64,
    initialized: bool,
    finished: bool,
    stats: SimulationStats,
}

impl Simulation {
    /// Wrap `env`. Reactions are added with [`add_reaction`](Self::add_reaction)
    /// or [`add_node`](Self::add_node).
    pub fn new(env: Environment, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            env,
            reactions: ReactionStore::new(),
            scheduler: Scheduler::new(),
            graph: DependencyGraph::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            monitors: MonitorRegistry::default(),
            config,
            time: Time::ZERO,
            step: 0,
            initialized: false,
            finished: false,
            stats: SimulationStats::default(),
        })
    }

    // ── Accessors ────────────────────────────────────────────────

    /// The environment.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Current simulated time.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Steps taken so far.
    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// The configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Cumulative counters.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Whether [`initialize`](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The reaction store.
    pub fn reactions(&self) -> &ReactionStore {
        &self.reactions
    }

    /// Reaction `id`.
    pub fn reaction(&self, id: ReactionId) -> Option<&Reaction> {
        self.reactions.get(id).map(|e| &e.reaction)
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The dependency graph.
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The reaction due next and its time.
    pub fn next_event(&self) -> Option<(ReactionId, Time)> {
        self.scheduler.peek()
    }

    // ── Structure ────────────────────────────────────────────────

    /// Add `node` at `position` with `reactions` attached.
    pub fn add_node(
        &mut self,
        node: Node,
        position: Position,
        reactions: impl IntoIterator<Item = Reaction>,
    ) -> Result<NodeId, SimulationError> {
        let id = self.env.add_node(node, position)?;
        for reaction in reactions {
            self.attach(id, reaction)?;
        }
        self.after_structural_edit()?;
        Ok(id)
    }

    /// Attach `reaction` to an existing node.
    pub fn add_reaction(
        &mut self,
        node: NodeId,
        reaction: Reaction,
    ) -> Result<ReactionId, SimulationError> {
        let id = self.attach(node, reaction)?;
        self.after_structural_edit()?;
        Ok(id)
    }

    /// Detach and drop reaction `id`.
    pub fn remove_reaction(&mut self, id: ReactionId) -> Result<Reaction, SimulationError> {
        let entry = self
            .reactions
            .remove(id)
            .ok_or(SimulationError::UnknownReaction { reaction: id })?;
        self.graph.remove(id);
        self.scheduler.remove(id);
        if let Ok(node) = self.env.node_mut(entry.node) {
            node.detach_reaction(id);
        }
        Ok(entry.reaction)
    }

    /// Remove node `id` and all its reactions.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, SimulationError> {
        let node = self.env.remove_node(id)?;
        self.purge_reactions(&node);
        self.after_structural_edit()?;
        Ok(node)
    }

    /// Move node `id` to `position`.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), SimulationError> {
        self.env.move_node(id, position)?;
        self.after_structural_edit()
    }

    /// Register `monitor`, returning its id. If the simulation is
    /// already initialized the monitor is told so immediately.
    pub fn add_output_monitor(&mut self, monitor: impl OutputMonitor) -> MonitorId {
        let id = self.monitors.allocate_id();
        self.insert_output_monitor(id, Box::new(monitor));
        id
    }

    /// Unregister monitor `id`.
    pub fn remove_output_monitor(&mut self, id: MonitorId) -> Option<Box<dyn OutputMonitor>> {
        self.monitors.remove(id)
    }

    /// Number of registered monitors.
    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    pub(crate) fn insert_output_monitor(&mut self, id: MonitorId, mut monitor: Box<dyn OutputMonitor>) {
        if self.initialized {
            monitor.initialized(&self.env);
        }
        // Ids come from one shared counter; a refused insert drops the monitor.
        let _ = self.monitors.insert(id, monitor);
    }

    pub(crate) fn monitor_ids(&self) -> MonitorIds {
        self.monitors.ids()
    }

    // ── Stepping ─────────────────────────────────────────────────

    /// Schedule every reaction for the first time and notify monitors.
    /// Idempotent.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.initialized {
            return Ok(());
        }
        for id in self.reactions.ids() {
            self.reschedule(id, true)?;
        }
        // Everything was just scheduled from scratch.
        self.env.take_changes();
        self.initialized = true;
        self.monitors.initialized(&self.env);
        info!(
            nodes = self.env.node_count(),
            reactions = self.reactions.len(),
            seed = self.config.seed,
            "simulation initialized"
        );
        Ok(())
    }

    /// Run one step.
    pub fn step(&mut self) -> Result<StepOutcome, SimulationError> {
        self.initialize()?;
        if let Some(reason) = self.finish_reason() {
            return Ok(StepOutcome::Finished(reason));
        }
        let Some((id, tau)) = self.scheduler.peek() else {
            return Ok(StepOutcome::Finished(FinishReason::Exhausted));
        };
        if tau < self.time {
            return Err(SimulationError::TimeWentBackwards {
                now: self.time,
                scheduled: tau,
            });
        }
        let started = Instant::now();
        self.time = tau;
        let node = self
            .reactions
            .get(id)
            .map(|e| e.node)
            .ok_or(SimulationError::UnknownReaction { reaction: id })?;

        let mut metrics = StepMetrics::default();
        let executed = self.can_execute(id, node)?;
        if executed {
            let exec_started = Instant::now();
            let clones = self.execute(id, node)?;
            metrics.execute_us = exec_started.elapsed().as_micros() as u64;
            for request in clones {
                self.clone_node(request)?;
            }
            let mut dirty: IndexSet<ReactionId> =
                self.graph.invalidated_by(id, &self.env).into_iter().collect();
            let changes = self.env.take_changes();
            self.record_changes(&changes, &mut metrics);
            self.purge_removed(&changes);
            dirty.extend(self.graph.affected_by_topology(&changes, &self.env));
            dirty.shift_remove(&id);
            for other in dirty {
                if self.reactions.contains(other) {
                    self.reschedule(other, false)?;
                    metrics.reactions_updated += 1;
                }
            }
        }
        if self.reactions.contains(id) {
            self.reschedule(id, true)?;
        }
        self.step += 1;
        metrics.total_us = started.elapsed().as_micros() as u64;
        trace!(
            reaction = %id,
            node = %node,
            time = %self.time,
            executed,
            updated = metrics.reactions_updated,
            "step"
        );
        self.stats.record(metrics, executed);
        self.monitors
            .step_done(&self.env, Some(id), self.time, self.step);

        Ok(if executed {
            StepOutcome::Executed {
                reaction: id,
                node,
                time: self.time,
            }
        } else {
            StepOutcome::Skipped {
                reaction: id,
                node,
                time: self.time,
            }
        })
    }

    /// Step until a termination bound is hit, then notify monitors.
    pub fn run(&mut self) -> Result<FinishReason, SimulationError> {
        loop {
            if let StepOutcome::Finished(reason) = self.step()? {
                self.finish();
                return Ok(reason);
            }
        }
    }

    /// Notify monitors that the simulation is over. Idempotent.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.monitors.finished(&self.env, self.time, self.step);
        info!(time = %self.time, steps = self.step, "simulation finished");
    }

    /// Why the next step would not run, if it would not.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        if self.config.max_steps.is_some_and(|max| self.step >= max) {
            return Some(FinishReason::MaxSteps);
        }
        match self.scheduler.peek() {
            None => Some(FinishReason::Exhausted),
            Some((_, tau)) if tau.is_infinite() => Some(FinishReason::Exhausted),
            Some((_, tau)) if tau > self.config.end_time => Some(FinishReason::EndTime),
            Some(_) => None,
        }
    }

    // ── Internals ────────────────────────────────────────────────

    fn attach(&mut self, node: NodeId, reaction: Reaction) -> Result<ReactionId, SimulationError> {
        self.env.node(node)?;
        let id = self.reactions.insert(node, reaction);
        self.env.node_mut(node)?.attach_reaction(id);
        if let Some(entry) = self.reactions.get(id) {
            self.graph.add(id, node, &entry.reaction);
        }
        if self.initialized {
            self.reschedule(id, true)?;
        }
        debug!(reaction = %id, node = %node, "reaction attached");
        Ok(id)
    }

    /// Reschedule whatever a structural edit made among existing reactions.
    fn after_structural_edit(&mut self) -> Result<(), SimulationError> {
        let changes = self.env.take_changes();
        if !self.initialized || changes.is_empty() {
            return Ok(());
        }
        self.purge_removed(&changes);
        for id in self.graph.affected_by_topology(&changes, &self.env) {
            if self.reactions.contains(id) {
                self.reschedule(id, false)?;
            }
        }
        Ok(())
    }

    fn can_execute(&self, id: ReactionId, node: NodeId) -> Result<bool, SimulationError> {
        let entry = self
            .reactions
            .get(id)
            .ok_or(SimulationError::UnknownReaction { reaction: id })?;
        let view = NodeView::new(&self.env, node, self.time);
        entry
            .reaction
            .can_execute(&view)
            .map_err(|e| SimulationError::from_reaction(id, e))
    }

    fn execute(&mut self, id: ReactionId, node: NodeId) -> Result<Vec<CloneRequest>, SimulationError> {
        let entry = self
            .reactions
            .get(id)
            .ok_or(SimulationError::UnknownReaction { reaction: id })?;
        let mut clones = Vec::new();
        let mut ctx = ActionContext::new(&mut self.env, node, self.time, &mut self.rng, &mut clones);
        entry
            .reaction
            .execute(&mut ctx)
            .map_err(|e| SimulationError::from_reaction(id, e))?;
        Ok(clones)
    }

    fn reschedule(&mut self, id: ReactionId, executed: bool) -> Result<(), SimulationError> {
        let entry = self
            .reactions
            .get_mut(id)
            .ok_or(SimulationError::UnknownReaction { reaction: id })?;
        entry
            .reaction
            .update(self.time, executed, entry.node, &self.env)
            .map_err(|e| SimulationError::from_reaction(id, e))?;
        self.scheduler.schedule(id, entry.reaction.tau());
        Ok(())
    }

    fn clone_node(&mut self, request: CloneRequest) -> Result<(), SimulationError> {
        let source = self.env.node(request.source)?;
        let copy = source.clone_contents(self.env.allocate_node_id());
        let source_reactions = source.reactions().to_vec();
        let new_id = self.env.add_node(copy, request.position)?;
        for rid in source_reactions {
            let time = self.time;
            let Some(entry) = self.reactions.get_mut(rid) else {
                continue;
            };
            let reaction = entry.reaction.clone_on_new_node(time);
            self.attach(new_id, reaction)?;
        }
        debug!(source = %request.source, node = %new_id, "node cloned");
        Ok(())
    }

    fn purge_removed(&mut self, changes: &TopologyChanges) {
        for &node in &changes.removed_nodes {
            let orphans: Vec<ReactionId> = self.graph.reactions_on(node).to_vec();
            for id in orphans {
                self.reactions.remove(id);
                self.graph.remove(id);
                self.scheduler.remove(id);
            }
        }
    }

    fn purge_reactions(&mut self, node: &Node) {
        for &id in node.reactions() {
            self.reactions.remove(id);
            self.graph.remove(id);
            self.scheduler.remove(id);
        }
    }

    fn record_changes(&self, changes: &TopologyChanges, metrics: &mut StepMetrics) {
        metrics.edge_changes = changes.linked.len() + changes.unlinked.len();
        metrics.nodes_added = changes.added_nodes.len();
        metrics.nodes_removed = changes.removed_nodes.len();
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.time)
            .field("step", &self.step)
            .field("reactions", &self.reactions.len())
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}
