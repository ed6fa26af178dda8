//! Test utilities and mock types for Alembic development.
//!
//! Provides small [`Condition`], [`Action`] and [`OutputMonitor`]
//! implementations for building scenarios in tests, plus ready-made
//! environments and reactions in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alembic_core::{Context, Dependency, Molecule, Position, ReactionId, Time};
use alembic_engine::OutputMonitor;
use alembic_model::{Action, ActionContext, Condition, Environment, NodeView, ReactionError};
use parking_lot::Mutex;

// ── Conditions ───────────────────────────────────────────────────

/// Always (or never) valid, with a fixed contribution.
pub struct ConstantCondition {
    valid: bool,
    contribution: f64,
}

impl ConstantCondition {
    pub fn valid() -> Self {
        Self {
            valid: true,
            contribution: 1.0,
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            contribution: 0.0,
        }
    }

    /// Valid, contributing `contribution` to a mass-action propensity.
    pub fn contributing(contribution: f64) -> Self {
        Self {
            valid: true,
            contribution,
        }
    }
}

impl Condition for ConstantCondition {
    fn name(&self) -> &str {
        "constant"
    }

    fn inbound(&self) -> Vec<Dependency> {
        Vec::new()
    }

    fn is_valid(&self, _view: &NodeView<'_>) -> Result<bool, ReactionError> {
        Ok(self.valid)
    }

    fn propensity_contribution(&self, _view: &NodeView<'_>) -> Result<f64, ReactionError> {
        Ok(self.contribution)
    }
}

/// Valid while the amount of a molecule is at least a threshold.
///
/// The amount is read from the node itself (`Local`), the node plus its
/// neighbors (`Neighborhood`) or every node (`Global`). The propensity
/// contribution is the amount.
pub struct ConcentrationCondition {
    molecule: Molecule,
    threshold: f64,
    context: Context,
}

impl ConcentrationCondition {
    pub fn at_least(molecule: impl Into<Molecule>, threshold: f64) -> Self {
        Self {
            molecule: molecule.into(),
            threshold,
            context: Context::Local,
        }
    }

    pub fn in_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    fn amount(&self, view: &NodeView<'_>) -> Result<f64, ReactionError> {
        let env = view.env();
        let read = |id| -> Result<f64, ReactionError> {
            Ok(env.node(id)?.concentration(&self.molecule).unwrap_or(0.0))
        };
        match self.context {
            Context::Local => read(view.node_id()),
            Context::Neighborhood => {
                let mut total = read(view.node_id())?;
                for n in view.neighborhood()?.iter() {
                    total += read(n)?;
                }
                Ok(total)
            }
            Context::Global => Ok(env
                .nodes()
                .map(|n| n.concentration(&self.molecule).unwrap_or(0.0))
                .sum()),
        }
    }
}

impl Condition for ConcentrationCondition {
    fn name(&self) -> &str {
        "concentration"
    }

    fn context(&self) -> Context {
        self.context
    }

    fn inbound(&self) -> Vec<Dependency> {
        let mut deps = vec![Dependency::Molecule(self.molecule.clone())];
        // Wider sums change when nodes join or leave them.
        if self.context != Context::Local {
            deps.extend([Dependency::NeighborAdded, Dependency::NeighborRemoved]);
        }
        deps
    }

    fn is_valid(&self, view: &NodeView<'_>) -> Result<bool, ReactionError> {
        Ok(self.amount(view)? >= self.threshold)
    }

    fn propensity_contribution(&self, view: &NodeView<'_>) -> Result<f64, ReactionError> {
        self.amount(view)
    }
}

/// Valid while the node has at least `min_neighbors` neighbors.
pub struct NeighborhoodCondition {
    min_neighbors: usize,
}

impl NeighborhoodCondition {
    pub fn new(min_neighbors: usize) -> Self {
        Self { min_neighbors }
    }
}

impl Condition for NeighborhoodCondition {
    fn name(&self) -> &str {
        "neighborhood"
    }

    fn context(&self) -> Context {
        Context::Neighborhood
    }

    fn inbound(&self) -> Vec<Dependency> {
        vec![Dependency::NeighborAdded, Dependency::NeighborRemoved]
    }

    fn is_valid(&self, view: &NodeView<'_>) -> Result<bool, ReactionError> {
        Ok(view.neighborhood()?.len() >= self.min_neighbors)
    }
}

// ── Actions ──────────────────────────────────────────────────────

/// Adds `delta` to a molecule on the reaction's node.
pub struct ChangeConcentration {
    molecule: Molecule,
    delta: f64,
    context: Context,
}

impl ChangeConcentration {
    pub fn new(molecule: impl Into<Molecule>, delta: f64) -> Self {
        Self {
            molecule: molecule.into(),
            delta,
            context: Context::Local,
        }
    }

    /// Declare a wider output context than the node itself.
    pub fn in_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl Action for ChangeConcentration {
    fn name(&self) -> &str {
        "change-concentration"
    }

    fn context(&self) -> Context {
        self.context
    }

    fn outbound(&self) -> Vec<Dependency> {
        vec![Dependency::Molecule(self.molecule.clone())]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        ctx.change_concentration(&self.molecule, self.delta)?;
        Ok(())
    }
}

/// Moves the reaction's node by a fixed offset.
pub struct MoveBy {
    offset: Vec<f64>,
}

impl MoveBy {
    pub fn new(offset: impl Into<Vec<f64>>) -> Self {
        Self {
            offset: offset.into(),
        }
    }
}

impl Action for MoveBy {
    fn name(&self) -> &str {
        "move-by"
    }

    fn outbound(&self) -> Vec<Dependency> {
        vec![Dependency::Movement]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        let node = ctx.node_id();
        ctx.env_mut().move_node_by(node, &self.offset)?;
        Ok(())
    }
}

/// Moves the reaction's node to a fixed position.
pub struct MoveTo {
    position: Position,
}

impl MoveTo {
    pub fn new(position: impl Into<Position>) -> Self {
        Self {
            position: position.into(),
        }
    }
}

impl Action for MoveTo {
    fn name(&self) -> &str {
        "move-to"
    }

    fn outbound(&self) -> Vec<Dependency> {
        vec![Dependency::Movement]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        let node = ctx.node_id();
        ctx.env_mut().move_node(node, self.position.clone())?;
        Ok(())
    }
}

/// Copies the reaction's node (contents and reactions) at an offset.
pub struct CloneSelf {
    offset: Vec<f64>,
}

impl CloneSelf {
    pub fn new(offset: impl Into<Vec<f64>>) -> Self {
        Self {
            offset: offset.into(),
        }
    }
}

impl Action for CloneSelf {
    fn name(&self) -> &str {
        "clone-self"
    }

    fn outbound(&self) -> Vec<Dependency> {
        vec![Dependency::NeighborAdded]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        let node = ctx.node_id();
        let target = ctx.env().position(node)?.translated(&self.offset);
        ctx.request_clone(node, target);
        Ok(())
    }
}

/// Removes the reaction's own node from the environment.
pub struct RemoveSelf;

impl Action for RemoveSelf {
    fn name(&self) -> &str {
        "remove-self"
    }

    fn outbound(&self) -> Vec<Dependency> {
        vec![Dependency::NeighborRemoved]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        let node = ctx.node_id();
        ctx.env_mut().remove_node(node)?;
        Ok(())
    }
}

/// Fails every time it runs.
pub struct FailingAction {
    reason: String,
}

impl FailingAction {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Action for FailingAction {
    fn name(&self) -> &str {
        "failing"
    }

    fn outbound(&self) -> Vec<Dependency> {
        Vec::new()
    }

    fn execute(&self, _ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        Err(ReactionError::failed(self.name(), self.reason.clone()))
    }
}

/// Counts its executions in a shared counter.
pub struct CountingAction {
    count: Arc<AtomicUsize>,
}

impl CountingAction {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (
            Self {
                count: Arc::clone(&count),
            },
            count,
        )
    }
}

impl Action for CountingAction {
    fn name(&self) -> &str {
        "counting"
    }

    fn outbound(&self) -> Vec<Dependency> {
        Vec::new()
    }

    fn execute(&self, _ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Monitors ─────────────────────────────────────────────────────

/// Everything a [`RecordingMonitor`] saw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recording {
    pub initialized: usize,
    pub steps: Vec<(ReactionId, Time)>,
    pub step_counts: Vec<u64>,
    pub finished: Vec<(Time, u64)>,
}

/// Records every notification into a shared [`Recording`].
#[derive(Clone, Default)]
pub struct RecordingMonitor {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of what has been recorded so far.
    pub fn recording(&self) -> Recording {
        self.recording.lock().clone()
    }

    /// The `(reaction, time)` pairs of every step so far.
    pub fn steps(&self) -> Vec<(ReactionId, Time)> {
        self.recording.lock().steps.clone()
    }
}

impl OutputMonitor for RecordingMonitor {
    fn initialized(&mut self, _env: &Environment) {
        self.recording.lock().initialized += 1;
    }

    fn step_done(&mut self, _env: &Environment, reaction: Option<ReactionId>, time: Time, step: u64) {
        let mut recording = self.recording.lock();
        if let Some(reaction) = reaction {
            recording.steps.push((reaction, time));
        }
        recording.step_counts.push(step);
    }

    fn finished(&mut self, _env: &Environment, time: Time, step: u64) {
        self.recording.lock().finished.push((time, step));
    }
}
