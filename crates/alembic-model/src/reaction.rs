//! Reactions: guarded, timed rewrites of the environment.
//!
//! A [`Reaction`] bundles [`Condition`]s (which gate it and contribute
//! to its propensity), [`Action`]s (which mutate the environment when it
//! fires) and a [`TimeDistribution`] (which decides when it fires).
//!
//! From its conditions and actions a reaction derives:
//!
//! - inbound dependencies: what it reads;
//! - outbound dependencies: what it writes;
//! - input and output [`Context`]s: how far from its node it reads and
//!   writes (the widest context of any condition or action).
//!
//! The engine uses these to decide which reactions must be rescheduled
//! after one fires.

use std::fmt;
use std::sync::Arc;

use alembic_core::{Concentration, Context, Dependency, Molecule, NodeId, Position, Time};
use rand_chacha::ChaCha8Rng;

use crate::distribution::TimeDistribution;
use crate::environment::Environment;
use crate::error::{ReactionError, TopologyError};
use crate::neighborhood::Neighborhood;
use crate::node::Node;

/// Read-only view of the environment from a reaction's node.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    env: &'a Environment,
    node: NodeId,
    time: Time,
}

impl<'a> NodeView<'a> {
    /// A view of `env` centered on `node` at `time`.
    pub fn new(env: &'a Environment, node: NodeId, time: Time) -> Self {
        Self { env, node, time }
    }

    /// The whole environment.
    pub fn env(&self) -> &'a Environment {
        self.env
    }

    /// Id of the node the reaction runs on.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Current simulated time.
    pub fn time(&self) -> Time {
        self.time
    }

    /// The node the reaction runs on.
    pub fn node(&self) -> Result<&'a Node, TopologyError> {
        self.env.node(self.node)
    }

    /// Concentration of `molecule` on the node, zero if absent.
    pub fn concentration(&self, molecule: &Molecule) -> Result<Concentration, TopologyError> {
        Ok(self.node()?.concentration(molecule).unwrap_or(0.0))
    }

    /// The node's neighborhood.
    pub fn neighborhood(&self) -> Result<&'a Neighborhood, TopologyError> {
        self.env.neighborhood(self.node)
    }

    /// The node's position.
    pub fn position(&self) -> Result<&'a Position, TopologyError> {
        self.env.position(self.node)
    }
}

/// A request to add a node, applied by the engine after the actions run.
#[derive(Clone, Debug, PartialEq)]
pub struct CloneRequest {
    /// Node whose contents and reactions are copied.
    pub source: NodeId,
    /// Where the copy is placed.
    pub position: Position,
}

/// Mutable access for actions while a reaction fires.
pub struct ActionContext<'a> {
    env: &'a mut Environment,
    node: NodeId,
    time: Time,
    rng: &'a mut ChaCha8Rng,
    clones: &'a mut Vec<CloneRequest>,
}

impl<'a> ActionContext<'a> {
    /// Context for a reaction on `node` at `time`.
    pub fn new(
        env: &'a mut Environment,
        node: NodeId,
        time: Time,
        rng: &'a mut ChaCha8Rng,
        clones: &'a mut Vec<CloneRequest>,
    ) -> Self {
        Self {
            env,
            node,
            time,
            rng,
            clones,
        }
    }

    /// Id of the node the reaction runs on.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Current simulated time.
    pub fn time(&self) -> Time {
        self.time
    }

    /// The environment.
    pub fn env(&self) -> &Environment {
        &*self.env
    }

    /// The environment, mutably. Structural edits are picked up by the
    /// engine through the environment's change log.
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut *self.env
    }

    /// The engine's random generator.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut *self.rng
    }

    /// Read-only view from the reaction's node.
    pub fn view(&self) -> NodeView<'_> {
        NodeView::new(&*self.env, self.node, self.time)
    }

    /// The reaction's node, mutably.
    pub fn node_mut(&mut self) -> Result<&mut Node, TopologyError> {
        self.env.node_mut(self.node)
    }

    /// Add `delta` to `molecule` on the reaction's node. Returns the new value.
    pub fn change_concentration(
        &mut self,
        molecule: &Molecule,
        delta: Concentration,
    ) -> Result<Concentration, TopologyError> {
        let node = self.node_mut()?;
        let value = node.concentration(molecule).unwrap_or(0.0) + delta;
        node.set_concentration(molecule.clone(), value);
        Ok(value)
    }

    /// Ask the engine to copy `source` (contents and reactions) to `position`.
    pub fn request_clone(&mut self, source: NodeId, position: Position) {
        self.clones.push(CloneRequest { source, position });
    }
}

/// A guard on a reaction.
pub trait Condition: Send + Sync + 'static {
    /// Short name for logs and errors.
    fn name(&self) -> &str;

    /// How far from the node this condition reads.
    fn context(&self) -> Context {
        Context::Local
    }

    /// What this condition reads.
    fn inbound(&self) -> Vec<Dependency>;

    /// Whether the condition currently holds.
    fn is_valid(&self, view: &NodeView<'_>) -> Result<bool, ReactionError>;

    /// Multiplicative contribution to a mass-action propensity.
    ///
    /// Defaults to `1` when valid and `0` otherwise.
    fn propensity_contribution(&self, view: &NodeView<'_>) -> Result<f64, ReactionError> {
        Ok(if self.is_valid(view)? { 1.0 } else { 0.0 })
    }
}

/// An effect of a reaction.
pub trait Action: Send + Sync + 'static {
    /// Short name for logs and errors.
    fn name(&self) -> &str;

    /// How far from the node this action writes.
    fn context(&self) -> Context {
        Context::Local
    }

    /// What this action writes.
    fn outbound(&self) -> Vec<Dependency>;

    /// Apply the effect.
    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError>;
}

/// How conditions turn into a propensity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Kinetics {
    /// `rate × ∏ contribution`.
    #[default]
    MassAction,
    /// `rate` when every condition holds, else zero.
    Gated,
}

/// Mass-action propensity: `rate` times the product of `contributions`.
pub fn mass_action_propensity(rate: f64, contributions: impl IntoIterator<Item = f64>) -> f64 {
    contributions.into_iter().fold(rate, |acc, c| acc * c)
}

/// Gated propensity: `rate` if all conditions hold, else zero.
pub fn gated_propensity(rate: f64, all_valid: bool) -> f64 {
    if all_valid {
        rate
    } else {
        0.0
    }
}

/// A timed, guarded rewrite attached to one node.
pub struct Reaction {
    conditions: Vec<Arc<dyn Condition>>,
    actions: Vec<Arc<dyn Action>>,
    distribution: Box<dyn TimeDistribution>,
    kinetics: Kinetics,
    inbound: Vec<Dependency>,
    outbound: Vec<Dependency>,
    input_context: Context,
    output_context: Context,
    propensity: f64,
}

impl Reaction {
    /// A reaction with no conditions and no actions.
    pub fn new(distribution: impl TimeDistribution) -> Self {
        Self::from_boxed(Box::new(distribution))
    }

    /// Like [`new`](Self::new), for an already boxed distribution.
    pub fn from_boxed(distribution: Box<dyn TimeDistribution>) -> Self {
        Self {
            conditions: Vec::new(),
            actions: Vec::new(),
            distribution,
            kinetics: Kinetics::default(),
            inbound: Vec::new(),
            outbound: Vec::new(),
            input_context: Context::Local,
            output_context: Context::Local,
            propensity: 0.0,
        }
    }

    /// Add a condition.
    pub fn with_condition(self, condition: impl Condition) -> Self {
        self.with_shared_condition(Arc::new(condition))
    }

    /// Add a condition shared with other reactions.
    pub fn with_shared_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self.refresh_footprint();
        self
    }

    /// Add an action.
    pub fn with_action(self, action: impl Action) -> Self {
        self.with_shared_action(Arc::new(action))
    }

    /// Add an action shared with other reactions.
    pub fn with_shared_action(mut self, action: Arc<dyn Action>) -> Self {
        self.actions.push(action);
        self.refresh_footprint();
        self
    }

    /// Choose how the propensity is computed.
    pub fn with_kinetics(mut self, kinetics: Kinetics) -> Self {
        self.kinetics = kinetics;
        self
    }

    fn refresh_footprint(&mut self) {
        self.inbound = dedup(self.conditions.iter().flat_map(|c| c.inbound()));
        self.outbound = dedup(self.actions.iter().flat_map(|a| a.outbound()));
        self.input_context = Context::widest(self.conditions.iter().map(|c| c.context()));
        self.output_context = Context::widest(self.actions.iter().map(|a| a.context()));
    }

    /// Putative next occurrence.
    pub fn tau(&self) -> Time {
        self.distribution.next_occurrence()
    }

    /// Base rate of the time distribution.
    pub fn rate(&self) -> f64 {
        self.distribution.rate()
    }

    /// Propensity computed by the last [`update`](Self::update).
    pub fn propensity(&self) -> f64 {
        self.propensity
    }

    /// What this reaction reads.
    pub fn inbound(&self) -> &[Dependency] {
        &self.inbound
    }

    /// What this reaction writes.
    pub fn outbound(&self) -> &[Dependency] {
        &self.outbound
    }

    /// Widest context of any condition.
    pub fn input_context(&self) -> Context {
        self.input_context
    }

    /// Widest context of any action.
    pub fn output_context(&self) -> Context {
        self.output_context
    }

    /// The guard conditions, in insertion order.
    pub fn conditions(&self) -> &[Arc<dyn Condition>] {
        &self.conditions
    }

    /// The actions, in execution order.
    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    /// The time distribution.
    pub fn distribution(&self) -> &dyn TimeDistribution {
        self.distribution.as_ref()
    }

    /// The kinetics in use.
    pub fn kinetics(&self) -> Kinetics {
        self.kinetics
    }

    /// Whether every condition holds.
    pub fn can_execute(&self, view: &NodeView<'_>) -> Result<bool, ReactionError> {
        for condition in &self.conditions {
            if !condition.is_valid(view)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run every action, in order. Stops at the first failure.
    pub fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
        for action in &self.actions {
            action.execute(ctx)?;
        }
        Ok(())
    }

    /// Recompute the propensity and revise the next occurrence.
    pub fn update(
        &mut self,
        now: Time,
        executed: bool,
        node: NodeId,
        env: &Environment,
    ) -> Result<(), ReactionError> {
        let view = NodeView::new(env, node, now);
        let rate = self.distribution.rate();
        self.propensity = match self.kinetics {
            Kinetics::MassAction => {
                let mut contributions = Vec::with_capacity(self.conditions.len());
                for condition in &self.conditions {
                    contributions.push(condition.propensity_contribution(&view)?);
                }
                mass_action_propensity(rate, contributions)
            }
            Kinetics::Gated => gated_propensity(rate, self.can_execute(&view)?),
        };
        self.distribution
            .update(now, executed, self.propensity, env)?;
        Ok(())
    }

    /// A copy for a new node: same conditions and actions, fresh
    /// distribution starting at `start`.
    pub fn clone_on_new_node(&mut self, start: Time) -> Reaction {
        Reaction {
            conditions: self.conditions.clone(),
            actions: self.actions.clone(),
            distribution: self.distribution.clone_on_new_node(start),
            kinetics: self.kinetics,
            inbound: self.inbound.clone(),
            outbound: self.outbound.clone(),
            input_context: self.input_context,
            output_context: self.output_context,
            propensity: 0.0,
        }
    }
}

fn dedup(deps: impl Iterator<Item = Dependency>) -> Vec<Dependency> {
    let mut out: Vec<Dependency> = Vec::new();
    for dep in deps {
        if !out.contains(&dep) {
            out.push(dep);
        }
    }
    out
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions: Vec<&str> = self.conditions.iter().map(|c| c.name()).collect();
        let actions: Vec<&str> = self.actions.iter().map(|a| a.name()).collect();
        f.debug_struct("Reaction")
            .field("distribution", &self.distribution.name())
            .field("tau", &self.tau())
            .field("conditions", &conditions)
            .field("actions", &actions)
            .field("input_context", &self.input_context)
            .field("output_context", &self.output_context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DiracComb;
    use rand::SeedableRng;

    struct AtLeast(Molecule, f64);

    impl Condition for AtLeast {
        fn name(&self) -> &str {
            "at-least"
        }
        fn inbound(&self) -> Vec<Dependency> {
            vec![Dependency::Molecule(self.0.clone())]
        }
        fn is_valid(&self, view: &NodeView<'_>) -> Result<bool, ReactionError> {
            Ok(view.concentration(&self.0)? >= self.1)
        }
        fn propensity_contribution(&self, view: &NodeView<'_>) -> Result<f64, ReactionError> {
            Ok(view.concentration(&self.0)?)
        }
    }

    struct Add(Molecule, f64, Context);

    impl Action for Add {
        fn name(&self) -> &str {
            "add"
        }
        fn context(&self) -> Context {
            self.2
        }
        fn outbound(&self) -> Vec<Dependency> {
            vec![Dependency::Molecule(self.0.clone())]
        }
        fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
            ctx.change_concentration(&self.0, self.1)?;
            Ok(())
        }
    }

    fn setup() -> (Environment, NodeId) {
        let mut env = Environment::new(1);
        let node = env.create_node().with_concentration("a", 3.0);
        let id = env.add_node(node, Position::origin(1)).unwrap();
        (env, id)
    }

    #[test]
    fn footprint_follows_conditions_and_actions() {
        let a = Molecule::new("a");
        let reaction = Reaction::new(DiracComb::new(1.0).unwrap())
            .with_condition(AtLeast(a.clone(), 1.0))
            .with_action(Add(a.clone(), 1.0, Context::Neighborhood))
            .with_action(Add(a.clone(), 1.0, Context::Local));
        assert_eq!(reaction.inbound(), &[Dependency::Molecule(a.clone())]);
        assert_eq!(reaction.outbound(), &[Dependency::Molecule(a)]);
        assert_eq!(reaction.input_context(), Context::Local);
        assert_eq!(reaction.output_context(), Context::Neighborhood);
    }

    #[test]
    fn mass_action_multiplies_contributions() {
        let (env, id) = setup();
        let mut reaction = Reaction::new(DiracComb::new(2.0).unwrap())
            .with_condition(AtLeast(Molecule::new("a"), 1.0));
        reaction.update(Time::ZERO, true, id, &env).unwrap();
        assert_eq!(reaction.propensity(), 6.0);
        assert_eq!(reaction.tau(), Time::from_secs(0.5).unwrap());
    }

    #[test]
    fn gated_kinetics_uses_validity() {
        let (env, id) = setup();
        let mut reaction = Reaction::new(DiracComb::new(2.0).unwrap())
            .with_condition(AtLeast(Molecule::new("a"), 5.0))
            .with_kinetics(Kinetics::Gated);
        reaction.update(Time::ZERO, true, id, &env).unwrap();
        assert_eq!(reaction.propensity(), 0.0);
    }

    #[test]
    fn execute_runs_actions_in_order() {
        let (mut env, id) = setup();
        let a = Molecule::new("a");
        let reaction = Reaction::new(DiracComb::new(1.0).unwrap())
            .with_action(Add(a.clone(), 1.0, Context::Local))
            .with_action(Add(a.clone(), -4.0, Context::Local));
        let view = NodeView::new(&env, id, Time::ZERO);
        assert!(reaction.can_execute(&view).unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut clones = Vec::new();
        let mut ctx = ActionContext::new(&mut env, id, Time::ZERO, &mut rng, &mut clones);
        reaction.execute(&mut ctx).unwrap();
        assert_eq!(env.node(id).unwrap().concentration(&a), Some(0.0));
    }

    #[test]
    fn missing_node_surfaces_as_topology_error() {
        let (env, _) = setup();
        let reaction = Reaction::new(DiracComb::new(1.0).unwrap())
            .with_condition(AtLeast(Molecule::new("a"), 1.0));
        let view = NodeView::new(&env, NodeId(99), Time::ZERO);
        assert_eq!(
            reaction.can_execute(&view),
            Err(ReactionError::Topology(TopologyError::UnknownNode { node: NodeId(99) }))
        );
    }

    #[test]
    fn clone_shares_logic_but_not_schedule() {
        let (env, id) = setup();
        let mut reaction = Reaction::new(DiracComb::new(1.0).unwrap())
            .with_condition(AtLeast(Molecule::new("a"), 1.0));
        reaction.update(Time::ZERO, true, id, &env).unwrap();
        let copy = reaction.clone_on_new_node(Time::from_secs(7.0).unwrap());
        assert_eq!(copy.tau(), Time::from_secs(7.0).unwrap());
        assert_eq!(copy.inbound(), reaction.inbound());
        assert!(Arc::ptr_eq(&copy.conditions()[0], &reaction.conditions()[0]));
    }

    #[test]
    fn propensity_helpers() {
        assert_eq!(mass_action_propensity(2.0, [3.0, 0.5]), 3.0);
        assert_eq!(mass_action_propensity(2.0, std::iter::empty::<f64>()), 2.0);
        assert_eq!(gated_propensity(2.0, false), 0.0);
    }
}
