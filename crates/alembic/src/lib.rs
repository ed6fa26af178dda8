//! Alembic: a discrete-event stochastic simulation kernel.
//!
//! Nodes carry molecule concentrations and live at positions in a
//! continuous environment. Reactions attached to nodes fire at times
//! drawn from their time distributions; a dependency graph limits
//! rescheduling after each event to the reactions that could have been
//! affected. This facade re-exports the public API of the sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use alembic::prelude::*;
//!
//! // Adds one `a` to its node every time it fires.
//! struct Produce;
//! impl Action for Produce {
//!     fn name(&self) -> &str { "produce" }
//!     fn outbound(&self) -> Vec<Dependency> {
//!         vec![Dependency::Molecule("a".into())]
//!     }
//!     fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ReactionError> {
//!         ctx.change_concentration(&"a".into(), 1.0)?;
//!         Ok(())
//!     }
//! }
//!
//! let env = Environment::with_linking_rule(2, ConnectWithinDistance::new(1.0));
//! let node = env.create_node();
//! let config = SimulationConfig {
//!     max_steps: Some(4),
//!     ..SimulationConfig::with_seed(42)
//! };
//! let mut sim = Simulation::new(env, config).unwrap();
//! let id = sim
//!     .add_node(
//!         node,
//!         Position::origin(2),
//!         [Reaction::new(DiracComb::new(2.0).unwrap()).with_action(Produce)],
//!     )
//!     .unwrap();
//!
//! assert_eq!(sim.run().unwrap(), FinishReason::MaxSteps);
//! assert_eq!(sim.time(), Time::from_secs(2.0).unwrap());
//! assert_eq!(sim.env().node(id).unwrap().concentration(&"a".into()), Some(4.0));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `alembic-core` | Time, ids, positions, contexts, dependencies, status |
//! | [`model`] | `alembic-model` | Environment, nodes, linking rules, reactions, distributions |
//! | [`engine`] | `alembic-engine` | Scheduler, dependency graph, simulation loop, threaded engine |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary (`alembic-core`).
///
/// [`types::Time`], the identifier types, [`types::Position`] and the
/// [`types::Status`] state machine.
pub use alembic_core as types;

/// Simulation model (`alembic-model`).
///
/// The [`model::Environment`] with its neighbor cache, the
/// [`model::LinkingRule`] implementations, [`model::Reaction`] with its
/// conditions and actions, and the time distributions.
pub use alembic_model as model;

/// Scheduling and execution (`alembic-engine`).
///
/// [`engine::Simulation`] for stepping on the caller's thread,
/// [`engine::Engine`] for running it on a dedicated loop thread.
pub use alembic_engine as engine;

/// Common imports for typical Alembic usage.
///
/// ```rust
/// use alembic::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use alembic_core::{
        Context, Dependency, Molecule, NodeId, Position, ReactionId, Status, Time,
    };

    // Model
    pub use alembic_model::{
        Action, ActionContext, ClosestN, Condition, ConnectWithinDistance, DiracComb,
        Environment, ExponentialTime, Kinetics, LinkingRule, Node, NodeView, Reaction,
        TimeDistribution, Trigger,
    };

    // Errors
    pub use alembic_model::{DistributionError, ReactionError, TopologyError};
    pub use alembic_engine::{EngineError, SimulationError};

    // Engine
    pub use alembic_engine::{
        Engine, FinishReason, OutputMonitor, Simulation, SimulationConfig, StepOutcome,
    };
}
