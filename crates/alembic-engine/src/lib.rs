//! Scheduling and execution for Alembic simulations.
//!
//! - [`Scheduler`]: indexed min-heap of reactions keyed by next occurrence.
//! - [`DependencyGraph`]: which reactions must be rescheduled after one fires.
//! - [`Simulation`]: the single-threaded step loop.
//! - [`Engine`]: runs a [`Simulation`] on a dedicated thread, driven by
//!   commands, with a blocking [`Engine::wait_for`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod config;
pub mod dependency;
pub mod engine;
pub mod error;
pub(crate) mod loop_thread;
pub mod metrics;
pub mod monitor;
pub mod scheduler;
pub mod simulation;
pub mod store;

pub use command::{Command, CommandContext};
pub use config::{ConfigError, EngineConfig, SimulationConfig};
pub use dependency::DependencyGraph;
pub use engine::{Engine, EngineSnapshot};
pub use error::{EngineError, SimulationError};
pub use metrics::{SimulationStats, StepMetrics};
pub use monitor::OutputMonitor;
pub use scheduler::Scheduler;
pub use simulation::{FinishReason, Simulation, StepOutcome};
pub use store::{ReactionEntry, ReactionStore};
