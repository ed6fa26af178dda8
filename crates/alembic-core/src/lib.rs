//! Core types for the Alembic simulation kernel.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the model and the engine: simulated
//! [`Time`], identifiers, [`Position`], the [`Context`] locality bound,
//! [`Dependency`] tokens, the engine [`Status`] and the low-level
//! error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod dependency;
pub mod error;
pub mod id;
pub mod position;
pub mod status;
pub mod time;

pub use context::Context;
pub use dependency::Dependency;
pub use error::TimeError;
pub use id::{Concentration, Molecule, MonitorId, NodeId, ReactionId};
pub use position::Position;
pub use status::Status;
pub use time::Time;
