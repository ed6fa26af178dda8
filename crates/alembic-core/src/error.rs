//! Error types shared across the Alembic workspace.
//!
//! Only errors that can arise from core value construction live here;
//! model and engine errors wrap them.

use thiserror::Error;

/// Invalid time value or time delta.
///
/// Produced when a computation would yield a NaN or negative time. The
/// engine treats either as a fatal scheduling error.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum TimeError {
    /// The value was NaN.
    #[error("time value is NaN")]
    NotANumber,
    /// The value (or delta) was negative.
    #[error("time value {value} is negative")]
    Negative {
        /// The rejected value.
        value: f64,
    },
}
