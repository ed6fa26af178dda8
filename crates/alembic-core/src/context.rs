//! Locality bound of a reaction's read or write footprint.

use std::fmt;

/// How far the effects (or the inputs) of a condition, action or
/// reaction may reach.
///
/// Totally ordered: `Local < Neighborhood < Global`.
///
/// # Examples
///
/// ```
/// use alembic_core::Context;
///
/// assert_eq!(Context::Local.wider(Context::Neighborhood), Context::Neighborhood);
/// assert_eq!(Context::widest([Context::Local, Context::Global]), Context::Global);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Context {
    /// Only the owning node.
    #[default]
    Local,
    /// The owning node and its current neighbors.
    Neighborhood,
    /// Anything in the environment.
    Global,
}

impl Context {
    /// The more permissive of the two contexts.
    pub fn wider(self, other: Context) -> Context {
        self.max(other)
    }

    /// The most permissive context of a collection; `Local` if empty.
    pub fn widest(contexts: impl IntoIterator<Item = Context>) -> Context {
        contexts.into_iter().fold(Context::Local, Context::wider)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Neighborhood => write!(f, "neighborhood"),
            Self::Global => write!(f, "global"),
        }
    }
}
