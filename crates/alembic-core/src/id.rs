//! Strongly-typed identifiers.

use std::fmt;
use std::sync::Arc;

/// Identifies a node within one environment.
///
/// Ids are assigned by the environment's monotonic counter and are
/// never reused, even after the node is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a reaction within one simulation.
///
/// Assigned in insertion order; also the scheduler's tie-break for
/// reactions scheduled at the same instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionId(pub u64);

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<u64> for ReactionId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Handle returned when registering an output monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorId(pub u64);

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// The amount of a molecule stored in a node.
pub type Concentration = f64;

/// Key of a node's concentration store.
///
/// Cheap to clone (reference-counted name). Two molecules are equal iff
/// their names are equal.
///
/// # Examples
///
/// ```
/// use alembic_core::Molecule;
///
/// let a = Molecule::new("A");
/// assert_eq!(a, Molecule::from("A"));
/// assert_eq!(a.name(), "A");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Molecule(Arc<str>);

impl Molecule {
    /// Create a molecule key from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The molecule name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Molecule {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
