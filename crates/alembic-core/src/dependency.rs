//! Dependency tokens: "what a condition reads" / "what an action changes".

use std::fmt;

use crate::id::Molecule;

/// An opaque token naming a piece of state or a structural event.
///
/// Conditions declare inbound dependencies, actions declare outbound
/// ones. Two tokens [`intersect`](Dependency::intersects) when a change
/// described by one may be observed through the other.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// The concentration of one specific molecule.
    Molecule(Molecule),
    /// The concentration of any molecule.
    EveryMolecule,
    /// A node's position changed.
    Movement,
    /// A node gained a neighbor.
    NeighborAdded,
    /// A node lost a neighbor.
    NeighborRemoved,
    /// Wildcard: matches every other token.
    Everything,
}

impl Dependency {
    /// Whether a change announced by `self` may be observed by a reader
    /// that declared `other` (the relation is symmetric).
    ///
    /// # Examples
    ///
    /// ```
    /// use alembic_core::{Dependency, Molecule};
    ///
    /// let a = Dependency::Molecule(Molecule::new("A"));
    /// let b = Dependency::Molecule(Molecule::new("B"));
    /// assert!(!a.intersects(&b));
    /// assert!(a.intersects(&Dependency::EveryMolecule));
    /// assert!(Dependency::Everything.intersects(&Dependency::Movement));
    /// ```
    pub fn intersects(&self, other: &Dependency) -> bool {
        use Dependency::*;
        match (self, other) {
            (Everything, _) | (_, Everything) => true,
            (EveryMolecule, Molecule(_) | EveryMolecule) | (Molecule(_), EveryMolecule) => true,
            (a, b) => a == b,
        }
    }

    /// Whether any token of `changed` intersects any token of `read`.
    pub fn any_intersect(changed: &[Dependency], read: &[Dependency]) -> bool {
        changed
            .iter()
            .any(|c| read.iter().any(|r| c.intersects(r)))
    }

    /// Whether this token describes a structural (non-molecular) event.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Dependency::Movement | Dependency::NeighborAdded | Dependency::NeighborRemoved
        )
    }
}

impl From<Molecule> for Dependency {
    fn from(m: Molecule) -> Self {
        Dependency::Molecule(m)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Molecule(m) => write!(f, "molecule:{m}"),
            Self::EveryMolecule => write!(f, "molecule:*"),
            Self::Movement => write!(f, "movement"),
            Self::NeighborAdded => write!(f, "neighbor-added"),
            Self::NeighborRemoved => write!(f, "neighbor-removed"),
            Self::Everything => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(name: &str) -> Dependency {
        Dependency::Molecule(Molecule::new(name))
    }

    #[test]
    fn distinct_molecules_do_not_intersect() {
        assert!(!m("A").intersects(&m("B")));
        assert!(m("A").intersects(&m("A")));
    }

    #[test]
    fn every_molecule_does_not_cover_structure() {
        assert!(!Dependency::EveryMolecule.intersects(&Dependency::Movement));
        assert!(Dependency::EveryMolecule.intersects(&m("X")));
    }

    #[test]
    fn structural_tokens_are_distinct() {
        assert!(!Dependency::NeighborAdded.intersects(&Dependency::NeighborRemoved));
        assert!(Dependency::NeighborRemoved.is_structural());
        assert!(!m("A").is_structural());
    }

    #[test]
    fn any_intersect_empty_is_false() {
        assert!(!Dependency::any_intersect(&[], &[Dependency::Everything]));
        assert!(Dependency::any_intersect(&[m("A")], &[m("B"), m("A")]));
    }
}
