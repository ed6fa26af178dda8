//! Nodes: molecule concentrations plus the ids of the reactions they host.

use alembic_core::{Concentration, Molecule, NodeId, ReactionId};
use indexmap::IndexMap;

/// A site in the environment.
///
/// A node owns its molecule concentrations. The reactions attached to it
/// are stored by the engine and referenced here by [`ReactionId`], so
/// that node state and reaction state can be borrowed independently.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    contents: IndexMap<Molecule, Concentration>,
    reactions: Vec<ReactionId>,
}

impl Node {
    /// Create an empty node with the given id.
    ///
    /// Ids normally come from [`Environment::allocate_node_id`](crate::Environment::allocate_node_id).
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            contents: IndexMap::new(),
            reactions: Vec::new(),
        }
    }

    /// Builder-style concentration setter.
    pub fn with_concentration(mut self, molecule: impl Into<Molecule>, value: Concentration) -> Self {
        self.set_concentration(molecule.into(), value);
        self
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Concentration of `molecule`, if present.
    pub fn concentration(&self, molecule: &Molecule) -> Option<Concentration> {
        self.contents.get(molecule).copied()
    }

    /// Whether `molecule` is present on this node.
    pub fn contains(&self, molecule: &Molecule) -> bool {
        self.contents.contains_key(molecule)
    }

    /// Set the concentration of `molecule`, returning the previous value.
    pub fn set_concentration(&mut self, molecule: Molecule, value: Concentration) -> Option<Concentration> {
        self.contents.insert(molecule, value)
    }

    /// Remove `molecule`, returning its last concentration.
    pub fn remove_concentration(&mut self, molecule: &Molecule) -> Option<Concentration> {
        self.contents.shift_remove(molecule)
    }

    /// Iterate over `(molecule, concentration)` pairs in insertion order.
    pub fn contents(&self) -> impl Iterator<Item = (&Molecule, Concentration)> {
        self.contents.iter().map(|(m, c)| (m, *c))
    }

    /// Number of distinct molecules on this node.
    pub fn molecule_count(&self) -> usize {
        self.contents.len()
    }

    /// Ids of the reactions hosted by this node, in attachment order.
    pub fn reactions(&self) -> &[ReactionId] {
        &self.reactions
    }

    /// Record that `reaction` runs on this node.
    pub fn attach_reaction(&mut self, reaction: ReactionId) {
        if !self.reactions.contains(&reaction) {
            self.reactions.push(reaction);
        }
    }

    /// Forget `reaction`. Returns whether it was attached.
    pub fn detach_reaction(&mut self, reaction: ReactionId) -> bool {
        let before = self.reactions.len();
        self.reactions.retain(|r| *r != reaction);
        before != self.reactions.len()
    }

    /// Copy of this node's contents under a new id, with no reactions.
    pub fn clone_contents(&self, id: NodeId) -> Node {
        Node {
            id,
            contents: self.contents.clone(),
            reactions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concentrations_round_trip() {
        let a = Molecule::new("a");
        let mut node = Node::new(NodeId(1)).with_concentration("a", 2.0);
        assert_eq!(node.concentration(&a), Some(2.0));
        assert_eq!(node.set_concentration(a.clone(), 3.0), Some(2.0));
        assert_eq!(node.remove_concentration(&a), Some(3.0));
        assert!(!node.contains(&a));
    }

    #[test]
    fn attach_is_idempotent() {
        let mut node = Node::new(NodeId(1));
        node.attach_reaction(ReactionId(7));
        node.attach_reaction(ReactionId(7));
        assert_eq!(node.reactions(), &[ReactionId(7)]);
        assert!(node.detach_reaction(ReactionId(7)));
        assert!(!node.detach_reaction(ReactionId(7)));
    }

    #[test]
    fn clone_contents_drops_reactions() {
        let mut node = Node::new(NodeId(1)).with_concentration("a", 1.0);
        node.attach_reaction(ReactionId(0));
        let copy = node.clone_contents(NodeId(2));
        assert_eq!(copy.id(), NodeId(2));
        assert_eq!(copy.concentration(&Molecule::new("a")), Some(1.0));
        assert!(copy.reactions().is_empty());
    }
}
