//! Owner of every reaction body, keyed by [`ReactionId`].

use alembic_core::{NodeId, ReactionId};
use alembic_model::Reaction;
use indexmap::IndexMap;

/// A reaction and the node it runs on.
#[derive(Debug)]
pub struct ReactionEntry {
    /// Host node.
    pub node: NodeId,
    /// The reaction itself.
    pub reaction: Reaction,
}

/// Reactions of a simulation, in insertion order.
#[derive(Debug, Default)]
pub struct ReactionStore {
    entries: IndexMap<ReactionId, ReactionEntry>,
    next_id: u64,
}

impl ReactionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `reaction` for `node` under a fresh id.
    pub fn insert(&mut self, node: NodeId, reaction: Reaction) -> ReactionId {
        let id = ReactionId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, ReactionEntry { node, reaction });
        id
    }

    /// Entry for `id`.
    pub fn get(&self, id: ReactionId) -> Option<&ReactionEntry> {
        self.entries.get(&id)
    }

    /// Entry for `id`, mutably.
    pub fn get_mut(&mut self, id: ReactionId) -> Option<&mut ReactionEntry> {
        self.entries.get_mut(&id)
    }

    /// Remove `id`.
    pub fn remove(&mut self, id: ReactionId) -> Option<ReactionEntry> {
        self.entries.shift_remove(&id)
    }

    /// Whether `id` is stored.
    pub fn contains(&self, id: ReactionId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of stored reactions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All ids, in insertion order.
    pub fn ids(&self) -> Vec<ReactionId> {
        self.entries.keys().copied().collect()
    }

    /// Iterate over `(id, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ReactionId, &ReactionEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }
}
