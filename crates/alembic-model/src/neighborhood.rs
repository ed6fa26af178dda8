//! Neighborhoods, the symmetric neighbor cache, and the topology change log.
//!
//! The cache is the single source of truth for "who is linked to whom".
//! Every edge is stored in both directions: [`NeighborCache::link`] and
//! [`NeighborCache::unlink`] always touch both endpoints, so the cache
//! stays symmetric regardless of the order in which edges are edited.

use alembic_core::NodeId;
use indexmap::{IndexMap, IndexSet};

/// The set of nodes linked to a center node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    center: NodeId,
    neighbors: IndexSet<NodeId>,
}

impl Neighborhood {
    /// An empty neighborhood around `center`.
    pub fn empty(center: NodeId) -> Self {
        Self {
            center,
            neighbors: IndexSet::new(),
        }
    }

    /// A neighborhood around `center`. `center` itself is never included.
    pub fn new(center: NodeId, neighbors: impl IntoIterator<Item = NodeId>) -> Self {
        let neighbors = neighbors.into_iter().filter(|n| *n != center).collect();
        Self { center, neighbors }
    }

    /// The node this neighborhood belongs to.
    pub fn center(&self) -> NodeId {
        self.center
    }

    /// Whether `node` is a neighbor.
    pub fn contains(&self, node: NodeId) -> bool {
        self.neighbors.contains(&node)
    }

    /// Number of neighbors.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether there are no neighbors.
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Iterate over the neighbors.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors.iter().copied()
    }

    fn insert(&mut self, node: NodeId) -> bool {
        node != self.center && self.neighbors.insert(node)
    }

    fn remove(&mut self, node: NodeId) -> bool {
        self.neighbors.shift_remove(&node)
    }
}

/// Symmetric adjacency for every live node.
#[derive(Clone, Debug, Default)]
pub struct NeighborCache {
    entries: IndexMap<NodeId, Neighborhood>,
}

impl NeighborCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `node` has an entry, possibly empty.
    pub fn ensure(&mut self, node: NodeId) {
        self.entries
            .entry(node)
            .or_insert_with(|| Neighborhood::empty(node));
    }

    /// Neighborhood of `node`, if it has an entry.
    pub fn get(&self, node: NodeId) -> Option<&Neighborhood> {
        self.entries.get(&node)
    }

    /// Copy of the neighbor ids of `node`, empty if it has no entry.
    pub fn neighbors_of(&self, node: NodeId) -> Vec<NodeId> {
        self.entries
            .get(&node)
            .map(|n| n.iter().collect())
            .unwrap_or_default()
    }

    /// Link `a` and `b` in both directions. Returns whether the edge is new.
    pub fn link(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        self.ensure(a);
        self.ensure(b);
        let fresh = self.entries.get_mut(&a).is_some_and(|n| n.insert(b));
        if let Some(n) = self.entries.get_mut(&b) {
            n.insert(a);
        }
        fresh
    }

    /// Remove the edge between `a` and `b` in both directions.
    /// Returns whether the edge existed.
    pub fn unlink(&mut self, a: NodeId, b: NodeId) -> bool {
        let existed = self.entries.get_mut(&a).is_some_and(|n| n.remove(b));
        if let Some(n) = self.entries.get_mut(&b) {
            n.remove(a);
        }
        existed
    }

    /// Drop `node` and every edge touching it. Returns its former neighbors.
    pub fn evict(&mut self, node: NodeId) -> Vec<NodeId> {
        let Some(former) = self.entries.shift_remove(&node) else {
            return Vec::new();
        };
        let former: Vec<NodeId> = former.iter().collect();
        for &other in &former {
            if let Some(n) = self.entries.get_mut(&other) {
                n.remove(node);
            }
        }
        former
    }

    /// Number of nodes with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all neighborhoods.
    pub fn iter(&self) -> impl Iterator<Item = &Neighborhood> {
        self.entries.values()
    }

    /// Whether every edge is stored in both directions.
    pub fn is_symmetric(&self) -> bool {
        self.entries.values().all(|hood| {
            hood.iter().all(|other| {
                self.entries
                    .get(&other)
                    .is_some_and(|back| back.contains(hood.center()))
            })
        })
    }
}

/// Pending structural changes since the last drain.
///
/// The environment appends to this log as nodes are added, removed or
/// moved and as edges appear or disappear. The engine drains it after
/// each step to decide which reactions to reschedule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopologyChanges {
    /// Nodes added to the environment.
    pub added_nodes: Vec<NodeId>,
    /// Nodes removed from the environment.
    pub removed_nodes: Vec<NodeId>,
    /// Nodes whose position changed.
    pub moved_nodes: Vec<NodeId>,
    /// Edges that appeared.
    pub linked: Vec<(NodeId, NodeId)>,
    /// Edges that disappeared.
    pub unlinked: Vec<(NodeId, NodeId)>,
}

impl TopologyChanges {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.moved_nodes.is_empty()
            && self.linked.is_empty()
            && self.unlinked.is_empty()
    }
}
