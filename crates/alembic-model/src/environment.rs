//! The environment: nodes, positions, neighborhoods and layers.
//!
//! All structural edits go through [`Environment`] so that the neighbor
//! cache and the [`TopologyChanges`] log stay in step with the node
//! store. Neighborhoods are recomputed by the installed
//! [`LinkingRule`]:
//!
//! - locally consistent rules: one recomputation for the touched node,
//!   with edges applied reciprocally;
//! - other rules: a worklist seeded with the touched node(s). Every node
//!   whose edge set changed is enqueued, each node is processed at most
//!   once per pass, and neighbor sets are copied before being edited.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use alembic_core::{Molecule, NodeId, Position, Time};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::TopologyError;
use crate::layer::Layer;
use crate::linking::{LinkingRule, NoLinks};
use crate::neighborhood::{NeighborCache, Neighborhood, TopologyChanges};
use crate::node::Node;

/// Position of every live node.
#[derive(Clone, Debug, Default)]
pub struct Positions {
    map: IndexMap<NodeId, Position>,
}

impl Positions {
    /// Position of `node`.
    pub fn get(&self, node: NodeId) -> Result<&Position, TopologyError> {
        self.map
            .get(&node)
            .ok_or(TopologyError::UnknownNode { node })
    }

    /// Whether `node` has a position.
    pub fn contains(&self, node: NodeId) -> bool {
        self.map.contains_key(&node)
    }

    /// Set the position of `node`, returning the previous one.
    pub fn insert(&mut self, node: NodeId, position: Position) -> Option<Position> {
        self.map.insert(node, position)
    }

    /// Remove `node`'s position.
    pub fn remove(&mut self, node: NodeId) -> Option<Position> {
        self.map.shift_remove(&node)
    }

    /// Iterate over `(node, position)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Position)> {
        self.map.iter().map(|(id, pos)| (*id, pos))
    }

    /// Number of positioned nodes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no node has a position.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The space the simulation runs in.
pub struct Environment {
    dimensions: usize,
    nodes: IndexMap<NodeId, Node>,
    positions: Positions,
    cache: NeighborCache,
    rule: Box<dyn LinkingRule>,
    layers: IndexMap<Molecule, Box<dyn Layer>>,
    next_node_id: AtomicU64,
    changes: TopologyChanges,
}

impl Environment {
    /// An empty `dimensions`-dimensional environment with no links.
    pub fn new(dimensions: usize) -> Self {
        Self::with_linking_rule(dimensions, NoLinks)
    }

    /// An empty environment using `rule` for neighborhoods.
    pub fn with_linking_rule(dimensions: usize, rule: impl LinkingRule) -> Self {
        Self {
            dimensions,
            nodes: IndexMap::new(),
            positions: Positions::default(),
            cache: NeighborCache::new(),
            rule: Box::new(rule),
            layers: IndexMap::new(),
            next_node_id: AtomicU64::new(0),
            changes: TopologyChanges::default(),
        }
    }

    /// Number of spatial dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Reserve a fresh node id. Safe to call from several threads.
    pub fn allocate_node_id(&self) -> NodeId {
        NodeId(self.next_node_id.fetch_add(1, Ordering::Relaxed))
    }

    /// An empty node with a freshly allocated id.
    pub fn create_node(&self) -> Node {
        Node::new(self.allocate_node_id())
    }

    /// Insert `node` at `position` and link it.
    pub fn add_node(&mut self, node: Node, position: Position) -> Result<NodeId, TopologyError> {
        let id = node.id();
        self.check_position(id, &position)?;
        if self.nodes.contains_key(&id) {
            return Err(TopologyError::DuplicateNode { node: id });
        }
        // Keep the counter ahead of externally chosen ids.
        self.next_node_id.fetch_max(id.0.saturating_add(1), Ordering::Relaxed);
        self.nodes.insert(id, node);
        self.positions.insert(id, position);
        self.cache.ensure(id);
        self.changes.added_nodes.push(id);
        debug!(node = %id, "node added");
        self.relink([id])?;
        Ok(id)
    }

    /// Remove `id` and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, TopologyError> {
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(TopologyError::UnknownNode { node: id })?;
        self.positions.remove(id);
        let former = self.cache.evict(id);
        for &other in &former {
            self.changes.unlinked.push((id, other));
        }
        self.changes.removed_nodes.push(id);
        debug!(node = %id, neighbors = former.len(), "node removed");
        if !self.rule.is_locally_consistent() {
            self.relink(former)?;
        }
        Ok(node)
    }

    /// Move `id` to `position` and update neighborhoods.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), TopologyError> {
        self.check_position(id, &position)?;
        if !self.nodes.contains_key(&id) {
            return Err(TopologyError::UnknownNode { node: id });
        }
        self.positions.insert(id, position);
        self.changes.moved_nodes.push(id);
        trace!(node = %id, "node moved");
        self.relink([id])
    }

    /// Move `id` by `offset`.
    pub fn move_node_by(&mut self, id: NodeId, offset: &[f64]) -> Result<(), TopologyError> {
        let target = self.positions.get(id)?.translated(offset);
        self.move_node(id, target)
    }

    /// Node `id`.
    pub fn node(&self, id: NodeId) -> Result<&Node, TopologyError> {
        self.nodes.get(&id).ok_or(TopologyError::UnknownNode { node: id })
    }

    /// Node `id`, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TopologyError> {
        self.nodes
            .get_mut(&id)
            .ok_or(TopologyError::UnknownNode { node: id })
    }

    /// Whether `id` is live.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Position of `id`.
    pub fn position(&self, id: NodeId) -> Result<&Position, TopologyError> {
        self.positions.get(id)
    }

    /// All positions.
    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    /// Cached neighborhood of `id`.
    pub fn neighborhood(&self, id: NodeId) -> Result<&Neighborhood, TopologyError> {
        if !self.nodes.contains_key(&id) {
            return Err(TopologyError::UnknownNode { node: id });
        }
        self.cache
            .get(id)
            .ok_or(TopologyError::MissingNeighborhood { node: id })
    }

    /// The neighbor cache.
    pub fn neighbor_cache(&self) -> &NeighborCache {
        &self.cache
    }

    /// The installed linking rule.
    pub fn linking_rule(&self) -> &dyn LinkingRule {
        self.rule.as_ref()
    }

    /// Replace the linking rule and rebuild every neighborhood.
    pub fn set_linking_rule(&mut self, rule: impl LinkingRule) -> Result<(), TopologyError> {
        debug!(rule = rule.name(), "linking rule replaced");
        self.rule = Box::new(rule);
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.relink_one(id)?;
        }
        Ok(())
    }

    /// Install `layer` for `molecule`, returning the previous one.
    pub fn add_layer(
        &mut self,
        molecule: impl Into<Molecule>,
        layer: impl Layer,
    ) -> Option<Box<dyn Layer>> {
        self.layers.insert(molecule.into(), Box::new(layer))
    }

    /// Layer for `molecule`, if any.
    pub fn layer(&self, molecule: &Molecule) -> Option<&dyn Layer> {
        self.layers.get(molecule).map(|l| l.as_ref())
    }

    /// Every installed layer, in installation order.
    pub fn layers(&self) -> impl Iterator<Item = (&Molecule, &dyn Layer)> {
        self.layers.iter().map(|(m, l)| (m, l.as_ref()))
    }

    /// Value of `molecule`'s layer at `position` and `time`.
    pub fn layer_value(&self, molecule: &Molecule, time: Time, position: &Position) -> Option<f64> {
        self.layer(molecule).map(|l| l.value(time, position))
    }

    /// Take the structural changes accumulated since the last call.
    pub fn take_changes(&mut self) -> TopologyChanges {
        std::mem::take(&mut self.changes)
    }

    /// Peek at the pending structural changes.
    pub fn pending_changes(&self) -> &TopologyChanges {
        &self.changes
    }

    fn check_position(&self, node: NodeId, position: &Position) -> Result<(), TopologyError> {
        if position.dimensions() != self.dimensions {
            return Err(TopologyError::DimensionMismatch {
                expected: self.dimensions,
                got: position.dimensions(),
            });
        }
        if !position.is_finite() {
            return Err(TopologyError::NonFinitePosition { node });
        }
        Ok(())
    }

    fn relink(&mut self, seeds: impl IntoIterator<Item = NodeId>) -> Result<(), TopologyError> {
        if self.rule.is_locally_consistent() {
            for id in seeds {
                self.relink_one(id)?;
            }
            return Ok(());
        }
        // A seed can change who is closest to any node it was or is linked
        // to, even when its own edge set stays the same. Seeds therefore
        // enqueue their old and new neighbors; other nodes only enqueue
        // the nodes whose edges they actually changed.
        let seeds: HashSet<NodeId> = seeds.into_iter().collect();
        let mut queue: VecDeque<NodeId> = {
            let mut ordered: Vec<NodeId> = seeds.iter().copied().collect();
            ordered.sort();
            ordered.into()
        };
        let mut processed = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !processed.insert(id) || !self.positions.contains(id) {
                continue;
            }
            let before = self.cache.neighbors_of(id);
            let touched = self.relink_one(id)?;
            let next: Vec<NodeId> = if seeds.contains(&id) {
                before
                    .into_iter()
                    .chain(self.cache.neighbors_of(id))
                    .collect()
            } else {
                touched
            };
            queue.extend(next.into_iter().filter(|n| !processed.contains(n)));
        }
        trace!(processed = processed.len(), "neighborhood propagation settled");
        Ok(())
    }

    /// Recompute one neighborhood and apply the diff reciprocally.
    /// Returns every node that gained or lost an edge to `id`.
    fn relink_one(&mut self, id: NodeId) -> Result<Vec<NodeId>, TopologyError> {
        let fresh = self.rule.compute_neighborhood(id, &self.positions)?;
        let old = self.cache.neighbors_of(id);
        let mut touched = Vec::new();
        for other in fresh.iter() {
            if self.cache.link(id, other) {
                self.changes.linked.push((id, other));
                touched.push(other);
            }
        }
        for other in old {
            if !fresh.contains(other) && self.cache.unlink(id, other) {
                self.changes.unlinked.push((id, other));
                touched.push(other);
            }
        }
        Ok(touched)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("dimensions", &self.dimensions)
            .field("nodes", &self.nodes.len())
            .field("rule", &self.rule.name())
            .field("layers", &self.layers.len())
            .finish_non_exhaustive()
    }
}
