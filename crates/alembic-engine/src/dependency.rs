//! Dependency graph: which reactions must be rescheduled after one fires.
//!
//! Candidates are bounded by the firing reaction's output [`Context`]:
//!
//! | output         | candidates                                                          |
//! |----------------|---------------------------------------------------------------------|
//! | `Local`        | own node; neighbors' reactions with `Neighborhood` input            |
//! | `Neighborhood` | own node; neighbors; neighbors-of-neighbors with `Neighborhood` input |
//! | `Global`       | every reaction                                                      |
//!
//! Reactions with `Global` input are always candidates. A candidate is
//! invalidated only if the firing reaction's outbound dependencies
//! intersect the candidate's inbound ones.
//!
//! Structural changes reported by the environment are mapped onto the
//! [`Dependency::NeighborAdded`], [`Dependency::NeighborRemoved`] and
//! [`Dependency::Movement`] tokens and dispatched the same way.

use alembic_core::{Context, Dependency, NodeId, ReactionId};
use alembic_model::{Environment, Reaction, TopologyChanges};
use indexmap::{IndexMap, IndexSet};

#[derive(Clone, Debug)]
struct Footprint {
    node: NodeId,
    inbound: Vec<Dependency>,
    outbound: Vec<Dependency>,
    input: Context,
    output: Context,
}

/// Read/write footprints of every scheduled reaction.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    footprints: IndexMap<ReactionId, Footprint>,
    by_node: IndexMap<NodeId, Vec<ReactionId>>,
    global_readers: IndexSet<ReactionId>,
}

impl DependencyGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `reaction`, hosted on `node`.
    pub fn add(&mut self, id: ReactionId, node: NodeId, reaction: &Reaction) {
        let footprint = Footprint {
            node,
            inbound: reaction.inbound().to_vec(),
            outbound: reaction.outbound().to_vec(),
            input: reaction.input_context(),
            output: reaction.output_context(),
        };
        if footprint.input == Context::Global {
            self.global_readers.insert(id);
        }
        self.by_node.entry(node).or_default().push(id);
        self.footprints.insert(id, footprint);
    }

    /// Forget `id`.
    pub fn remove(&mut self, id: ReactionId) {
        let Some(footprint) = self.footprints.shift_remove(&id) else {
            return;
        };
        self.global_readers.shift_remove(&id);
        if let Some(ids) = self.by_node.get_mut(&footprint.node) {
            ids.retain(|r| *r != id);
            if ids.is_empty() {
                self.by_node.shift_remove(&footprint.node);
            }
        }
    }

    /// Number of registered reactions.
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    /// Whether no reaction is registered.
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Reactions on `node`.
    pub fn reactions_on(&self, node: NodeId) -> &[ReactionId] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reactions to reschedule after `source` fired, in a deterministic
    /// order. Never includes `source` itself.
    pub fn invalidated_by(&self, source: ReactionId, env: &Environment) -> Vec<ReactionId> {
        let Some(fired) = self.footprints.get(&source) else {
            return Vec::new();
        };
        if fired.outbound.is_empty() {
            return Vec::new();
        }
        let mut candidates: IndexSet<ReactionId> = IndexSet::new();
        match fired.output {
            Context::Global => candidates.extend(self.footprints.keys().copied()),
            Context::Neighborhood => {
                candidates.extend(self.reactions_on(fired.node).iter().copied());
                for n in self.neighbors(fired.node, env) {
                    candidates.extend(self.reactions_on(n).iter().copied());
                    for m in self.neighbors(n, env) {
                        self.extend_neighborhood_readers(&mut candidates, m);
                    }
                }
            }
            Context::Local => {
                candidates.extend(self.reactions_on(fired.node).iter().copied());
                for n in self.neighbors(fired.node, env) {
                    self.extend_neighborhood_readers(&mut candidates, n);
                }
            }
        }
        candidates.extend(self.global_readers.iter().copied());
        candidates.shift_remove(&source);
        self.filter_readers(candidates, &fired.outbound)
    }

    /// Reactions to reschedule because of structural changes.
    pub fn affected_by_topology(
        &self,
        changes: &TopologyChanges,
        env: &Environment,
    ) -> Vec<ReactionId> {
        let mut out: IndexSet<ReactionId> = IndexSet::new();
        let added = [Dependency::NeighborAdded];
        let removed = [Dependency::NeighborRemoved];
        let moved = [Dependency::Movement];

        for &(a, b) in &changes.linked {
            self.signal_edge(&mut out, a, &added);
            self.signal_edge(&mut out, b, &added);
        }
        for &(a, b) in &changes.unlinked {
            self.signal_edge(&mut out, a, &removed);
            self.signal_edge(&mut out, b, &removed);
        }
        for &node in &changes.moved_nodes {
            out.extend(self.readers_on(node, &moved, |_| true));
            for n in self.neighbors(node, env) {
                out.extend(self.readers_on(n, &moved, |f| f.input >= Context::Neighborhood));
            }
            out.extend(self.global_readers_of(&moved));
        }
        if !changes.added_nodes.is_empty() {
            out.extend(self.global_readers_of(&[Dependency::EveryMolecule, Dependency::NeighborAdded]));
        }
        if !changes.removed_nodes.is_empty() {
            out.extend(
                self.global_readers_of(&[Dependency::EveryMolecule, Dependency::NeighborRemoved]),
            );
        }
        out.into_iter().collect()
    }

    fn signal_edge(&self, out: &mut IndexSet<ReactionId>, node: NodeId, tokens: &[Dependency]) {
        out.extend(self.readers_on(node, tokens, |f| f.input >= Context::Neighborhood));
        out.extend(self.global_readers_of(tokens));
    }

    fn readers_on<'a>(
        &'a self,
        node: NodeId,
        tokens: &'a [Dependency],
        accept: impl Fn(&Footprint) -> bool + 'a,
    ) -> impl Iterator<Item = ReactionId> + 'a {
        self.reactions_on(node).iter().copied().filter(move |id| {
            self.footprints
                .get(id)
                .is_some_and(|f| accept(f) && Dependency::any_intersect(tokens, &f.inbound))
        })
    }

    fn global_readers_of<'a>(
        &'a self,
        tokens: &'a [Dependency],
    ) -> impl Iterator<Item = ReactionId> + 'a {
        self.global_readers.iter().copied().filter(move |id| {
            self.footprints
                .get(id)
                .is_some_and(|f| Dependency::any_intersect(tokens, &f.inbound))
        })
    }

    fn extend_neighborhood_readers(&self, candidates: &mut IndexSet<ReactionId>, node: NodeId) {
        candidates.extend(self.reactions_on(node).iter().copied().filter(|id| {
            self.footprints
                .get(id)
                .is_some_and(|f| f.input >= Context::Neighborhood)
        }));
    }

    fn filter_readers(
        &self,
        candidates: IndexSet<ReactionId>,
        written: &[Dependency],
    ) -> Vec<ReactionId> {
        candidates
            .into_iter()
            .filter(|id| {
                self.footprints
                    .get(id)
                    .is_some_and(|f| Dependency::any_intersect(written, &f.inbound))
            })
            .collect()
    }

    /// Neighbors of `node`, or none if it has left the environment.
    fn neighbors(&self, node: NodeId, env: &Environment) -> Vec<NodeId> {
        env.neighborhood(node)
            .map(|hood| hood.iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alembic_core::{Molecule, Position};
    use alembic_model::{ConnectWithinDistance, DiracComb};
    use alembic_test_utils::{ChangeConcentration, ConcentrationCondition, NeighborhoodCondition};

    fn comb() -> DiracComb {
        DiracComb::new(1.0).unwrap()
    }

    fn line(n: usize) -> (Environment, Vec<NodeId>) {
        let mut env = Environment::with_linking_rule(1, ConnectWithinDistance::new(1.0));
        let ids = (0..n)
            .map(|i| {
                let node = env.create_node();
                env.add_node(node, Position::from([i as f64])).unwrap()
            })
            .collect();
        (env, ids)
    }

    fn writer(molecule: &str, context: Context) -> Reaction {
        Reaction::new(comb()).with_action(ChangeConcentration::new(molecule, 1.0).in_context(context))
    }

    fn reader(molecule: &str, context: Context) -> Reaction {
        Reaction::new(comb())
            .with_condition(ConcentrationCondition::at_least(molecule, 0.0).in_context(context))
    }

    #[test]
    fn local_writer_hits_only_matching_local_readers() {
        let (env, nodes) = line(3);
        let mut graph = DependencyGraph::new();
        graph.add(ReactionId(0), nodes[0], &writer("a", Context::Local));
        graph.add(ReactionId(1), nodes[0], &reader("a", Context::Local));
        graph.add(ReactionId(2), nodes[0], &reader("b", Context::Local));
        graph.add(ReactionId(3), nodes[1], &reader("a", Context::Local));
        graph.add(ReactionId(4), nodes[1], &reader("a", Context::Neighborhood));
        graph.add(ReactionId(5), nodes[2], &reader("a", Context::Global));
        assert_eq!(
            graph.invalidated_by(ReactionId(0), &env),
            vec![ReactionId(1), ReactionId(4), ReactionId(5)]
        );
    }

    #[test]
    fn neighborhood_writer_reaches_two_hops_for_neighborhood_readers() {
        let (env, nodes) = line(4);
        let mut graph = DependencyGraph::new();
        graph.add(ReactionId(0), nodes[0], &writer("a", Context::Neighborhood));
        graph.add(ReactionId(1), nodes[1], &reader("a", Context::Local));
        graph.add(ReactionId(2), nodes[2], &reader("a", Context::Local));
        graph.add(ReactionId(3), nodes[2], &reader("a", Context::Neighborhood));
        graph.add(ReactionId(4), nodes[3], &reader("a", Context::Neighborhood));
        assert_eq!(
            graph.invalidated_by(ReactionId(0), &env),
            vec![ReactionId(1), ReactionId(3)]
        );
    }

    #[test]
    fn global_writer_hits_everyone_who_reads_it() {
        let (env, nodes) = line(4);
        let mut graph = DependencyGraph::new();
        graph.add(ReactionId(0), nodes[0], &writer("a", Context::Global));
        graph.add(ReactionId(1), nodes[3], &reader("a", Context::Local));
        graph.add(ReactionId(2), nodes[3], &reader("z", Context::Local));
        assert_eq!(graph.invalidated_by(ReactionId(0), &env), vec![ReactionId(1)]);
    }

    #[test]
    fn removal_forgets_reaction() {
        let (env, nodes) = line(1);
        let mut graph = DependencyGraph::new();
        graph.add(ReactionId(0), nodes[0], &writer("a", Context::Local));
        graph.add(ReactionId(1), nodes[0], &reader("a", Context::Global));
        graph.remove(ReactionId(1));
        assert!(graph.invalidated_by(ReactionId(0), &env).is_empty());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn edge_changes_signal_neighborhood_readers() {
        let (mut env, nodes) = line(2);
        env.take_changes();
        let mut graph = DependencyGraph::new();
        graph.add(ReactionId(0), nodes[0], &Reaction::new(comb()).with_condition(NeighborhoodCondition::new(1)));
        graph.add(ReactionId(1), nodes[1], &Reaction::new(comb()).with_condition(NeighborhoodCondition::new(1)));
        graph.add(ReactionId(2), nodes[1], &reader("a", Context::Local));
        env.move_node(nodes[1], Position::from([5.0])).unwrap();
        let changes = env.take_changes();
        assert_eq!(
            graph.affected_by_topology(&changes, &env),
            vec![ReactionId(1), ReactionId(0)]
        );
    }

    #[test]
    fn edge_changes_signal_neighborhood_concentration_readers() {
        let (mut env, nodes) = line(2);
        env.take_changes();
        let mut graph = DependencyGraph::new();
        graph.add(ReactionId(0), nodes[0], &reader("a", Context::Neighborhood));
        graph.add(ReactionId(1), nodes[0], &reader("a", Context::Local));
        env.move_node(nodes[1], Position::from([5.0])).unwrap();
        let changes = env.take_changes();
        assert_eq!(graph.affected_by_topology(&changes, &env), vec![ReactionId(0)]);
    }

    #[test]
    fn concentration_reader_ignores_unrelated_molecule() {
        let read = [Dependency::Molecule(Molecule::new("a"))];
        assert!(!Dependency::any_intersect(&[Dependency::Molecule(Molecule::new("b"))], &read));
    }
}
