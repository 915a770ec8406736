use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::solver::arc::PropagationArc;
use crate::solver::choicepoint::{ChoicePointEntry, ChoicePointStack};
use crate::solver::domain::{ChangeKind, DomainSnapshot};
use crate::solver::node::{ArcId, Node, NodeId, NodeStore, StackToken};

/// A structural addition recorded for later rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphDelta {
    NodeAdded(NodeId),
    ArcAdded(ArcId),
    Connected {
        node: NodeId,
        kind: ChangeKind,
        arc: ArcId,
    },
}

/// Per-node dependency indices, one fixed field per [`ChangeKind`].
#[derive(Debug, Default, Clone)]
struct DependencyIndex {
    value: BTreeSet<ArcId>,
    range: BTreeSet<ArcId>,
    domain: BTreeSet<ArcId>,
}

impl DependencyIndex {
    fn for_kind(&self, kind: ChangeKind) -> &BTreeSet<ArcId> {
        match kind {
            ChangeKind::Value => &self.value,
            ChangeKind::Range => &self.range,
            ChangeKind::Domain => &self.domain,
        }
    }

    fn for_kind_mut(&mut self, kind: ChangeKind) -> &mut BTreeSet<ArcId> {
        match kind {
            ChangeKind::Value => &mut self.value,
            ChangeKind::Range => &mut self.range,
            ChangeKind::Domain => &mut self.domain,
        }
    }
}

/// Full structural + domain capture of a graph, for whole-store
/// checkpoints outside the choicepoint mechanism.
#[derive(Debug, Clone)]
pub struct GraphState {
    domains: BTreeMap<NodeId, DomainSnapshot>,
    arcs: BTreeSet<ArcId>,
}

/// Owns the node set, the arc set, and the dependency indices that tell the
/// propagation engine which arcs a given node change re-triggers.
///
/// Graph growth during search is purely additive; every addition made while
/// a choicepoint frame is open is recorded there, and popping the frame
/// undoes exactly those additions in reverse order.
///
/// Invariant (graph closure): every arc's source and target nodes are
/// members of the node set for as long as the arc is.
#[derive(Debug, Default)]
pub struct NodeArcGraph {
    nodes: NodeStore,
    arcs: BTreeMap<ArcId, Box<dyn PropagationArc>>,
    indices: BTreeMap<NodeId, DependencyIndex>,
    names: BTreeMap<String, NodeId>,
    stack_token: Option<StackToken>,
    /// Arcs posted since the engine last seeded its queue.
    newly_posted: Vec<ArcId>,
    next_arc: u32,
}

impl NodeArcGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds this graph (and every node added to it) to a choicepoint
    /// stack. Set-once, like the per-node guard.
    ///
    /// # Panics
    ///
    /// Panics when already bound to a different stack.
    pub fn set_choice_point_stack(&mut self, token: StackToken) {
        match self.stack_token {
            None => {
                self.stack_token = Some(token);
                for node in self.nodes.iter_mut() {
                    node.bind_stack(token);
                }
            }
            Some(held) if held == token => {}
            Some(held) => panic!(
                "graph already bound to choicepoint stack {held:?}, refusing {token:?}"
            ),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_arc(&self, id: ArcId) -> bool {
        self.arcs.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.names.get(name).map(|id| self.nodes.get(*id))
    }

    pub fn arc(&self, id: ArcId) -> &dyn PropagationArc {
        self.arcs
            .get(&id)
            .map(|b| b.as_ref())
            .unwrap_or_else(|| panic!("arc {id} is not in the graph"))
    }

    pub fn arc_ids(&self) -> impl Iterator<Item = ArcId> + '_ {
        self.arcs.keys().copied()
    }

    pub fn complexity(&self, id: ArcId) -> u32 {
        self.arc(id).complexity()
    }

    pub(crate) fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut NodeStore {
        &mut self.nodes
    }

    /// Split borrow for the propagation loop: the arc under evaluation and
    /// mutable access to every node it may narrow.
    pub(crate) fn arc_and_nodes_mut(&mut self, id: ArcId) -> (&dyn PropagationArc, &mut NodeStore) {
        let NodeArcGraph { nodes, arcs, .. } = self;
        let arc = arcs
            .get(&id)
            .map(|b| b.as_ref())
            .unwrap_or_else(|| panic!("arc {id} is not in the graph"));
        (arc, nodes)
    }

    /// Adds a node. A no-op when the node (by id) is already present.
    /// Binds the node to the graph's stack when one is set, and records the
    /// addition in the current choicepoint frame.
    ///
    /// # Panics
    ///
    /// Panics when a different node already holds the same name.
    pub fn add_node(&mut self, mut node: Node, cps: &mut ChoicePointStack) -> NodeId {
        let id = node.id();
        if self.nodes.contains(id) {
            return id;
        }
        if let Some(existing) = self.names.get(node.name()) {
            panic!(
                "node name {:?} already taken by {existing}, refusing {id}",
                node.name()
            );
        }
        if let Some(token) = self.stack_token {
            node.bind_stack(token);
        }
        node.added_to_graph();
        trace!(node = %id, name = node.name(), "node added to graph");
        let _ = self.names.insert(node.name().to_owned(), id);
        self.nodes.insert(node);
        let _ = self.indices.insert(id, DependencyIndex::default());
        cps.record(ChoicePointEntry::Graph(GraphDelta::NodeAdded(id)));
        id
    }

    /// Posts an arc: allocates its identity, connects each source node into
    /// the index matching its declared dependency, records the structural
    /// deltas, and queues the arc for the engine's "just appeared" seeding.
    ///
    /// # Panics
    ///
    /// Panics if any endpoint node is missing (graph closure); endpoints
    /// are added when variables are created, so a missing one means the arc
    /// was built against the wrong store.
    pub fn add_arc(&mut self, arc: Box<dyn PropagationArc>, cps: &mut ChoicePointStack) -> ArcId {
        let id = ArcId(self.next_arc);
        self.next_arc += 1;

        for endpoint in arc.sources().iter().chain(arc.targets()) {
            assert!(
                self.nodes.contains(*endpoint),
                "arc {id} references node {endpoint} which is not in the graph"
            );
        }

        cps.record(ChoicePointEntry::Graph(GraphDelta::ArcAdded(id)));
        for source in arc.sources() {
            let kind = arc.source_dependency(*source);
            let index = self
                .indices
                .get_mut(source)
                .expect("endpoint presence checked above");
            if index.for_kind_mut(kind).insert(id) {
                cps.record(ChoicePointEntry::Graph(GraphDelta::Connected {
                    node: *source,
                    kind,
                    arc: id,
                }));
            }
        }
        trace!(arc = %id, kind = ?arc.arc_type(), "arc posted to graph");
        let _ = self.arcs.insert(id, arc);
        self.newly_posted.push(id);
        id
    }

    /// Arcs declared value-dependent on `node`.
    pub fn value_source_arcs(&self, node: NodeId) -> &BTreeSet<ArcId> {
        self.index(node).for_kind(ChangeKind::Value)
    }

    /// Arcs declared range-dependent on `node`.
    pub fn range_source_arcs(&self, node: NodeId) -> &BTreeSet<ArcId> {
        self.index(node).for_kind(ChangeKind::Range)
    }

    /// Arcs declared domain-dependent on `node`.
    pub fn domain_source_arcs(&self, node: NodeId) -> &BTreeSet<ArcId> {
        self.index(node).for_kind(ChangeKind::Domain)
    }

    /// Every arc that a change of strength `kind` on `node` re-triggers:
    /// all arcs whose declared dependency is `<=` the event's strength.
    pub fn dependent_arcs(&self, node: NodeId, kind: ChangeKind) -> Vec<ArcId> {
        let index = self.index(node);
        let mut out: Vec<ArcId> = index.value.iter().copied().collect();
        if kind >= ChangeKind::Range {
            out.extend(index.range.iter().copied());
        }
        if kind >= ChangeKind::Domain {
            out.extend(index.domain.iter().copied());
        }
        out
    }

    /// Undoes one recorded structural delta. Returns the arc id when the
    /// delta removed an arc, so the caller can purge pending queue work.
    pub(crate) fn undo(&mut self, delta: GraphDelta) -> Option<ArcId> {
        match delta {
            GraphDelta::Connected { node, kind, arc } => {
                if let Some(index) = self.indices.get_mut(&node) {
                    let _ = index.for_kind_mut(kind).remove(&arc);
                }
                None
            }
            GraphDelta::ArcAdded(id) => {
                let _ = self.arcs.remove(&id);
                self.newly_posted.retain(|a| *a != id);
                trace!(arc = %id, "arc rolled back out of graph");
                Some(id)
            }
            GraphDelta::NodeAdded(id) => {
                if let Some(mut node) = self.nodes.remove(id) {
                    node.removed_from_graph();
                    let _ = self.names.remove(node.name());
                }
                let _ = self.indices.remove(&id);
                trace!(node = %id, "node rolled back out of graph");
                None
            }
        }
    }

    /// Arcs posted since the last call, for seeding the engine's queue.
    pub(crate) fn take_newly_posted(&mut self) -> Vec<ArcId> {
        std::mem::take(&mut self.newly_posted)
    }

    /// Full structural + domain capture, independent of the choicepoint
    /// frames.
    pub fn graph_state(&self) -> GraphState {
        GraphState {
            domains: self
                .nodes
                .iter()
                .map(|n| (n.id(), n.domain().snapshot()))
                .collect(),
            arcs: self.arcs.keys().copied().collect(),
        }
    }

    /// Restores a capture taken from this graph: nodes and arcs added since
    /// are removed, surviving domains are reinstated, and the dependency
    /// indices are rebuilt.
    pub fn restore_graph_state(&mut self, state: &GraphState) {
        let doomed_arcs: Vec<ArcId> = self
            .arcs
            .keys()
            .filter(|id| !state.arcs.contains(id))
            .copied()
            .collect();
        for id in doomed_arcs {
            let _ = self.arcs.remove(&id);
        }
        let surviving = &self.arcs;
        self.newly_posted.retain(|id| surviving.contains_key(id));

        let doomed_nodes: Vec<NodeId> = self
            .nodes
            .ids()
            .filter(|id| !state.domains.contains_key(id))
            .collect();
        for id in doomed_nodes {
            if let Some(mut node) = self.nodes.remove(id) {
                node.removed_from_graph();
                let _ = self.names.remove(node.name());
            }
            let _ = self.indices.remove(&id);
        }

        for node in self.nodes.iter_mut() {
            let snapshot = state
                .domains
                .get(&node.id())
                .expect("surviving nodes all have snapshots")
                .clone();
            node.domain_mut().restore(snapshot);
            node.set_saved_in_frame(None);
        }

        self.rebuild_indices();
    }

    fn rebuild_indices(&mut self) {
        for index in self.indices.values_mut() {
            *index = DependencyIndex::default();
        }
        for (id, arc) in &self.arcs {
            for source in arc.sources() {
                let kind = arc.source_dependency(*source);
                let _ = self
                    .indices
                    .get_mut(source)
                    .expect("graph closure")
                    .for_kind_mut(kind)
                    .insert(*id);
            }
        }
    }

    fn index(&self, node: NodeId) -> &DependencyIndex {
        self.indices
            .get(&node)
            .unwrap_or_else(|| panic!("node {node} is not in the graph"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::arcs::not_equal::NotEqualArc;
    use crate::solver::domain::{IntDomain, VariableDomain};
    use crate::solver::node::IdSource;

    fn fixture() -> (NodeArcGraph, ChoicePointStack, NodeId, NodeId) {
        let mut ids = IdSource::new();
        let mut cps = ChoicePointStack::new(ids.next_stack_token());
        let mut graph = NodeArcGraph::new();
        graph.set_choice_point_stack(cps.token());

        let a = ids.next_node_id();
        let b = ids.next_node_id();
        let _ = graph.add_node(
            Node::new(a, "a", VariableDomain::Int(IntDomain::new(1, 4))),
            &mut cps,
        );
        let _ = graph.add_node(
            Node::new(b, "b", VariableDomain::Int(IntDomain::new(1, 4))),
            &mut cps,
        );
        (graph, cps, a, b)
    }

    #[test]
    fn add_node_is_idempotent_and_binds_stack() {
        let (mut graph, mut cps, a, _) = fixture();
        assert_eq!(graph.node_count(), 2);
        assert!(graph.node(a).in_graph());
        assert_eq!(graph.node(a).bound_stack(), Some(cps.token()));

        let again = Node::new(a, "a", VariableDomain::Int(IntDomain::new(1, 4)));
        let _ = graph.add_node(again, &mut cps);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    #[should_panic(expected = "already taken")]
    fn duplicate_names_are_rejected() {
        let (mut graph, mut cps, _, _) = fixture();
        let clash = Node::new(NodeId(9), "a", VariableDomain::Int(IntDomain::new(0, 1)));
        let _ = graph.add_node(clash, &mut cps);
    }

    #[test]
    fn add_arc_connects_sources_into_declared_index() {
        let (mut graph, mut cps, a, b) = fixture();
        let id = graph.add_arc(Box::new(NotEqualArc::new(a, b)), &mut cps);

        assert!(graph.contains_arc(id));
        assert!(graph.range_source_arcs(a).contains(&id));
        assert!(graph.value_source_arcs(a).is_empty());
        assert!(graph.range_source_arcs(b).is_empty());
    }

    #[test]
    fn dependent_arcs_follow_the_strength_lattice() {
        let (mut graph, mut cps, a, b) = fixture();
        let id = graph.add_arc(Box::new(NotEqualArc::new(a, b)), &mut cps);

        // NotEqualArc declares a Range dependency on its source.
        assert!(graph.dependent_arcs(a, ChangeKind::Value).is_empty());
        assert_eq!(graph.dependent_arcs(a, ChangeKind::Range), vec![id]);
        assert_eq!(graph.dependent_arcs(a, ChangeKind::Domain), vec![id]);
    }

    #[test]
    fn graph_state_restore_removes_later_structure() {
        let (mut graph, mut cps, a, b) = fixture();
        let state = graph.graph_state();

        let arc = graph.add_arc(Box::new(NotEqualArc::new(a, b)), &mut cps);
        let mut ids = IdSource::new();
        let _ = ids.next_node_id();
        let _ = ids.next_node_id();
        let c = ids.next_node_id();
        let _ = graph.add_node(
            Node::new(c, "c", VariableDomain::Int(IntDomain::new(0, 5))),
            &mut cps,
        );
        graph
            .nodes_mut()
            .get_mut(a)
            .domain_mut()
            .int_mut()
            .set_min(3)
            .unwrap();

        graph.restore_graph_state(&state);
        assert!(!graph.contains_arc(arc));
        assert!(!graph.contains_node(c));
        assert_eq!(graph.node(a).domain().int().min(), 1);
        assert!(graph.range_source_arcs(a).is_empty());
    }
}
