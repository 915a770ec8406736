use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::solver::domain::{ChangeKind, VariableDomain};

/// Identity of a node in the graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identity of an arc in the graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ArcId(pub u32);

impl std::fmt::Display for ArcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// Identity of a choicepoint stack, used for the set-once binding guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackToken(pub u32);

/// Explicit id allocator, one per problem.
///
/// Passing this around instead of consulting a process-wide registry keeps
/// independent stores isolated and lets tests run in parallel.
#[derive(Debug, Default)]
pub struct IdSource {
    next_node: u32,
    next_stack: u32,
}

impl IdSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub fn next_stack_token(&mut self) -> StackToken {
        let token = StackToken(self.next_stack);
        self.next_stack += 1;
        token
    }
}

/// A domain change observed on a node, carrying the strongest
/// [`ChangeKind`] the mutation implicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeChangeEvent {
    pub node: NodeId,
    pub kind: ChangeKind,
}

/// A named variable slot: one domain plus the bookkeeping the graph and the
/// choicepoint stack need.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    domain: VariableDomain,
    in_graph: bool,
    stack: Option<StackToken>,
    /// Serial of the choicepoint frame that currently holds this node's
    /// snapshot, so each frame saves a domain at most once.
    saved_in_frame: Option<u64>,
}

impl Node {
    /// # Panics
    ///
    /// Panics on an empty name; every node must be nameable before it can
    /// join a graph.
    pub fn new(id: NodeId, name: impl Into<String>, domain: VariableDomain) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "node {id} has no name");
        Self {
            id,
            name,
            domain,
            in_graph: false,
            stack: None,
            saved_in_frame: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &VariableDomain {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut VariableDomain {
        &mut self.domain
    }

    pub fn in_graph(&self) -> bool {
        self.in_graph
    }

    /// Binds this node to a choicepoint stack. Set-once: a node cannot be
    /// transactionally managed by two different stacks.
    ///
    /// # Panics
    ///
    /// Panics when already bound to a different stack.
    pub fn bind_stack(&mut self, token: StackToken) {
        match self.stack {
            None => self.stack = Some(token),
            Some(held) if held == token => {}
            Some(held) => panic!(
                "node {} already bound to choicepoint stack {held:?}, refusing {token:?}",
                self.id
            ),
        }
    }

    pub fn bound_stack(&self) -> Option<StackToken> {
        self.stack
    }

    pub(crate) fn added_to_graph(&mut self) {
        self.in_graph = true;
    }

    pub(crate) fn removed_from_graph(&mut self) {
        self.in_graph = false;
    }

    pub(crate) fn saved_in_frame(&self) -> Option<u64> {
        self.saved_in_frame
    }

    pub(crate) fn set_saved_in_frame(&mut self, serial: Option<u64>) {
        self.saved_in_frame = serial;
    }
}

/// The node collection a graph owns, split out so propagation can borrow
/// all nodes mutably while the arc being evaluated stays borrowed from the
/// graph's arc table.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: BTreeMap<NodeId, Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("node {id} is not in the graph"))
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("node {id} is not in the graph"))
    }

    pub fn try_get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn insert(&mut self, node: Node) {
        let _ = self.nodes.insert(node.id(), node);
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::domain::IntDomain;

    fn node(id: u32) -> Node {
        Node::new(
            NodeId(id),
            format!("x{id}"),
            VariableDomain::Int(IntDomain::new(0, 9)),
        )
    }

    #[test]
    #[should_panic(expected = "has no name")]
    fn unnamed_node_is_rejected() {
        let _ = Node::new(NodeId(0), "", VariableDomain::Int(IntDomain::new(0, 1)));
    }

    #[test]
    fn stack_binding_is_set_once() {
        let mut n = node(0);
        n.bind_stack(StackToken(1));
        n.bind_stack(StackToken(1)); // same stack: fine
        assert_eq!(n.bound_stack(), Some(StackToken(1)));
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn rebinding_to_another_stack_panics() {
        let mut n = node(0);
        n.bind_stack(StackToken(1));
        n.bind_stack(StackToken(2));
    }

    #[test]
    fn id_source_is_sequential() {
        let mut ids = IdSource::new();
        assert_eq!(ids.next_node_id(), NodeId(0));
        assert_eq!(ids.next_node_id(), NodeId(1));
        assert_eq!(ids.next_stack_token(), StackToken(0));
    }
}
