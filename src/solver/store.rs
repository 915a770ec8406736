use tracing::debug;

use crate::error::{PropagationFailure, Result};
use crate::solver::algorithm::Ac5;
use crate::solver::arc::PropagationContext;
use crate::solver::choicepoint::{ChoicePointEntry, ChoicePointStack};
use crate::solver::constraint::Constraint;
use crate::solver::domain::{BoolDomain, IntDomain, SetDomain, VariableDomain};
use crate::solver::graph::{GraphState, NodeArcGraph};
use crate::solver::node::{IdSource, Node, NodeId};
use crate::solver::stats::PropagationStats;

pub type ConstraintId = usize;

/// Whole-store checkpoint, independent of the choicepoint frames.
///
/// Intended for external application save points: everything added after
/// the capture is removed on restore, and every surviving domain is
/// reinstated. Not a substitute for push/pop during search.
#[derive(Debug, Clone)]
pub struct StoreState {
    graph: GraphState,
    /// Length of the constraint registry at capture time; the registry is
    /// append-only, so restore is a truncation.
    constraints: usize,
}

/// The top-level façade gluing together graph, choicepoint stack, and
/// propagation engine.
///
/// A store is one problem: it owns the variables, the posted constraints,
/// and the single choicepoint stack holding transactional authority over
/// them. Independent problems use independent stores.
///
/// With auto-propagation off (the default), mutations and constraint posts
/// queue work that an explicit [`propagate`](ConstraintStore::propagate)
/// call drains. With it on, every mutation and post drains synchronously
/// and surfaces inconsistency at the call that introduced it.
#[derive(Debug)]
pub struct ConstraintStore {
    graph: NodeArcGraph,
    cps: ChoicePointStack,
    algorithm: Ac5,
    constraints: Vec<Box<dyn Constraint>>,
    ids: IdSource,
    auto_propagate: bool,
    stats: PropagationStats,
}

impl ConstraintStore {
    pub fn new() -> Self {
        let mut ids = IdSource::new();
        let cps = ChoicePointStack::new(ids.next_stack_token());
        let mut graph = NodeArcGraph::new();
        graph.set_choice_point_stack(cps.token());
        Self {
            graph,
            cps,
            algorithm: Ac5::new(),
            constraints: Vec::new(),
            ids,
            auto_propagate: false,
            stats: PropagationStats::default(),
        }
    }

    /// When enabled, every node change event and constraint post triggers
    /// an immediate queue drain instead of waiting for an explicit
    /// [`propagate`](ConstraintStore::propagate).
    pub fn set_auto_propagate(&mut self, on: bool) {
        self.auto_propagate = on;
    }

    /// See [`Ac5::set_required_min_complexity`].
    pub fn set_required_min_complexity(&mut self, min: u32) {
        self.algorithm.set_required_min_complexity(min);
    }

    // Variable factory surface.

    pub fn new_int_variable(&mut self, name: impl Into<String>, min: i64, max: i64) -> NodeId {
        let id = self.ids.next_node_id();
        let node = Node::new(id, name, VariableDomain::Int(IntDomain::new(min, max)));
        self.graph.add_node(node, &mut self.cps)
    }

    pub fn new_int_variable_from_values(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = i64>,
    ) -> NodeId {
        let id = self.ids.next_node_id();
        let node = Node::new(
            id,
            name,
            VariableDomain::Int(IntDomain::from_values(values)),
        );
        self.graph.add_node(node, &mut self.cps)
    }

    pub fn new_bool_variable(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.ids.next_node_id();
        let node = Node::new(id, name, VariableDomain::Bool(BoolDomain::new()));
        self.graph.add_node(node, &mut self.cps)
    }

    pub fn new_set_variable(
        &mut self,
        name: impl Into<String>,
        possible: impl IntoIterator<Item = i64>,
    ) -> NodeId {
        let id = self.ids.next_node_id();
        let node = Node::new(id, name, VariableDomain::Set(SetDomain::new(possible)));
        self.graph.add_node(node, &mut self.cps)
    }

    /// Adds an externally constructed node. Idempotent by node id; the id
    /// must come from this store's [`next_node_id`](ConstraintStore::next_node_id).
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.graph.add_node(node, &mut self.cps)
    }

    /// Allocates a node id for external node construction.
    pub fn next_node_id(&mut self) -> NodeId {
        self.ids.next_node_id()
    }

    // Constraint surface.

    /// Posts a constraint's arcs to the graph. Under auto-propagation the
    /// immediate drain's failure surfaces here, and the caller is expected
    /// to have bracketed the call in push/pop (or to abandon the store).
    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<ConstraintId> {
        let id = self.constraints.len();
        debug!(constraint = %constraint.descriptor().name, "posting constraint");
        for arc in constraint.create_arcs() {
            let _ = self.graph.add_arc(arc, &mut self.cps);
        }
        self.cps.record(ChoicePointEntry::ConstraintPosted(id));
        self.constraints.push(constraint);
        self.seed_new_arcs();
        if self.auto_propagate {
            self.drain()?;
        }
        Ok(id)
    }

    pub fn constraints(&self) -> &[Box<dyn Constraint>] {
        &self.constraints
    }

    /// Runs the propagation engine to a fixed point.
    pub fn propagate(&mut self) -> Result<()> {
        self.seed_new_arcs();
        self.drain()
    }

    // Mutation surface. Each call records the change for rollback, queues
    // the arcs it re-triggers, and (under auto-propagation) drains.

    pub fn set_value(&mut self, node: NodeId, value: i64) -> Result<()> {
        self.apply(|ctx| ctx.set_value(node, value))
    }

    pub fn set_min(&mut self, node: NodeId, min: i64) -> Result<()> {
        self.apply(|ctx| ctx.set_min(node, min))
    }

    pub fn set_max(&mut self, node: NodeId, max: i64) -> Result<()> {
        self.apply(|ctx| ctx.set_max(node, max))
    }

    pub fn set_range(&mut self, node: NodeId, min: i64, max: i64) -> Result<()> {
        self.apply(|ctx| ctx.set_range(node, min, max))
    }

    pub fn remove_value(&mut self, node: NodeId, value: i64) -> Result<()> {
        self.apply(|ctx| ctx.remove_value(node, value))
    }

    pub fn remove_range(&mut self, node: NodeId, min: i64, max: i64) -> Result<()> {
        self.apply(|ctx| ctx.remove_range(node, min, max))
    }

    pub fn bind_bool(&mut self, node: NodeId, value: bool) -> Result<()> {
        self.apply(|ctx| ctx.bind_bool(node, value))
    }

    pub fn require_in_set(&mut self, node: NodeId, value: i64) -> Result<()> {
        self.apply(|ctx| ctx.require_in_set(node, value))
    }

    pub fn remove_possible_from_set(&mut self, node: NodeId, value: i64) -> Result<()> {
        self.apply(|ctx| ctx.remove_possible_from_set(node, value))
    }

    // Choicepoint surface.

    /// Opens a choicepoint frame; call once per search-tree edge descended.
    pub fn push(&mut self) -> usize {
        self.cps.push()
    }

    /// Backtracks one frame: every domain mutation, structural addition,
    /// and constraint post made since the matching
    /// [`push`](ConstraintStore::push) is undone in reverse chronological
    /// order.
    pub fn pop(&mut self) {
        let frame = self.cps.pop();
        debug!(entries = frame.len(), "rolling back choicepoint frame");
        for entry in frame.into_rollback_order() {
            match entry {
                ChoicePointEntry::DomainSaved { node, snapshot } => {
                    let node = self.graph.nodes_mut().get_mut(node);
                    node.domain_mut().restore(snapshot);
                    node.set_saved_in_frame(None);
                }
                ChoicePointEntry::Graph(delta) => {
                    if let Some(removed_arc) = self.graph.undo(delta) {
                        self.algorithm.remove_from_queue(removed_arc);
                    }
                }
                ChoicePointEntry::ConstraintPosted(len) => {
                    self.constraints.truncate(len);
                }
            }
        }
    }

    pub fn choice_point_depth(&self) -> usize {
        self.cps.depth()
    }

    // Checkpoint surface.

    pub fn current_state(&self) -> StoreState {
        StoreState {
            graph: self.graph.graph_state(),
            constraints: self.constraints.len(),
        }
    }

    /// Reinstates a checkpoint taken from this store.
    ///
    /// # Panics
    ///
    /// Panics while choicepoint frames are open: their undo entries were
    /// recorded against the state being discarded, so a later pop would
    /// replay them against the wrong world. Checkpoints bracket whole
    /// search episodes, not frames.
    pub fn restore_state(&mut self, state: &StoreState) {
        assert!(
            self.cps.depth() == 0,
            "cannot restore a checkpoint with {} open choicepoint frames",
            self.cps.depth()
        );
        self.graph.restore_graph_state(&state.graph);
        self.constraints.truncate(state.constraints);
        self.algorithm.clear_queue();
    }

    // Read surface.

    pub fn graph(&self) -> &NodeArcGraph {
        &self.graph
    }

    pub fn stats(&self) -> &PropagationStats {
        &self.stats
    }

    pub fn min(&self, node: NodeId) -> i64 {
        self.graph.node(node).domain().int().min()
    }

    pub fn max(&self, node: NodeId) -> i64 {
        self.graph.node(node).domain().int().max()
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.graph.node(node).domain().is_bound()
    }

    pub fn bound_value(&self, node: NodeId) -> Option<i64> {
        self.graph.node(node).domain().int().bound_value()
    }

    pub fn domain_values(&self, node: NodeId) -> Vec<i64> {
        self.graph.node(node).domain().int().iter().collect()
    }

    /// True when some posted constraint is provably violated by the
    /// current domains.
    pub fn has_violation(&self) -> bool {
        self.constraints.iter().any(|c| c.is_violated(&self.graph))
    }

    fn apply(
        &mut self,
        op: impl FnOnce(&mut PropagationContext<'_>) -> std::result::Result<(), PropagationFailure>,
    ) -> Result<()> {
        let mut events = Vec::new();
        {
            let mut ctx =
                PropagationContext::new(self.graph.nodes_mut(), &mut self.cps, &mut events);
            op(&mut ctx)?;
        }
        for event in events {
            self.algorithm.enqueue_event(&self.graph, event);
        }
        if self.auto_propagate {
            self.seed_new_arcs();
            self.drain()?;
        }
        Ok(())
    }

    fn seed_new_arcs(&mut self) {
        for arc in self.graph.take_newly_posted() {
            self.algorithm.enqueue_new_arc(&self.graph, arc);
        }
    }

    fn drain(&mut self) -> Result<()> {
        self.algorithm
            .propagate(&mut self.graph, &mut self.cps, &mut self.stats)?;
        Ok(())
    }
}

impl Default for ConstraintStore {
    fn default() -> Self {
        Self::new()
    }
}
