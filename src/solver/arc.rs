use im::OrdSet;

use crate::error::PropagationFailure;
use crate::solver::choicepoint::{ChoicePointEntry, ChoicePointStack};
use crate::solver::domain::{ChangeKind, DomainChange, VariableDomain};
use crate::solver::node::{NodeChangeEvent, NodeId, NodeStore};

/// Arity shape of an arc, which determines how its source/target node
/// arrays are derived and its base evaluation cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcType {
    /// Unary: restricts a single target from constants, no sources.
    Node,
    /// One source, one target.
    Binary,
    /// Several sources feeding one or more targets.
    Hyper,
    /// Expanded from a generic (indexed) expression over many scalars.
    Generic,
    /// Reserved for the scheduling client layer's resource/temporal arcs.
    Schedule,
}

/// A directed primitive consistency relation between nodes.
///
/// Arcs are created once when a constraint is posted and never mutated;
/// all search state lives in the node domains. The one behavioral
/// requirement beyond correctness is idempotence at fixed point:
/// re-invoking [`propagate`](PropagationArc::propagate) on an already
/// consistent domain set must change nothing.
pub trait PropagationArc: std::fmt::Debug {
    fn arc_type(&self) -> ArcType;

    /// Nodes whose changes can re-trigger this arc.
    fn sources(&self) -> &[NodeId];

    /// Nodes this arc narrows.
    fn targets(&self) -> &[NodeId];

    /// The minimum change strength on `source` that must re-trigger this
    /// arc. A bounds-consistency arc declares [`ChangeKind::Range`] and is
    /// left alone by interior removals; a removal-sensitive arc declares
    /// [`ChangeKind::Value`] and sees everything.
    fn source_dependency(&self, source: NodeId) -> ChangeKind;

    /// Static, arity-derived cost estimate used purely for queue ordering.
    fn complexity(&self) -> u32 {
        self.sources().len() as u32
    }

    /// Narrows the target domain(s) from the current source domain(s).
    fn propagate(&self, ctx: &mut PropagationContext<'_>) -> Result<(), PropagationFailure>;

    /// Optimized re-evaluation after a change to one specific source,
    /// allowed to consult that source's delta log instead of recomputing.
    /// Must reach the same fixed point as [`propagate`](Self::propagate),
    /// which is the ground truth.
    fn propagate_from(
        &self,
        source: NodeId,
        ctx: &mut PropagationContext<'_>,
    ) -> Result<(), PropagationFailure> {
        let _ = source;
        self.propagate(ctx)
    }
}

/// The mutable view an arc (or the store's own mutation surface)
/// propagates through.
///
/// Every write snapshots the touched domain into the current choicepoint
/// frame the first time that node is mutated within the frame, applies the
/// restriction, and queues a [`NodeChangeEvent`] carrying the strongest
/// implicated [`ChangeKind`]. Failures surface before anything is mutated,
/// so a failing call leaves the domain it targeted unchanged (the episode
/// as a whole is still rolled back by the caller).
#[derive(Debug)]
pub struct PropagationContext<'a> {
    nodes: &'a mut NodeStore,
    cps: &'a mut ChoicePointStack,
    events: &'a mut Vec<NodeChangeEvent>,
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(
        nodes: &'a mut NodeStore,
        cps: &'a mut ChoicePointStack,
        events: &'a mut Vec<NodeChangeEvent>,
    ) -> Self {
        Self { nodes, cps, events }
    }

    // Read surface.

    pub fn min(&self, node: NodeId) -> i64 {
        self.nodes.get(node).domain().int().min()
    }

    pub fn max(&self, node: NodeId) -> i64 {
        self.nodes.get(node).domain().int().max()
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.nodes.get(node).domain().is_bound()
    }

    pub fn bound_value(&self, node: NodeId) -> Option<i64> {
        self.nodes.get(node).domain().int().bound_value()
    }

    pub fn contains(&self, node: NodeId, value: i64) -> bool {
        self.nodes.get(node).domain().int().contains(value)
    }

    pub fn domain_size(&self, node: NodeId) -> usize {
        self.nodes.get(node).domain().size()
    }

    /// The node's current integer value set. Shares structure with the live
    /// domain; cheap.
    pub fn values(&self, node: NodeId) -> OrdSet<i64> {
        self.nodes.get(node).domain().int().values().clone()
    }

    /// Values removed from the node since the last delta clear, for
    /// delta-based `propagate_from` implementations.
    pub fn removed_since_clear(&self, node: NodeId) -> OrdSet<i64> {
        self.nodes
            .get(node)
            .domain()
            .int()
            .removed_since_clear()
            .clone()
    }

    // Write surface, mirroring `IntDomain`'s mutators.

    pub fn set_min(&mut self, node: NodeId, min: i64) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.int_mut().set_min(min))
    }

    pub fn set_max(&mut self, node: NodeId, max: i64) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.int_mut().set_max(max))
    }

    pub fn set_range(&mut self, node: NodeId, min: i64, max: i64) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.int_mut().set_range(min, max))
    }

    pub fn set_value(&mut self, node: NodeId, value: i64) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.int_mut().set_value(value))
    }

    pub fn remove_value(&mut self, node: NodeId, value: i64) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.int_mut().remove_value(value))
    }

    pub fn remove_range(
        &mut self,
        node: NodeId,
        min: i64,
        max: i64,
    ) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.int_mut().remove_range(min, max))
    }

    /// Restricts the node to its intersection with `allowed`.
    pub fn restrict_to(
        &mut self,
        node: NodeId,
        allowed: &OrdSet<i64>,
    ) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.int_mut().set_domain(allowed))
    }

    pub fn bind_bool(&mut self, node: NodeId, value: bool) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.bool_mut().set_value(value))
    }

    pub fn require_in_set(&mut self, node: NodeId, value: i64) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.set_mut().require(value))
    }

    pub fn remove_possible_from_set(
        &mut self,
        node: NodeId,
        value: i64,
    ) -> Result<(), PropagationFailure> {
        self.mutate(node, |d| d.set_mut().remove_possible(value))
    }

    fn mutate(
        &mut self,
        node: NodeId,
        op: impl FnOnce(&mut VariableDomain) -> Result<DomainChange, PropagationFailure>,
    ) -> Result<(), PropagationFailure> {
        let entry = self.nodes.get_mut(node);
        // Cheap pre-image; only recorded if the op actually changes state.
        let before = entry.domain().snapshot();
        let change = op(entry.domain_mut())?;
        if let Some(kind) = change {
            if let Some(serial) = self.cps.active_frame_serial() {
                if entry.saved_in_frame() != Some(serial) {
                    self.cps.record(ChoicePointEntry::DomainSaved {
                        node,
                        snapshot: before,
                    });
                    entry.set_saved_in_frame(Some(serial));
                }
            }
            self.events.push(NodeChangeEvent { node, kind });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::domain::IntDomain;
    use crate::solver::node::{Node, StackToken};

    fn fixture() -> (NodeStore, ChoicePointStack) {
        let mut nodes = NodeStore::new();
        nodes.insert(Node::new(
            NodeId(0),
            "x0",
            VariableDomain::Int(IntDomain::new(1, 4)),
        ));
        (nodes, ChoicePointStack::new(StackToken(0)))
    }

    #[test]
    fn writes_emit_events_with_strongest_kind() {
        let (mut nodes, mut cps) = fixture();
        let mut events = Vec::new();
        let mut ctx = PropagationContext::new(&mut nodes, &mut cps, &mut events);

        ctx.remove_value(NodeId(0), 2).unwrap();
        ctx.set_min(NodeId(0), 3).unwrap();
        ctx.set_min(NodeId(0), 3).unwrap(); // no-op, no event

        assert_eq!(
            events,
            vec![
                NodeChangeEvent {
                    node: NodeId(0),
                    kind: ChangeKind::Value
                },
                NodeChangeEvent {
                    node: NodeId(0),
                    kind: ChangeKind::Range
                },
            ]
        );
    }

    #[test]
    fn first_write_per_frame_snapshots_once() {
        let (mut nodes, mut cps) = fixture();
        let _ = cps.push();
        let mut events = Vec::new();
        let mut ctx = PropagationContext::new(&mut nodes, &mut cps, &mut events);
        ctx.set_min(NodeId(0), 2).unwrap();
        ctx.set_min(NodeId(0), 3).unwrap();

        assert_eq!(cps.pop().len(), 1);
    }

    #[test]
    fn failed_write_leaves_target_untouched_and_silent() {
        let (mut nodes, mut cps) = fixture();
        let mut events = Vec::new();
        let mut ctx = PropagationContext::new(&mut nodes, &mut cps, &mut events);
        assert_eq!(ctx.set_min(NodeId(0), 9), Err(PropagationFailure));
        assert!(events.is_empty());
        assert_eq!(nodes.get(NodeId(0)).domain().int().min(), 1);
    }
}
