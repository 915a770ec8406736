use crate::error::PropagationFailure;
use crate::solver::arc::{ArcType, PropagationArc, PropagationContext};
use crate::solver::domain::ChangeKind;
use crate::solver::node::NodeId;

/// Bounds-consistency for `z = x + y`.
///
/// A hyper arc: all three nodes are both sources and targets, and one
/// evaluation tightens every side from the other two.
#[derive(Debug, Clone)]
pub struct SumArc {
    nodes: [NodeId; 3],
}

impl SumArc {
    pub fn new(x: NodeId, y: NodeId, z: NodeId) -> Self {
        Self { nodes: [x, y, z] }
    }
}

impl PropagationArc for SumArc {
    fn arc_type(&self) -> ArcType {
        ArcType::Hyper
    }

    fn sources(&self) -> &[NodeId] {
        &self.nodes
    }

    fn targets(&self) -> &[NodeId] {
        &self.nodes
    }

    fn source_dependency(&self, _source: NodeId) -> ChangeKind {
        ChangeKind::Range
    }

    fn propagate(&self, ctx: &mut PropagationContext<'_>) -> Result<(), PropagationFailure> {
        let [x, y, z] = self.nodes;
        ctx.set_range(
            z,
            ctx.min(x).saturating_add(ctx.min(y)),
            ctx.max(x).saturating_add(ctx.max(y)),
        )?;
        ctx.set_range(
            x,
            ctx.min(z).saturating_sub(ctx.max(y)),
            ctx.max(z).saturating_sub(ctx.min(y)),
        )?;
        ctx.set_range(
            y,
            ctx.min(z).saturating_sub(ctx.max(x)),
            ctx.max(z).saturating_sub(ctx.min(x)),
        )?;
        Ok(())
    }
}
