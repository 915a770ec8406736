use crate::error::PropagationFailure;
use crate::solver::arc::{ArcType, PropagationArc, PropagationContext};
use crate::solver::domain::ChangeKind;
use crate::solver::node::NodeId;

/// Unary arc restricting its target to the constant interval `[min, max]`.
///
/// This is how assignment-style restrictions enter the graph: no sources,
/// so it never re-triggers and drains first (complexity 0).
#[derive(Debug, Clone)]
pub struct ConstRangeArc {
    target: [NodeId; 1],
    min: i64,
    max: i64,
}

impl ConstRangeArc {
    pub fn new(target: NodeId, min: i64, max: i64) -> Self {
        Self {
            target: [target],
            min,
            max,
        }
    }
}

impl PropagationArc for ConstRangeArc {
    fn arc_type(&self) -> ArcType {
        ArcType::Node
    }

    fn sources(&self) -> &[NodeId] {
        &[]
    }

    fn targets(&self) -> &[NodeId] {
        &self.target
    }

    fn source_dependency(&self, source: NodeId) -> ChangeKind {
        panic!("const-range arc has no sources, asked about {source}")
    }

    fn propagate(&self, ctx: &mut PropagationContext<'_>) -> Result<(), PropagationFailure> {
        ctx.set_range(self.target[0], self.min, self.max)
    }
}
