use crate::error::PropagationFailure;
use crate::solver::arc::{ArcType, PropagationArc, PropagationContext};
use crate::solver::domain::ChangeKind;
use crate::solver::node::NodeId;

/// Enforces `target >= source.min + offset`.
///
/// Inequality constraints decompose into one of these per direction, e.g.
/// `x < y` posts `LowerBoundArc(x, y, 1)` and `UpperBoundArc(y, x, -1)`.
#[derive(Debug, Clone)]
pub struct LowerBoundArc {
    source: [NodeId; 1],
    target: [NodeId; 1],
    offset: i64,
}

impl LowerBoundArc {
    pub fn new(source: NodeId, target: NodeId, offset: i64) -> Self {
        Self {
            source: [source],
            target: [target],
            offset,
        }
    }
}

impl PropagationArc for LowerBoundArc {
    fn arc_type(&self) -> ArcType {
        ArcType::Binary
    }

    fn sources(&self) -> &[NodeId] {
        &self.source
    }

    fn targets(&self) -> &[NodeId] {
        &self.target
    }

    fn source_dependency(&self, _source: NodeId) -> ChangeKind {
        ChangeKind::Range
    }

    fn propagate(&self, ctx: &mut PropagationContext<'_>) -> Result<(), PropagationFailure> {
        let floor = ctx.min(self.source[0]).saturating_add(self.offset);
        ctx.set_min(self.target[0], floor)
    }
}

/// Enforces `target <= source.max + offset`.
#[derive(Debug, Clone)]
pub struct UpperBoundArc {
    source: [NodeId; 1],
    target: [NodeId; 1],
    offset: i64,
}

impl UpperBoundArc {
    pub fn new(source: NodeId, target: NodeId, offset: i64) -> Self {
        Self {
            source: [source],
            target: [target],
            offset,
        }
    }
}

impl PropagationArc for UpperBoundArc {
    fn arc_type(&self) -> ArcType {
        ArcType::Binary
    }

    fn sources(&self) -> &[NodeId] {
        &self.source
    }

    fn targets(&self) -> &[NodeId] {
        &self.target
    }

    fn source_dependency(&self, _source: NodeId) -> ChangeKind {
        ChangeKind::Range
    }

    fn propagate(&self, ctx: &mut PropagationContext<'_>) -> Result<(), PropagationFailure> {
        let ceiling = ctx.max(self.source[0]).saturating_add(self.offset);
        ctx.set_max(self.target[0], ceiling)
    }
}
