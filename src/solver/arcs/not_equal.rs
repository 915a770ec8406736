use crate::error::PropagationFailure;
use crate::solver::arc::{ArcType, PropagationArc, PropagationContext};
use crate::solver::domain::ChangeKind;
use crate::solver::node::NodeId;

/// Once the source is bound, its value is removed from the target.
///
/// Range-dependent: only a bound collapse on the source can make this arc
/// do anything, and binding always reports at least a `Range` change.
#[derive(Debug, Clone)]
pub struct NotEqualArc {
    source: [NodeId; 1],
    target: [NodeId; 1],
}

impl NotEqualArc {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source: [source],
            target: [target],
        }
    }
}

impl PropagationArc for NotEqualArc {
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
        if let Some(value) = ctx.bound_value(self.source[0]) {
            ctx.remove_value(self.target[0], value)?;
        }
        Ok(())
    }
}
