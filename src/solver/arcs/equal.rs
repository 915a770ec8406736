use crate::error::PropagationFailure;
use crate::solver::arc::{ArcType, PropagationArc, PropagationContext};
use crate::solver::domain::ChangeKind;
use crate::solver::node::NodeId;

/// Keeps the target inside the source's value set.
///
/// Value-dependent: every removal on the source matters. The delta-based
/// [`propagate_from`](PropagationArc::propagate_from) removes exactly the
/// source's logged removals from the target, which reaches the same fixed
/// point as the full set intersection.
#[derive(Debug, Clone)]
pub struct EqualArc {
    source: [NodeId; 1],
    target: [NodeId; 1],
}

impl EqualArc {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source: [source],
            target: [target],
        }
    }
}

impl PropagationArc for EqualArc {
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
        ChangeKind::Value
    }

    fn propagate(&self, ctx: &mut PropagationContext<'_>) -> Result<(), PropagationFailure> {
        let allowed = ctx.values(self.source[0]);
        ctx.restrict_to(self.target[0], &allowed)
    }

    fn propagate_from(
        &self,
        source: NodeId,
        ctx: &mut PropagationContext<'_>,
    ) -> Result<(), PropagationFailure> {
        debug_assert_eq!(source, self.source[0]);
        let removed = ctx.removed_since_clear(self.source[0]);
        if removed.is_empty() {
            // No delta available (already cleared); fall back to the
            // ground-truth computation.
            return self.propagate(ctx);
        }
        for value in removed.iter() {
            ctx.remove_value(self.target[0], *value)?;
        }
        Ok(())
    }
}
