use crate::error::PropagationFailure;
use crate::solver::arc::{ArcType, PropagationArc, PropagationContext};
use crate::solver::domain::ChangeKind;
use crate::solver::node::NodeId;

/// Generic form of not-equal: once the scalar source is bound, its value is
/// removed from every element of an expanded generic expression.
///
/// The scalar is the only source; the expanded elements are targets only.
#[derive(Debug, Clone)]
pub struct GenericNotEqualArc {
    source: [NodeId; 1],
    elements: Vec<NodeId>,
}

impl GenericNotEqualArc {
    pub fn new(source: NodeId, elements: Vec<NodeId>) -> Self {
        Self {
            source: [source],
            elements,
        }
    }
}

impl PropagationArc for GenericNotEqualArc {
    fn arc_type(&self) -> ArcType {
        ArcType::Generic
    }

    fn sources(&self) -> &[NodeId] {
        &self.source
    }

    fn targets(&self) -> &[NodeId] {
        &self.elements
    }

    fn source_dependency(&self, _source: NodeId) -> ChangeKind {
        ChangeKind::Range
    }

    fn complexity(&self) -> u32 {
        // Touches every expanded element, so it is priced by target count
        // rather than its single source.
        self.elements.len() as u32
    }

    fn propagate(&self, ctx: &mut PropagationContext<'_>) -> Result<(), PropagationFailure> {
        if let Some(value) = ctx.bound_value(self.source[0]) {
            for element in &self.elements {
                ctx.remove_value(*element, value)?;
            }
        }
        Ok(())
    }
}
