use crate::solver::arc::PropagationArc;
use crate::solver::arcs::const_range::ConstRangeArc;
use crate::solver::constraint::{Constraint, ConstraintDescriptor};
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// Confines a variable to the constant interval `[min, max]`.
///
/// Posting this instead of calling the store's mutation surface makes the
/// restriction part of the declarative problem statement, with the usual
/// choicepoint tracking when posted inside a frame.
#[derive(Debug, Clone)]
pub struct InRangeConstraint {
    var: [NodeId; 1],
    min: i64,
    max: i64,
}

impl InRangeConstraint {
    pub fn new(var: NodeId, min: i64, max: i64) -> Self {
        Self {
            var: [var],
            min,
            max,
        }
    }
}

impl Constraint for InRangeConstraint {
    fn variables(&self) -> &[NodeId] {
        &self.var
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        ConstraintDescriptor {
            name: "InRange".to_owned(),
            description: format!("{} in [{}, {}]", self.var[0], self.min, self.max),
        }
    }

    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>> {
        vec![Box::new(ConstRangeArc::new(self.var[0], self.min, self.max))]
    }

    fn is_violated(&self, graph: &NodeArcGraph) -> bool {
        let d = graph.node(self.var[0]).domain().int();
        d.min() > self.max || d.max() < self.min
    }
}
