use crate::solver::arc::PropagationArc;
use crate::solver::arcs::not_equal::NotEqualArc;
use crate::solver::constraint::{Constraint, ConstraintDescriptor};
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// `a != b`, enforced in both directions.
#[derive(Debug, Clone)]
pub struct NotEqualConstraint {
    vars: [NodeId; 2],
}

impl NotEqualConstraint {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self { vars: [a, b] }
    }
}

impl Constraint for NotEqualConstraint {
    fn variables(&self) -> &[NodeId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        ConstraintDescriptor {
            name: "NotEqual".to_owned(),
            description: format!("{} != {}", self.vars[0], self.vars[1]),
        }
    }

    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>> {
        let [a, b] = self.vars;
        vec![
            Box::new(NotEqualArc::new(a, b)),
            Box::new(NotEqualArc::new(b, a)),
        ]
    }

    fn is_violated(&self, graph: &NodeArcGraph) -> bool {
        let [a, b] = self.vars;
        let a = graph.node(a).domain().int();
        let b = graph.node(b).domain().int();
        match (a.bound_value(), b.bound_value()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}
