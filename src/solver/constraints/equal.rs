use crate::solver::arc::PropagationArc;
use crate::solver::arcs::equal::EqualArc;
use crate::solver::constraint::{Constraint, ConstraintDescriptor};
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// `a == b`: each side is confined to the other's value set.
#[derive(Debug, Clone)]
pub struct EqualConstraint {
    vars: [NodeId; 2],
}

impl EqualConstraint {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self { vars: [a, b] }
    }
}

impl Constraint for EqualConstraint {
    fn variables(&self) -> &[NodeId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        ConstraintDescriptor {
            name: "Equal".to_owned(),
            description: format!("{} == {}", self.vars[0], self.vars[1]),
        }
    }

    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>> {
        let [a, b] = self.vars;
        vec![Box::new(EqualArc::new(a, b)), Box::new(EqualArc::new(b, a))]
    }

    fn is_violated(&self, graph: &NodeArcGraph) -> bool {
        let [a, b] = self.vars;
        let a = graph.node(a).domain().int();
        let b = graph.node(b).domain().int();
        // Violated once the value sets are disjoint.
        !a.iter().any(|v| b.contains(v))
    }
}
