use crate::solver::arc::PropagationArc;
use crate::solver::arcs::sum::SumArc;
use crate::solver::constraint::{Constraint, ConstraintDescriptor};
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// `z = x + y`, with bounds-consistency in all three directions.
#[derive(Debug, Clone)]
pub struct SumConstraint {
    vars: [NodeId; 3],
}

impl SumConstraint {
    pub fn new(x: NodeId, y: NodeId, z: NodeId) -> Self {
        Self { vars: [x, y, z] }
    }
}

impl Constraint for SumConstraint {
    fn variables(&self) -> &[NodeId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        let [x, y, z] = self.vars;
        ConstraintDescriptor {
            name: "Sum".to_owned(),
            description: format!("{z} = {x} + {y}"),
        }
    }

    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>> {
        let [x, y, z] = self.vars;
        vec![Box::new(SumArc::new(x, y, z))]
    }

    fn is_violated(&self, graph: &NodeArcGraph) -> bool {
        let [x, y, z] = self.vars;
        let x = graph.node(x).domain().int();
        let y = graph.node(y).domain().int();
        let z = graph.node(z).domain().int();
        z.max() < x.min().saturating_add(y.min()) || z.min() > x.max().saturating_add(y.max())
    }
}
