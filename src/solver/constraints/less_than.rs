use crate::solver::arc::PropagationArc;
use crate::solver::arcs::bounds::{LowerBoundArc, UpperBoundArc};
use crate::solver::constraint::{Constraint, ConstraintDescriptor};
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// `a < b` (or `a <= b` when not strict), as two directed bounds arcs.
#[derive(Debug, Clone)]
pub struct LessThanConstraint {
    vars: [NodeId; 2],
    strict: bool,
}

impl LessThanConstraint {
    pub fn new(a: NodeId, b: NodeId, strict: bool) -> Self {
        Self {
            vars: [a, b],
            strict,
        }
    }
}

impl Constraint for LessThanConstraint {
    fn variables(&self) -> &[NodeId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        let op = if self.strict { "<" } else { "<=" };
        ConstraintDescriptor {
            name: "LessThan".to_owned(),
            description: format!("{} {op} {}", self.vars[0], self.vars[1]),
        }
    }

    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>> {
        let [a, b] = self.vars;
        let gap = i64::from(self.strict);
        vec![
            Box::new(LowerBoundArc::new(a, b, gap)),
            Box::new(UpperBoundArc::new(b, a, -gap)),
        ]
    }

    fn is_violated(&self, graph: &NodeArcGraph) -> bool {
        let [a, b] = self.vars;
        let a = graph.node(a).domain().int();
        let b = graph.node(b).domain().int();
        if self.strict {
            a.min() >= b.max()
        } else {
            a.min() > b.max()
        }
    }
}
