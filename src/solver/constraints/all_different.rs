use crate::solver::arc::PropagationArc;
use crate::solver::arcs::not_equal::NotEqualArc;
use crate::solver::constraint::{Constraint, ConstraintDescriptor};
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// All variables take pairwise distinct values (pairwise decomposition).
#[derive(Debug, Clone)]
pub struct AllDifferentConstraint {
    vars: Vec<NodeId>,
}

impl AllDifferentConstraint {
    pub fn new(vars: Vec<NodeId>) -> Self {
        Self { vars }
    }
}

impl Constraint for AllDifferentConstraint {
    fn variables(&self) -> &[NodeId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        ConstraintDescriptor {
            name: "AllDifferent".to_owned(),
            description: format!("all_different({} vars)", self.vars.len()),
        }
    }

    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>> {
        let mut arcs: Vec<Box<dyn PropagationArc>> = Vec::new();
        for (i, &a) in self.vars.iter().enumerate() {
            for &b in &self.vars[i + 1..] {
                arcs.push(Box::new(NotEqualArc::new(a, b)));
                arcs.push(Box::new(NotEqualArc::new(b, a)));
            }
        }
        arcs
    }

    fn is_violated(&self, graph: &NodeArcGraph) -> bool {
        let mut bound = std::collections::BTreeSet::new();
        for &var in &self.vars {
            if let Some(v) = graph.node(var).domain().int().bound_value() {
                if !bound.insert(v) {
                    return true;
                }
            }
        }
        false
    }
}
