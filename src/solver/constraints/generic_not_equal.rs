use crate::solver::arc::PropagationArc;
use crate::solver::arcs::generic::GenericNotEqualArc;
use crate::solver::constraint::{Constraint, ConstraintDescriptor};
use crate::solver::expression::Expr;
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// Every element of a generic expression differs from one scalar variable.
///
/// The expression is expanded to scalar fragments up front; what reaches
/// the graph is one generic arc over ordinary nodes.
#[derive(Debug, Clone)]
pub struct GenericNotEqualConstraint {
    scalar: NodeId,
    expr: Expr,
    vars: Vec<NodeId>,
}

impl GenericNotEqualConstraint {
    pub fn new(scalar: NodeId, expr: Expr) -> Self {
        let mut vars = vec![scalar];
        vars.extend(expr.expand());
        Self { scalar, expr, vars }
    }
}

impl Constraint for GenericNotEqualConstraint {
    fn variables(&self) -> &[NodeId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        ConstraintDescriptor {
            name: "GenericNotEqual".to_owned(),
            description: format!(
                "{} != each of {} fragments",
                self.scalar,
                self.vars.len() - 1
            ),
        }
    }

    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>> {
        vec![Box::new(GenericNotEqualArc::new(
            self.scalar,
            self.expr.expand(),
        ))]
    }

    fn is_violated(&self, graph: &NodeArcGraph) -> bool {
        let Some(value) = graph.node(self.scalar).domain().int().bound_value() else {
            return false;
        };
        self.expr
            .expand()
            .into_iter()
            .any(|e| graph.node(e).domain().int().bound_value() == Some(value))
    }
}
