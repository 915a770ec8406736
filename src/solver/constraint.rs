use serde::{Deserialize, Serialize};

use crate::solver::arc::PropagationArc;
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::NodeId;

/// Human-readable identification of a constraint, for stats and debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub description: String,
}

/// A rule over variables, expressed as a factory of primitive arcs.
///
/// Constraints are clients of the propagation core: posting one to a store
/// emits its arcs into the graph, and from then on all reasoning happens at
/// the arc level. The trait is deliberately small; a constraint kind is a
/// struct plus arc-construction logic, not a class hierarchy.
pub trait Constraint: std::fmt::Debug {
    /// The variables this constraint ranges over.
    fn variables(&self) -> &[NodeId];

    fn descriptor(&self) -> ConstraintDescriptor;

    /// Builds the arcs that implement this constraint's consistency checks.
    /// Called once, when the constraint is posted.
    fn create_arcs(&self) -> Vec<Box<dyn PropagationArc>>;

    /// True only when current domains prove the constraint can no longer be
    /// satisfied. Unbound variables with room to maneuver mean `false`.
    fn is_violated(&self, graph: &NodeArcGraph) -> bool;
}
