use crate::solver::node::NodeId;

/// One dimension of a generic (indexed) expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericIndex {
    name: String,
    cardinality: usize,
}

impl GenericIndex {
    /// # Panics
    ///
    /// Panics on a zero cardinality; an index must range over something.
    pub fn new(name: impl Into<String>, cardinality: usize) -> Self {
        let name = name.into();
        assert!(cardinality > 0, "index {name:?} has no values");
        Self { name, cardinality }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }
}

/// A scalar node or a generic (indexed) family of them.
///
/// Generic expressions exist only on the way into the graph: constraint
/// factories specialize them to fragments, and fragments resolve to
/// ordinary scalar nodes before any arc is posted. Elements are stored in
/// row-major order of the index list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Scalar(NodeId),
    Generic {
        indices: Vec<GenericIndex>,
        elements: Vec<NodeId>,
    },
}

impl Expr {
    /// Builds a generic expression, checking the element count against the
    /// index cardinalities.
    ///
    /// # Panics
    ///
    /// Panics when `elements.len()` is not the product of the index
    /// cardinalities.
    pub fn generic(indices: Vec<GenericIndex>, elements: Vec<NodeId>) -> Self {
        let expected: usize = indices.iter().map(GenericIndex::cardinality).product();
        assert_eq!(
            elements.len(),
            expected,
            "generic expression needs {expected} elements, got {}",
            elements.len()
        );
        Expr::Generic { indices, elements }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Expr::Scalar(_))
    }

    /// Specializes a generic expression to one full index assignment,
    /// yielding the scalar fragment at that position. Scalars are their own
    /// (only) fragment when the assignment is empty.
    ///
    /// # Panics
    ///
    /// Panics when the assignment length or any index value is out of
    /// range.
    pub fn create_fragment(&self, assignment: &[usize]) -> NodeId {
        match self {
            Expr::Scalar(node) => {
                assert!(
                    assignment.is_empty(),
                    "scalar expression takes no index assignment"
                );
                *node
            }
            Expr::Generic { indices, elements } => {
                assert_eq!(
                    assignment.len(),
                    indices.len(),
                    "assignment must cover every index"
                );
                let mut offset = 0usize;
                for (index, value) in indices.iter().zip(assignment) {
                    assert!(
                        *value < index.cardinality(),
                        "index {:?} has cardinality {}, got {value}",
                        index.name(),
                        index.cardinality()
                    );
                    offset = offset * index.cardinality() + value;
                }
                elements[offset]
            }
        }
    }

    /// Restricts one named index to a fixed value, dropping that dimension.
    /// With one index this collapses to a scalar.
    ///
    /// # Panics
    ///
    /// Panics on an unknown index name or out-of-range value.
    pub fn restrict(&self, index_name: &str, value: usize) -> Expr {
        let Expr::Generic { indices, elements } = self else {
            panic!("scalar expression has no index {index_name:?}");
        };
        let position = indices
            .iter()
            .position(|i| i.name() == index_name)
            .unwrap_or_else(|| panic!("no index named {index_name:?}"));
        assert!(value < indices[position].cardinality());

        let kept: Vec<GenericIndex> = indices
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, idx)| idx.clone())
            .collect();

        let mut picked = Vec::new();
        let mut assignment = vec![0usize; indices.len()];
        Self::enumerate(indices, position, value, 0, &mut assignment, &mut |a| {
            picked.push(self.create_fragment(a));
        });

        if kept.is_empty() {
            Expr::Scalar(picked[0])
        } else {
            Expr::generic(kept, picked)
        }
    }

    /// All scalar fragments, in row-major index order.
    pub fn expand(&self) -> Vec<NodeId> {
        match self {
            Expr::Scalar(node) => vec![*node],
            Expr::Generic { elements, .. } => elements.clone(),
        }
    }

    fn enumerate(
        indices: &[GenericIndex],
        fixed: usize,
        fixed_value: usize,
        depth: usize,
        assignment: &mut Vec<usize>,
        visit: &mut impl FnMut(&[usize]),
    ) {
        if depth == indices.len() {
            visit(assignment);
            return;
        }
        if depth == fixed {
            assignment[depth] = fixed_value;
            Self::enumerate(indices, fixed, fixed_value, depth + 1, assignment, visit);
        } else {
            for v in 0..indices[depth].cardinality() {
                assignment[depth] = v;
                Self::enumerate(indices, fixed, fixed_value, depth + 1, assignment, visit);
            }
        }
    }
}
