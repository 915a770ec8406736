//! Vinculum is a transactional constraint-propagation core: finite domains,
//! a node/arc dependency graph, an arc-consistency engine, and a
//! choicepoint stack giving stack-disciplined undo of every mutation.
//!
//! The crate deliberately stops below search: it knows how to narrow
//! domains to a fixed point, how to report inconsistency, and how to roll
//! the world back to any choicepoint, while the policy of which branches
//! to try (DFS, restarts, heuristics) lives with the caller.
//!
//! # Core Concepts
//!
//! - **[`ConstraintStore`]**: the façade owning one problem's variables,
//!   constraints, choicepoint stack, and propagation engine.
//! - **[`Constraint`]**: a declarative rule, implemented as a factory of
//!   primitive **[`PropagationArc`]s** that the engine evaluates.
//! - **Choicepoints**: [`ConstraintStore::push`] before speculative
//!   mutation, [`ConstraintStore::pop`] to restore the pre-push state
//!   exactly, however much propagation happened in between.
//!
//! [`ConstraintStore`]: solver::store::ConstraintStore
//! [`ConstraintStore::push`]: solver::store::ConstraintStore::push
//! [`ConstraintStore::pop`]: solver::store::ConstraintStore::pop
//! [`Constraint`]: solver::constraint::Constraint
//! [`PropagationArc`]: solver::arc::PropagationArc
//!
//! # Example: `x1 != x2` with a backtracked guess
//!
//! ```
//! use vinculum::solver::constraints::not_equal::NotEqualConstraint;
//! use vinculum::solver::store::ConstraintStore;
//!
//! let mut store = ConstraintStore::new();
//! let x1 = store.new_int_variable("x1", 1, 4);
//! let x2 = store.new_int_variable("x2", 1, 4);
//!
//! store.add_constraint(Box::new(NotEqualConstraint::new(x1, x2))).unwrap();
//! store.propagate().unwrap();
//! // Neither variable is bound yet, so nothing narrows.
//! assert_eq!(store.domain_values(x2), vec![1, 2, 3, 4]);
//!
//! // Descend one search edge: guess x1 = 1.
//! store.push();
//! store.set_value(x1, 1).unwrap();
//! store.propagate().unwrap();
//! assert_eq!(store.domain_values(x2), vec![2, 3, 4]);
//!
//! // Backtrack: the guess and everything it propagated are undone.
//! store.pop();
//! assert_eq!(store.domain_values(x1), vec![1, 2, 3, 4]);
//! assert_eq!(store.domain_values(x2), vec![1, 2, 3, 4]);
//! ```
pub mod error;
pub mod solver;
