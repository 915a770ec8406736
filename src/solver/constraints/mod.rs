//! The constraint catalog: thin factories that translate declarative rules
//! into primitive arcs.

pub mod all_different;
pub mod equal;
pub mod generic_not_equal;
pub mod in_range;
pub mod less_than;
pub mod not_equal;
pub mod sum_of;
