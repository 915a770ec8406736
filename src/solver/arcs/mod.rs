//! The primitive arc catalog.
//!
//! Each arc implements one directed consistency check and declares the
//! weakest source-change strength that must re-trigger it. Constraints are
//! thin factories over these.

pub mod bounds;
pub mod const_range;
pub mod equal;
pub mod generic;
pub mod not_equal;
pub mod sum;
