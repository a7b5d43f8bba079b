//! Semantics-preserving rewrites of provider trees.
//!
//! * [`ColumnPruner`] drops columns and operators no consumer reads.
//! * [`OrderingRewriter`] inserts and removes sorts so that order-sensitive operators see
//!   their source in the order they depend on.
//!
//! Both return new trees that share every unchanged sub-tree with their input.

mod ordering;
mod prune;

pub use ordering::*;
pub use prune::*;
