//! ## Background
//!
//! Queries reach this crate as trees of relational operators, called providers, built by an
//! object-persistence layer. Before a tree can be turned into SQL it goes through two
//! rewrites:
//!
//! * column-demand pruning removes every column, and transitively every operator, that no
//!   consumer above it reads;
//! * ordering preservation makes sure order-sensitive operators such as paging see their
//!   source in the order they depend on, and drops sorts nobody depends on.
//!
//! Both are pure functions of the tree. Unchanged sub-trees are shared with the input, which
//! lets callers compare by pointer to detect changes.
//!
//! ## Design
//!
//! * [`expr`] Scalar expressions and the tuple access gatherer and rewriter.
//! * [`operator`] Operator kinds and their parameters.
//! * [`provider`] The immutable provider tree, its headers, builder and explainer.
//! * [`properties`] Sort orders and per-kind ordering descriptors.
//! * [`rewrite`] The pruning and ordering passes.
//! * [`optimizer`] Runs the passes in order.

#[macro_use]
pub mod error;
pub mod expr;
pub mod operator;
pub mod optimizer;
pub mod properties;
pub mod provider;
pub mod rewrite;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
