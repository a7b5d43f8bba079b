//! SQL generation for provider trees.
//!
//! A [`compiler::QueryCompiler`] takes a provider tree from the `strata` crate, runs the
//! pruning and ordering passes, lowers the result to a dialect-neutral SQL node tree and
//! has the target dialect spell it out.
//!
//! ## Design
//!
//! * [`ast`] The SQL node tree, including schema statements.
//! * [`lowering`] Provider tree to SQL node tree.
//! * [`dialect`] Target engines, their capabilities and how they spell each clause.
//! * [`translator`] Walks a SQL node tree and collects text and parameters.
//! * [`literal`] Writing and reading literals per dialect.
//! * [`compiler`] The compile pipeline and its options.
//! * [`cache`] Cache of compiled queries.

#[macro_use]
extern crate lazy_static;

pub mod ast;
pub mod cache;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod literal;
pub mod lowering;
pub mod translator;

#[cfg(test)]
mod test_utils;
