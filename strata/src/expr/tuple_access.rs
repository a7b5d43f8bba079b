//! Gathering and remapping of tuple slot reads.
//!
//! These two primitives keep expressions consistent when a rewrite renumbers the columns of
//! the tuple they read. They only look at [`ScalarExpr::TupleAccess`]; every other node is
//! passed through as is.

use std::collections::{BTreeMap, HashMap};

use crate::expr::{ApplyParameter, ScalarExpr, TupleAccess};
use crate::utils::{ColumnMap, ColumnSet};

/// Slot indexes read by `expr` from its own tuple.
pub fn gather(expr: &ScalarExpr) -> ColumnSet {
    gather_scope(expr, None)
}

/// Slot indexes read by `expr` from the outer tuple bound to `parameter`.
pub fn gather_outer(expr: &ScalarExpr, parameter: ApplyParameter) -> ColumnSet {
    gather_scope(expr, Some(parameter))
}

/// All slot reads of `expr`, split by correlation token (`None` for the own tuple).
pub fn gather_by_parameter(expr: &ScalarExpr) -> BTreeMap<Option<ApplyParameter>, ColumnSet> {
    let mut result: BTreeMap<Option<ApplyParameter>, ColumnSet> = BTreeMap::new();
    expr.visit_pre(&mut |e| {
        if let ScalarExpr::TupleAccess(access) = e {
            result
                .entry(access.parameter)
                .or_default()
                .insert(access.index);
        }
    });
    result
}

fn gather_scope(expr: &ScalarExpr, scope: Option<ApplyParameter>) -> ColumnSet {
    let mut columns = ColumnSet::new();
    expr.visit_pre(&mut |e| {
        if let ScalarExpr::TupleAccess(access) = e {
            if access.parameter == scope {
                columns.insert(access.index);
            }
        }
    });
    columns
}

/// Resolves the current column mapping of the outer tuple bound to a correlation token.
pub trait OuterResolver {
    fn resolve(&self, parameter: ApplyParameter) -> Option<&ColumnMap>;
}

impl OuterResolver for HashMap<ApplyParameter, ColumnMap> {
    fn resolve(&self, parameter: ApplyParameter) -> Option<&ColumnMap> {
        self.get(&parameter)
    }
}

/// Resolver for expressions that have no enclosing `Apply` being remapped.
pub struct NoOuter;

impl OuterResolver for NoOuter {
    fn resolve(&self, _parameter: ApplyParameter) -> Option<&ColumnMap> {
        None
    }
}

/// A slot read whose column did not survive the rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingColumn(pub TupleAccess);

/// Renumbers slot reads of an expression after its input columns were renumbered.
///
/// Unqualified reads go through `mapping`. Reads through a correlation token go through the
/// map returned by the resolver for that token, and are left untouched when the resolver
/// has none.
pub struct TupleAccessRewriter<'a> {
    mapping: &'a ColumnMap,
    outer: &'a dyn OuterResolver,
    ignore_missing: bool,
}

impl<'a> TupleAccessRewriter<'a> {
    pub fn new(mapping: &'a ColumnMap, outer: &'a dyn OuterResolver) -> Self {
        Self {
            mapping,
            outer,
            ignore_missing: false,
        }
    }

    /// Leaves reads of columns absent from the mapping unchanged instead of failing.
    pub fn ignore_missing(mut self) -> Self {
        self.ignore_missing = true;
        self
    }

    pub fn rewrite(&self, expr: &ScalarExpr) -> Result<ScalarExpr, MissingColumn> {
        expr.try_transform(&mut |e| match e {
            ScalarExpr::TupleAccess(access) => self.rewrite_access(access).map(Some),
            _ => Ok(None),
        })
    }

    fn rewrite_access(&self, access: &TupleAccess) -> Result<ScalarExpr, MissingColumn> {
        let mapping = match access.parameter {
            None => self.mapping,
            Some(p) => match self.outer.resolve(p) {
                Some(m) => m,
                None => return Ok(ScalarExpr::TupleAccess(*access)),
            },
        };

        match mapping.get(access.index) {
            Some(index) => Ok(ScalarExpr::TupleAccess(TupleAccess {
                index,
                parameter: access.parameter,
            })),
            None if self.ignore_missing => Ok(ScalarExpr::TupleAccess(*access)),
            None => Err(MissingColumn(*access)),
        }
    }
}
