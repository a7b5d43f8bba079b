use std::collections::HashMap;

use datafusion_common::ScalarValue;
use strata::expr::{ApplyParameter, ScalarExpr, TupleAccess};
use strata::operator::RowCount;
use strata::properties::OrderSpec;

use crate::ast::{OrderItem, SqlExpr};
use crate::error::{SqlError, SqlResult};

/// What tuple slots read as: `current` for the tuple of the owning provider, `outer` for
/// the left tuple of every enclosing `Apply`.
pub(crate) struct Scope<'a> {
    pub current: &'a [SqlExpr],
    pub outer: &'a HashMap<ApplyParameter, Vec<SqlExpr>>,
}

impl<'a> Scope<'a> {
    fn access(&self, access: &TupleAccess) -> SqlResult<SqlExpr> {
        let slots = match access.parameter {
            None => Some(self.current),
            Some(p) => self.outer.get(&p).map(Vec::as_slice),
        };
        slots
            .and_then(|s| s.get(access.index))
            .cloned()
            .ok_or_else(|| SqlError::Malformed(format!("{} does not resolve", access)))
    }

    pub fn expr(&self, expr: &ScalarExpr) -> SqlResult<SqlExpr> {
        let lowered = match expr {
            ScalarExpr::TupleAccess(access) => self.access(access)?,
            ScalarExpr::Literal(value) => SqlExpr::Literal(value.clone()),
            ScalarExpr::Parameter(parameter) => SqlExpr::Parameter(parameter.clone()),
            ScalarExpr::Unary { op, expr } => SqlExpr::Unary {
                op: *op,
                expr: Box::new(self.expr(expr)?),
            },
            ScalarExpr::Binary { op, left, right } => SqlExpr::Binary {
                op: *op,
                left: Box::new(self.expr(left)?),
                right: Box::new(self.expr(right)?),
            },
            ScalarExpr::Function { function, args } => SqlExpr::Function {
                function: *function,
                args: args.iter().map(|a| self.expr(a)).collect::<SqlResult<_>>()?,
            },
            ScalarExpr::Cast { expr, data_type } => SqlExpr::Cast {
                expr: Box::new(self.expr(expr)?),
                data_type: data_type.clone(),
            },
            ScalarExpr::Trim {
                expr,
                kind,
                characters,
            } => SqlExpr::Trim {
                expr: Box::new(self.expr(expr)?),
                kind: *kind,
                characters: characters.clone(),
            },
            ScalarExpr::Case {
                branches,
                otherwise,
            } => SqlExpr::Case {
                branches: branches
                    .iter()
                    .map(|(when, then)| Ok((self.expr(when)?, self.expr(then)?)))
                    .collect::<SqlResult<_>>()?,
                otherwise: match otherwise {
                    Some(e) => Some(Box::new(self.expr(e)?)),
                    None => None,
                },
            },
        };
        Ok(lowered)
    }

    /// `ORDER BY` items of `order` over the current tuple.
    pub fn order(&self, order: &OrderSpec) -> SqlResult<Vec<OrderItem>> {
        order
            .orders()
            .iter()
            .map(|o| {
                let expr = self.current.get(o.column).cloned().ok_or_else(|| {
                    SqlError::Malformed(format!("order key #{} does not resolve", o.column))
                })?;
                Ok(OrderItem {
                    expr,
                    direction: o.direction,
                })
            })
            .collect()
    }
}

pub(crate) fn row_count(count: &RowCount) -> SqlExpr {
    match count {
        RowCount::Literal(n) => SqlExpr::Literal(ScalarValue::UInt64(Some(*n))),
        RowCount::Parameter(p) => SqlExpr::Parameter(p.clone()),
    }
}
