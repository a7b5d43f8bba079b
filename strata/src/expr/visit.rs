//! Generic traversal of [`ScalarExpr`] trees.
//!
//! * `visit_children` only visits direct children.
//! * `visit_pre` recursively visits all nodes in pre-order.
//! * `try_transform` rebuilds the tree top-down, letting a callback replace any node; nodes
//!   the callback declines are rebuilt from their transformed children.

use crate::expr::ScalarExpr;

impl ScalarExpr {
    /// Applies `f` to each direct child.
    pub fn visit_children<F>(&self, mut f: F)
    where
        F: FnMut(&ScalarExpr),
    {
        match self {
            ScalarExpr::TupleAccess(_) | ScalarExpr::Literal(_) | ScalarExpr::Parameter(_) => {}
            ScalarExpr::Unary { expr, .. }
            | ScalarExpr::Cast { expr, .. }
            | ScalarExpr::Trim { expr, .. } => f(expr),
            ScalarExpr::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            ScalarExpr::Function { args, .. } => args.iter().for_each(f),
            ScalarExpr::Case {
                branches,
                otherwise,
            } => {
                for (when, then) in branches {
                    f(when);
                    f(then);
                }
                if let Some(e) = otherwise {
                    f(e);
                }
            }
        }
    }

    /// Recursively applies `f` to this node and all its descendants, parents first.
    pub fn visit_pre<F>(&self, f: &mut F)
    where
        F: FnMut(&ScalarExpr),
    {
        f(self);
        self.visit_children(|child| child.visit_pre(f));
    }

    /// Rebuilds this tree top-down.
    ///
    /// `f` is offered every node before its children; returning `Some` replaces the node
    /// (the replacement is not visited again), returning `None` keeps the node and continues
    /// into its children.
    pub fn try_transform<F, E>(&self, f: &mut F) -> Result<ScalarExpr, E>
    where
        F: FnMut(&ScalarExpr) -> Result<Option<ScalarExpr>, E>,
    {
        if let Some(replacement) = f(self)? {
            return Ok(replacement);
        }

        let rebuilt = match self {
            ScalarExpr::TupleAccess(_) | ScalarExpr::Literal(_) | ScalarExpr::Parameter(_) => {
                self.clone()
            }
            ScalarExpr::Unary { op, expr } => ScalarExpr::Unary {
                op: *op,
                expr: Box::new(expr.try_transform(f)?),
            },
            ScalarExpr::Binary { op, left, right } => ScalarExpr::Binary {
                op: *op,
                left: Box::new(left.try_transform(f)?),
                right: Box::new(right.try_transform(f)?),
            },
            ScalarExpr::Function { function, args } => ScalarExpr::Function {
                function: *function,
                args: args
                    .iter()
                    .map(|a| a.try_transform(f))
                    .collect::<Result<Vec<_>, E>>()?,
            },
            ScalarExpr::Cast { expr, data_type } => ScalarExpr::Cast {
                expr: Box::new(expr.try_transform(f)?),
                data_type: data_type.clone(),
            },
            ScalarExpr::Trim {
                expr,
                kind,
                characters,
            } => ScalarExpr::Trim {
                expr: Box::new(expr.try_transform(f)?),
                kind: *kind,
                characters: characters.clone(),
            },
            ScalarExpr::Case {
                branches,
                otherwise,
            } => ScalarExpr::Case {
                branches: branches
                    .iter()
                    .map(|(when, then)| Ok((when.try_transform(f)?, then.try_transform(f)?)))
                    .collect::<Result<Vec<_>, E>>()?,
                otherwise: match otherwise {
                    Some(e) => Some(Box::new(e.try_transform(f)?)),
                    None => None,
                },
            },
        };

        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::{col, func, lit, ScalarExpr, ScalarFunction};
    use std::convert::Infallible;

    #[test]
    fn test_visit_pre_order() {
        let expr = func(ScalarFunction::Upper, vec![col(1)]).eq(lit("A"));
        let mut seen = vec![];
        expr.visit_pre(&mut |e| seen.push(e.to_string()));
        assert_eq!(
            vec!["(Upper(#1) = A)", "Upper(#1)", "#1", "A"],
            seen
        );
    }

    #[test]
    fn test_transform_replaces_leaves_only() {
        let expr = col(0).plus(lit(1i64)).gt(col(2));
        let rewritten = expr
            .try_transform::<_, Infallible>(&mut |e| {
                Ok(match e {
                    ScalarExpr::Literal(_) => Some(lit(2i64)),
                    _ => None,
                })
            })
            .unwrap();
        assert_eq!(col(0).plus(lit(2i64)).gt(col(2)), rewritten);
    }
}
