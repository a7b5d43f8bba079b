//! Scalar expressions embedded in predicates, calculated columns and seek keys.
//!
//! The only construct the compiler interprets is [`TupleAccess`], a read of one slot of the
//! tuple flowing through the owning provider, optionally read through an [`ApplyParameter`]
//! from the outer tuple of an enclosing `Apply`. Everything else is carried through
//! rewrites untouched; see [`visit`] for the traversal helpers and [`tuple_access`] for the
//! gatherer and rewriter built on top of them.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};

use arrow_schema::DataType;
use datafusion_common::ScalarValue;
use enum_as_inner::EnumAsInner;
use itertools::Itertools;
use strum_macros::AsRefStr;

pub mod tuple_access;
pub mod visit;

pub use tuple_access::*;

static NEXT_APPLY_PARAMETER: AtomicU32 = AtomicU32::new(1);

/// Correlation token of one `Apply`.
///
/// Minted when the `Apply` is built and only referenced from its inner (right) sub-tree.
#[derive(Copy, Clone, Debug, derive_more::Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display(fmt = "${}", _0)]
pub struct ApplyParameter(u32);

impl ApplyParameter {
    /// Mints a token that is distinct from every token minted before in this process.
    pub fn next() -> Self {
        ApplyParameter(NEXT_APPLY_PARAMETER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Read of slot `index` of the current tuple, or of the outer tuple seen through
/// `parameter`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleAccess {
    pub index: usize,
    pub parameter: Option<ApplyParameter>,
}

impl Display for TupleAccess {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.parameter {
            Some(p) => write!(f, "{}.#{}", p, self.index),
            None => write!(f, "#{}", self.index),
        }
    }
}

/// Placeholder for a value supplied by the caller at execution time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryParameter {
    pub name: String,
    pub data_type: DataType,
}

impl QueryParameter {
    pub fn new<S: Into<String>>(name: S, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum UnaryOperator {
    Not,
    Negate,
    IsNull,
    IsNotNull,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Like,
    StringConcat,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Like => "LIKE",
            BinaryOperator::StringConcat => "||",
        }
    }
}

/// Scalar functions whose spelling differs between target dialects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum ScalarFunction {
    Upper,
    Lower,
    Length,
    Substring,
    Replace,
    Abs,
    Round,
    Coalesce,
    CurrentTimestamp,
    Year,
    Month,
    Day,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum TrimKind {
    Both,
    Leading,
    Trailing,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner)]
pub enum ScalarExpr {
    TupleAccess(TupleAccess),
    Literal(ScalarValue),
    Parameter(QueryParameter),
    Unary {
        op: UnaryOperator,
        expr: Box<ScalarExpr>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    Function {
        function: ScalarFunction,
        args: Vec<ScalarExpr>,
    },
    Cast {
        expr: Box<ScalarExpr>,
        data_type: DataType,
    },
    Trim {
        expr: Box<ScalarExpr>,
        kind: TrimKind,
        characters: Option<String>,
    },
    Case {
        branches: Vec<(ScalarExpr, ScalarExpr)>,
        otherwise: Option<Box<ScalarExpr>>,
    },
}

/// Reads slot `index` of the current tuple.
pub fn col(index: usize) -> ScalarExpr {
    ScalarExpr::TupleAccess(TupleAccess {
        index,
        parameter: None,
    })
}

/// Reads slot `index` of the outer tuple bound to `parameter`.
pub fn outer_col(parameter: ApplyParameter, index: usize) -> ScalarExpr {
    ScalarExpr::TupleAccess(TupleAccess {
        index,
        parameter: Some(parameter),
    })
}

pub fn lit<V: Into<ScalarValue>>(value: V) -> ScalarExpr {
    ScalarExpr::Literal(value.into())
}

pub fn param<S: Into<String>>(name: S, data_type: DataType) -> ScalarExpr {
    ScalarExpr::Parameter(QueryParameter::new(name, data_type))
}

pub fn func<I: IntoIterator<Item = ScalarExpr>>(function: ScalarFunction, args: I) -> ScalarExpr {
    ScalarExpr::Function {
        function,
        args: args.into_iter().collect(),
    }
}

pub fn binary(left: ScalarExpr, op: BinaryOperator, right: ScalarExpr) -> ScalarExpr {
    ScalarExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

impl ScalarExpr {
    pub fn eq(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::Eq, other)
    }

    pub fn not_eq(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::NotEq, other)
    }

    pub fn lt(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::Lt, other)
    }

    pub fn gt(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::Gt, other)
    }

    pub fn gt_eq(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::GtEq, other)
    }

    pub fn and(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::And, other)
    }

    pub fn or(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::Or, other)
    }

    pub fn plus(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::Plus, other)
    }

    pub fn like(self, other: ScalarExpr) -> ScalarExpr {
        binary(self, BinaryOperator::Like, other)
    }

    pub fn is_null(self) -> ScalarExpr {
        ScalarExpr::Unary {
            op: UnaryOperator::IsNull,
            expr: Box::new(self),
        }
    }

    pub fn not(self) -> ScalarExpr {
        ScalarExpr::Unary {
            op: UnaryOperator::Not,
            expr: Box::new(self),
        }
    }

    pub fn cast(self, data_type: DataType) -> ScalarExpr {
        ScalarExpr::Cast {
            expr: Box::new(self),
            data_type,
        }
    }

    pub fn trim(self, kind: TrimKind, characters: Option<&str>) -> ScalarExpr {
        ScalarExpr::Trim {
            expr: Box::new(self),
            kind,
            characters: characters.map(str::to_string),
        }
    }
}

impl Display for ScalarExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarExpr::TupleAccess(access) => write!(f, "{}", access),
            ScalarExpr::Literal(value) => write!(f, "{}", value),
            ScalarExpr::Parameter(p) => write!(f, "@{}", p.name),
            ScalarExpr::Unary { op, expr } => match op {
                UnaryOperator::Not => write!(f, "NOT {}", expr),
                UnaryOperator::Negate => write!(f, "-{}", expr),
                UnaryOperator::IsNull => write!(f, "{} IS NULL", expr),
                UnaryOperator::IsNotNull => write!(f, "{} IS NOT NULL", expr),
            },
            ScalarExpr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            ScalarExpr::Function { function, args } => {
                write!(f, "{}({})", function.as_ref(), args.iter().join(", "))
            }
            ScalarExpr::Cast { expr, data_type } => write!(f, "CAST({} AS {})", expr, data_type),
            ScalarExpr::Trim {
                expr,
                kind,
                characters,
            } => match characters {
                Some(c) => write!(f, "Trim{}({}, {:?})", kind.as_ref(), expr, c),
                None => write!(f, "Trim{}({})", kind.as_ref(), expr),
            },
            ScalarExpr::Case {
                branches,
                otherwise,
            } => {
                write!(f, "CASE")?;
                for (when, then) in branches {
                    write!(f, " WHEN {} THEN {}", when, then)?;
                }
                if let Some(e) = otherwise {
                    write!(f, " ELSE {}", e)?;
                }
                write!(f, " END")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_parameters_are_distinct() {
        let first = ApplyParameter::next();
        let second = ApplyParameter::next();
        assert_ne!(first, second);
    }

    #[test]
    fn test_display() {
        let p = ApplyParameter(7);
        let expr = col(1)
            .eq(outer_col(p, 2))
            .and(col(0).is_null().not());
        assert_eq!("((#1 = $7.#2) AND NOT #0 IS NULL)", expr.to_string());
    }
}
