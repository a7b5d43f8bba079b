use std::fmt::Formatter;

use itertools::Itertools;
use strum_macros::AsRefStr;

use crate::error::StrataResult;
use crate::expr::{ApplyParameter, ScalarExpr};
use crate::operator::{check_expr, DisplayFields, OperatorTrait, ProviderKind};
use crate::provider::{Header, ProviderRef};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum JoinType {
    Inner,
    LeftOuter,
}

/// Equi-join on pairs of (left column, right column).
///
/// Right column indexes are positions in the right source's own header.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Join {
    join_type: JoinType,
    equal_columns: Vec<(usize, usize)>,
}

impl Join {
    pub fn new(join_type: JoinType, equal_columns: Vec<(usize, usize)>) -> Self {
        Self {
            join_type,
            equal_columns,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn equal_columns(&self) -> &[(usize, usize)] {
        &self.equal_columns
    }
}

impl OperatorTrait for Join {
    fn arity(&self) -> usize {
        2
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let left = sources[0].header();
        let right = sources[1].header();
        if self.equal_columns.is_empty() {
            malformed!(ProviderKind::Join, "no equality columns");
        }
        for (l, r) in &self.equal_columns {
            if *l >= left.len() || *r >= right.len() {
                malformed!(
                    ProviderKind::Join,
                    "equality #{} = #{} is out of range for {} and {} columns",
                    l,
                    r,
                    left.len(),
                    right.len()
                );
            }
        }
        Ok(left.join(right))
    }
}

impl DisplayFields for Join {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("join_type", &self.join_type)
            .field(
                "equal_columns",
                &format_args!(
                    "[{}]",
                    self.equal_columns
                        .iter()
                        .map(|(l, r)| format!("#{} = #{}", l, r))
                        .join(", ")
                ),
            )
            .finish()
    }
}

/// Join on an arbitrary predicate over the combined tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PredicateJoin {
    join_type: JoinType,
    predicate: ScalarExpr,
}

impl PredicateJoin {
    pub fn new(join_type: JoinType, predicate: ScalarExpr) -> Self {
        Self {
            join_type,
            predicate,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn predicate(&self) -> &ScalarExpr {
        &self.predicate
    }
}

impl OperatorTrait for PredicateJoin {
    fn arity(&self) -> usize {
        2
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let header = sources[0].header().join(sources[1].header());
        check_expr(ProviderKind::PredicateJoin, &self.predicate, header.len())?;
        Ok(header)
    }

    fn expressions(&self) -> Vec<&ScalarExpr> {
        vec![&self.predicate]
    }
}

impl DisplayFields for PredicateJoin {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("join_type", &self.join_type)
            .field("predicate", &format_args!("{}", self.predicate))
            .finish()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum ApplyType {
    /// Outer tuples joined with every inner tuple computed for them.
    Cross,
    /// Like `Cross`, keeping outer tuples with no inner tuple.
    Outer,
    /// Outer tuples for which the inner relation is not empty.
    Existing,
    /// Outer tuples for which the inner relation is empty.
    NotExisting,
}

impl ApplyType {
    /// Whether the inner columns are part of the output.
    pub fn produces_inner(&self) -> bool {
        matches!(self, ApplyType::Cross | ApplyType::Outer)
    }
}

/// Correlated evaluation of the right source once per tuple of the left source.
///
/// The right sub-tree reads the current left tuple through `parameter`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Apply {
    parameter: ApplyParameter,
    apply_type: ApplyType,
}

impl Apply {
    pub fn new(parameter: ApplyParameter, apply_type: ApplyType) -> Self {
        Self {
            parameter,
            apply_type,
        }
    }

    pub fn parameter(&self) -> ApplyParameter {
        self.parameter
    }

    pub fn apply_type(&self) -> ApplyType {
        self.apply_type
    }
}

impl OperatorTrait for Apply {
    fn arity(&self) -> usize {
        2
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let left = sources[0].header();
        if self.apply_type.produces_inner() {
            Ok(left.join(sources[1].header()))
        } else {
            Ok(left.pass_through(0))
        }
    }
}

impl DisplayFields for Apply {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("parameter", &format_args!("{}", self.parameter))
            .field("apply_type", &self.apply_type)
            .finish()
    }
}
