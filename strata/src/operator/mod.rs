//! Relational operators of the provider tree.
//!
//! Each operator kind is a struct holding its own parameters. [`Operator`] is the closed sum
//! of all kinds; passes match on it exhaustively. Header derivation and parameter display are
//! dispatched through [`OperatorTrait`] and [`DisplayFields`].

use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use strum_macros::{AsRefStr, EnumDiscriminants, EnumIter};

use crate::error::StrataResult;
use crate::expr::ScalarExpr;
use crate::provider::{Header, ProviderRef};

mod aggregate;
mod filter;
mod join;
mod limit;
mod misc;
mod projection;
mod set;
mod sort;
mod source;

pub use aggregate::*;
pub use filter::*;
pub use join::*;
pub use limit::*;
pub use misc::*;
pub use projection::*;
pub use set::*;
pub use sort::*;
pub use source::*;

/// Operator of one provider node, with its kind-specific parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner, EnumDiscriminants)]
#[strum_discriminants(name(ProviderKind))]
#[strum_discriminants(derive(Hash, AsRefStr, EnumIter))]
#[enum_dispatch]
pub enum Operator {
    Index(IndexScan),
    Seek(IndexSeek),
    Raw(RawValues),
    Store(Store),
    Select(Select),
    Filter(Filter),
    Sort(Sort),
    Join(Join),
    PredicateJoin(PredicateJoin),
    Apply(Apply),
    Aggregate(Aggregate),
    Calculate(Calculate),
    Distinct(Distinct),
    RowNumber(RowNumber),
    Paging(Paging),
    Skip(Skip),
    Take(Take),
    Existence(Existence),
    Intersect(Intersect),
    Except(Except),
    Concat(Concat),
    Union(Union),
    Lock(Lock),
    Include(Include),
    Tag(Tag),
    IndexHint(IndexHint),
    FreeText(FreeText),
    ContainsTable(ContainsTable),
    Void(Void),
}

impl Operator {
    pub fn kind(&self) -> ProviderKind {
        ProviderKind::from(self)
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())?;
        self.display(f)
    }
}

#[enum_dispatch(Operator)]
pub trait OperatorTrait {
    /// Number of sources this operator consumes.
    fn arity(&self) -> usize;

    /// Computes the output header from the sources' headers.
    ///
    /// `sources` always has exactly [`OperatorTrait::arity`] entries.
    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header>;

    /// Scalar expressions owned by this operator.
    fn expressions(&self) -> Vec<&ScalarExpr> {
        vec![]
    }
}

#[enum_dispatch(Operator)]
pub trait DisplayFields {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result;
}

/// Checks that every column index is inside a header of `len` columns.
pub(crate) fn check_columns<'a, I>(kind: ProviderKind, columns: I, len: usize) -> StrataResult<()>
where
    I: IntoIterator<Item = &'a usize>,
{
    for c in columns {
        if *c >= len {
            malformed!(kind, "column #{} is out of range for {} columns", c, len);
        }
    }
    Ok(())
}

/// Checks that an expression only reads slots of a tuple of `len` columns.
pub(crate) fn check_expr(kind: ProviderKind, expr: &ScalarExpr, len: usize) -> StrataResult<()> {
    check_columns(kind, crate::expr::gather(expr).iter(), len)
}
