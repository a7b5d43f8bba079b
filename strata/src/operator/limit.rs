use std::fmt::{Display, Formatter};

use crate::error::StrataResult;
use crate::expr::QueryParameter;
use crate::operator::{DisplayFields, OperatorTrait};
use crate::provider::{Header, ProviderRef};

/// Row count of a paging operator: a constant or a value bound at execution time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowCount {
    Literal(u64),
    Parameter(QueryParameter),
}

impl From<u64> for RowCount {
    fn from(count: u64) -> Self {
        RowCount::Literal(count)
    }
}

impl Display for RowCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RowCount::Literal(count) => write!(f, "{}", count),
            RowCount::Parameter(p) => write!(f, "@{}", p.name),
        }
    }
}

/// Skips `skip` tuples, then yields at most `take`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Paging {
    skip: RowCount,
    take: RowCount,
}

impl Paging {
    pub fn new<S: Into<RowCount>, T: Into<RowCount>>(skip: S, take: T) -> Self {
        Self {
            skip: skip.into(),
            take: take.into(),
        }
    }

    pub fn skip(&self) -> &RowCount {
        &self.skip
    }

    pub fn take(&self) -> &RowCount {
        &self.take
    }
}

impl OperatorTrait for Paging {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for Paging {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("skip", &format_args!("{}", self.skip))
            .field("take", &format_args!("{}", self.take))
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Skip {
    count: RowCount,
}

impl Skip {
    pub fn new<C: Into<RowCount>>(count: C) -> Self {
        Self {
            count: count.into(),
        }
    }

    pub fn count(&self) -> &RowCount {
        &self.count
    }
}

impl OperatorTrait for Skip {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for Skip {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("count", &format_args!("{}", self.count))
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Take {
    count: RowCount,
}

impl Take {
    pub fn new<C: Into<RowCount>>(count: C) -> Self {
        Self {
            count: count.into(),
        }
    }

    pub fn count(&self) -> &RowCount {
        &self.count
    }
}

impl OperatorTrait for Take {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for Take {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("count", &format_args!("{}", self.count))
            .finish()
    }
}
