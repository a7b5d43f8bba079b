use std::fmt::Formatter;

use crate::error::StrataResult;
use crate::expr::ScalarExpr;
use crate::operator::{check_expr, DisplayFields, OperatorTrait, ProviderKind};
use crate::provider::{Header, ProviderRef};

/// Keeps the source tuples for which `predicate` is true.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
    predicate: ScalarExpr,
}

impl Filter {
    pub fn new(predicate: ScalarExpr) -> Self {
        Self { predicate }
    }

    pub fn predicate(&self) -> &ScalarExpr {
        &self.predicate
    }
}

impl OperatorTrait for Filter {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let source = sources[0].header();
        check_expr(ProviderKind::Filter, &self.predicate, source.len())?;
        Ok(source.pass_through(0))
    }

    fn expressions(&self) -> Vec<&ScalarExpr> {
        vec![&self.predicate]
    }
}

impl DisplayFields for Filter {
    fn display(&self, fmt: &mut Formatter) -> std::fmt::Result {
        fmt.debug_struct("")
            .field("predicate", &format_args!("{}", self.predicate))
            .finish()
    }
}
