use std::fmt::Formatter;

use crate::error::StrataResult;
use crate::operator::{check_columns, DisplayFields, OperatorTrait, ProviderKind};
use crate::properties::OrderSpec;
use crate::provider::{Header, ProviderRef};

/// Sorts the source tuples.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sort {
    order: OrderSpec,
}

impl Sort {
    pub fn new(order: OrderSpec) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &OrderSpec {
        &self.order
    }
}

impl OperatorTrait for Sort {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let source = sources[0].header();
        if self.order.is_empty() {
            malformed!(ProviderKind::Sort, "empty sort order");
        }
        check_columns(
            ProviderKind::Sort,
            self.order.orders().iter().map(|o| &o.column),
            source.len(),
        )?;
        Ok(source.pass_through(0).with_order(self.order.clone()))
    }
}

impl DisplayFields for Sort {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("order", &format_args!("{}", self.order))
            .finish()
    }
}
