use std::fmt::Formatter;

use crate::error::StrataResult;
use crate::operator::{DisplayFields, OperatorTrait, ProviderKind};
use crate::properties::OrderSpec;
use crate::provider::{Header, ProviderRef};

/// Header of a set operation: the left columns, once both sides are checked to have the
/// same layout.
fn set_header(kind: ProviderKind, sources: &[ProviderRef]) -> StrataResult<Header> {
    let left = sources[0].header();
    let right = sources[1].header();
    if left.tuple_descriptor() != right.tuple_descriptor() {
        malformed!(
            kind,
            "sides have different layouts: {:?} and {:?}",
            left.tuple_descriptor().types(),
            right.tuple_descriptor().types()
        );
    }
    Ok(left.pass_through(0).with_order(OrderSpec::empty()))
}

macro_rules! set_operator {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name {}

        impl $name {
            pub fn new() -> Self {
                Self {}
            }
        }

        impl OperatorTrait for $name {
            fn arity(&self) -> usize {
                2
            }

            fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
                set_header(ProviderKind::$name, sources)
            }
        }

        impl DisplayFields for $name {
            fn display(&self, _f: &mut Formatter) -> std::fmt::Result {
                Ok(())
            }
        }
    };
}

set_operator!(
    /// Distinct tuples of either side.
    Union
);
set_operator!(
    /// All tuples of the left side followed by all tuples of the right side.
    Concat
);
set_operator!(
    /// Distinct left tuples absent from the right side.
    Except
);
set_operator!(
    /// Distinct tuples present on both sides.
    Intersect
);
