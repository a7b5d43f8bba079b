use enumset::EnumSet;

use crate::dialect::{Dialect, DialectKind, Feature};

/// Standard SQL, as close to SQL:2016 as the node tree allows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenericDialect {}

impl Dialect for GenericDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Generic
    }

    fn features(&self) -> EnumSet<Feature> {
        Feature::Apply
            | Feature::RowLocks
            | Feature::ExceptIntersect
            | Feature::RowValues
            | Feature::TimeType
    }
}
