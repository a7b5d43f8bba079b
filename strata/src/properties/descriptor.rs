use enumset::{EnumSet, EnumSetType};

use crate::operator::{Operator, ProviderKind};

#[derive(EnumSetType, Debug)]
pub enum OrderingTrait {
    /// Establishes a new order regardless of its source's.
    IsSorter,
    /// Passes its source's order through, remapped through its own columns.
    PreservesOrder,
    /// Order is undefined past this operator.
    BreaksOrder,
    /// Produces a different result when its source's order changes.
    IsOrderSensitive,
}

/// Static ordering classification of an operator kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrderingDescriptor {
    traits: EnumSet<OrderingTrait>,
}

impl OrderingDescriptor {
    pub fn new(traits: EnumSet<OrderingTrait>) -> Self {
        Self { traits }
    }

    pub fn is_sorter(&self) -> bool {
        self.traits.contains(OrderingTrait::IsSorter)
    }

    pub fn preserves_order(&self) -> bool {
        self.traits.contains(OrderingTrait::PreservesOrder)
    }

    pub fn breaks_order(&self) -> bool {
        self.traits.contains(OrderingTrait::BreaksOrder)
    }

    pub fn is_order_sensitive(&self) -> bool {
        self.traits.contains(OrderingTrait::IsOrderSensitive)
    }
}

/// Looks up the ordering descriptor of an operator.
pub type DescriptorResolver = fn(&Operator) -> OrderingDescriptor;

/// Resolver used unless the caller supplies another one.
pub fn default_ordering_descriptor(operator: &Operator) -> OrderingDescriptor {
    kind_ordering_descriptor(operator.kind())
}

pub fn kind_ordering_descriptor(kind: ProviderKind) -> OrderingDescriptor {
    use OrderingTrait::*;
    use ProviderKind::*;

    let traits = match kind {
        Index | Seek | Sort => IsSorter.into(),
        Raw | Void | FreeText | ContainsTable => BreaksOrder.into(),
        Store | Distinct | Aggregate | Existence | Union | Concat | Except | Intersect => {
            BreaksOrder.into()
        }
        Select | Filter | Calculate | Lock | Tag | IndexHint | Include | Join | PredicateJoin
        | Apply => PreservesOrder.into(),
        Paging | Skip | Take | RowNumber => PreservesOrder | IsOrderSensitive,
    };

    OrderingDescriptor::new(traits)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_every_kind_has_one_base_trait() {
        for kind in ProviderKind::iter() {
            let d = kind_ordering_descriptor(kind);
            let base = [d.is_sorter(), d.preserves_order(), d.breaks_order()]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(1, base, "{}", kind);
            if d.is_order_sensitive() {
                assert!(d.preserves_order(), "{}", kind);
            }
        }
    }

    #[test]
    fn test_paging_kinds_are_order_sensitive() {
        for kind in [
            ProviderKind::Paging,
            ProviderKind::Skip,
            ProviderKind::Take,
            ProviderKind::RowNumber,
        ] {
            assert!(kind_ordering_descriptor(kind).is_order_sensitive());
        }
        assert!(!kind_ordering_descriptor(ProviderKind::Filter).is_order_sensitive());
    }
}
