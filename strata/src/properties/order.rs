use std::fmt::{Display, Formatter};

use itertools::Itertools;
use strum_macros::AsRefStr;

use crate::properties::PhysicalProp;
use crate::utils::ColumnMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering of one column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ordering {
    pub column: usize,
    pub direction: Direction,
}

impl Ordering {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }
}

/// Ordering property specification: rows are sorted by the first key, ties broken by the
/// next one and so on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct OrderSpec {
    orders: Vec<Ordering>,
}

impl OrderSpec {
    pub fn new<I: IntoIterator<Item = Ordering>>(orders: I) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Ordering] {
        &self.orders
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.orders.iter().map(|o| o.column)
    }

    /// Shifts every key by `offset`, used for the right side of binary operators.
    pub fn offset(&self, offset: usize) -> OrderSpec {
        OrderSpec::new(self.orders.iter().map(|o| Ordering {
            column: o.column + offset,
            direction: o.direction,
        }))
    }

    /// Keys of `self` followed by keys of `other`.
    pub fn then(&self, other: &OrderSpec) -> OrderSpec {
        OrderSpec::new(self.orders.iter().chain(other.orders.iter()).copied())
    }

    /// Remaps keys through `mapping`, stopping at the first key that did not survive.
    ///
    /// Returns the remapped prefix and whether any key was lost.
    pub fn remap(&self, mapping: &ColumnMap) -> (OrderSpec, bool) {
        let remapped = self
            .orders
            .iter()
            .map_while(|o| {
                mapping.get(o.column).map(|column| Ordering {
                    column,
                    direction: o.direction,
                })
            })
            .collect::<Vec<_>>();
        let lost = remapped.len() < self.orders.len();
        (OrderSpec { orders: remapped }, lost)
    }
}

impl PhysicalProp for OrderSpec {
    /// `self` satisfies `required` when `required` is a prefix of `self`.
    fn satisfies(&self, required: &Self) -> bool {
        required.orders.len() <= self.orders.len()
            && self
                .orders
                .iter()
                .zip(required.orders.iter())
                .all(|(a, b)| a == b)
    }
}

impl Display for OrderSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}]",
            self.orders
                .iter()
                .map(|o| format!("#{} {}", o.column, o.direction.as_ref()))
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_satisfies_prefix() {
        let established = OrderSpec::new(vec![Ordering::asc(0), Ordering::desc(2)]);
        assert!(established.satisfies(&OrderSpec::new(vec![Ordering::asc(0)])));
        assert!(established.satisfies(&OrderSpec::empty()));
        assert!(!established.satisfies(&OrderSpec::new(vec![Ordering::desc(0)])));
        assert!(!OrderSpec::empty().satisfies(&established));
    }

    #[test]
    fn test_remap_truncates_at_lost_key() {
        let order = OrderSpec::new(vec![Ordering::asc(0), Ordering::asc(1), Ordering::asc(2)]);
        let (remapped, lost) = order.remap(&ColumnMap::dense(3, &[0, 2]));
        assert!(lost);
        assert_eq!(OrderSpec::new(vec![Ordering::asc(0)]), remapped);
    }

    #[test]
    fn test_display() {
        let order = OrderSpec::new(vec![Ordering::asc(0)]).then(&OrderSpec::new(vec![Ordering::desc(0)]).offset(3));
        assert_eq!("[#0 Asc, #3 Desc]", order.to_string());
    }
}
