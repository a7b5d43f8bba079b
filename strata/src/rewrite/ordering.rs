//! Ordering preservation.
//!
//! Walks the tree depth first, computing for every node the order its output is known to be
//! in (the established order) and what its consumer needs:
//!
//! * an explicit `Sort` whose consumer does not depend on order is dead and removed, and so is
//!   a `Sort` whose source is already in its order;
//! * a node that breaks order hides any order below it from its consumers;
//! * an order-sensitive node needs its source in the order declared by that source's header;
//!   if the established order does not satisfy it a `Sort` is inserted right below the node;
//! * a node that preserves order remaps the established order through its own columns. Losing
//!   an order key there is an error when an order-sensitive consumer depends on it, and a
//!   plain truncation otherwise.
//!
//! The classification of each operator comes from a [`DescriptorResolver`].

use std::sync::Arc;

use log::{debug, trace};

use crate::error::{StrataError, StrataResult};
use crate::operator::*;
use crate::properties::{default_ordering_descriptor, DescriptorResolver, OrderSpec, PhysicalProp};
use crate::provider::{Provider, ProviderRef};
use crate::utils::{ColumnMap, NodePath};

/// What the consumer of a node needs from the order of its output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum OrderRequirement {
    /// The consumer ignores order.
    None,
    /// The order is kept when possible; the root of the tree is such a consumer.
    Preferred,
    /// An order-sensitive consumer depends on the order.
    Required,
}

struct Ordered {
    provider: ProviderRef,
    established: OrderSpec,
}

pub struct OrderingRewriter {
    resolver: DescriptorResolver,
}

impl Default for OrderingRewriter {
    fn default() -> Self {
        Self::new(default_ordering_descriptor)
    }
}

impl OrderingRewriter {
    pub fn new(resolver: DescriptorResolver) -> Self {
        Self { resolver }
    }

    pub fn rewrite(&self, root: &ProviderRef) -> StrataResult<ProviderRef> {
        let ordered = self.visit(root, OrderRequirement::Preferred, &NodePath::root())?;
        Ok(ordered.provider)
    }

    fn visit(
        &self,
        node: &ProviderRef,
        requirement: OrderRequirement,
        path: &NodePath,
    ) -> StrataResult<Ordered> {
        if let Operator::Sort(sort) = node.operator() {
            return self.sort(node, sort, requirement, path);
        }

        let descriptor = (self.resolver)(node.operator());
        let source_requirement = if descriptor.is_order_sensitive() {
            OrderRequirement::Required
        } else if descriptor.preserves_order() {
            requirement
        } else {
            OrderRequirement::None
        };

        let mut sources = Vec::with_capacity(node.sources().len());
        for (idx, source) in node.sources().iter().enumerate() {
            let path = path.child(idx);
            let mut ordered = self.visit(source, source_requirement, &path)?;
            let required = source.header().order();
            if descriptor.is_order_sensitive() && !ordered.established.satisfies(required) {
                debug!(
                    "Inserting sort {} at {} for {}",
                    required,
                    path,
                    node.kind()
                );
                ordered = Ordered {
                    provider: Provider::unary(Sort::new(required.clone()), ordered.provider)?,
                    established: required.clone(),
                };
            }
            sources.push(ordered);
        }

        let provider = Provider::with_sources(node, sources.iter().map(|s| s.provider.clone()))?;
        let established = if descriptor.is_sorter() {
            provider.header().order().clone()
        } else if descriptor.breaks_order() {
            OrderSpec::empty()
        } else {
            let (order, lost) = propagate_order(node, &sources);
            if lost && requirement == OrderRequirement::Required {
                return Err(StrataError::ordering(
                    node.kind(),
                    path,
                    format!(
                        "order {} of the source is required above but only {} survives",
                        sources[0].established, order
                    ),
                ));
            }
            order
        };
        trace!("{} at {} establishes {}", node.kind(), path, established);

        Ok(Ordered {
            provider,
            established,
        })
    }

    fn sort(
        &self,
        node: &ProviderRef,
        sort: &Sort,
        requirement: OrderRequirement,
        path: &NodePath,
    ) -> StrataResult<Ordered> {
        let source = self.visit(&node.sources()[0], OrderRequirement::None, &path.child(0))?;

        if requirement == OrderRequirement::None {
            debug!("Removing sort {} at {}: order is not used", sort.order(), path);
            return Ok(source);
        }
        if source.established.satisfies(sort.order()) {
            debug!(
                "Removing sort {} at {}: source is already in {}",
                sort.order(),
                path,
                source.established
            );
            return Ok(source);
        }

        let provider = if Arc::ptr_eq(&source.provider, &node.sources()[0]) {
            Arc::clone(node)
        } else {
            Provider::with_sources(node, [source.provider])?
        };
        Ok(Ordered {
            provider,
            established: sort.order().clone(),
        })
    }
}

/// Order of the output of `node` given the established orders of its sources, and whether
/// some source order key is not part of it.
fn propagate_order(node: &ProviderRef, sources: &[Ordered]) -> (OrderSpec, bool) {
    let first = || sources[0].established.clone();
    let combined = || {
        let left = &sources[0];
        let right = sources[1]
            .established
            .offset(left.provider.header().len());
        left.established.then(&right)
    };

    match node.operator() {
        Operator::Index(_)
        | Operator::Seek(_)
        | Operator::Raw(_)
        | Operator::Void(_)
        | Operator::FreeText(_)
        | Operator::ContainsTable(_) => (node.header().order().clone(), false),
        Operator::Sort(sort) => (sort.order().clone(), false),
        Operator::Select(select) => {
            let mut entries = vec![None; sources[0].provider.header().len()];
            for (new, old) in select.columns().iter().enumerate() {
                entries[*old] = Some(new);
            }
            sources[0]
                .established
                .remap(&ColumnMap::from_entries(entries))
        }
        Operator::Aggregate(aggregate) => {
            let mut entries = vec![None; sources[0].provider.header().len()];
            for (new, old) in aggregate.group_columns().iter().enumerate() {
                if entries[*old].is_none() {
                    entries[*old] = Some(new);
                }
            }
            sources[0]
                .established
                .remap(&ColumnMap::from_entries(entries))
        }
        Operator::Filter(_)
        | Operator::Calculate(_)
        | Operator::RowNumber(_)
        | Operator::Include(_)
        | Operator::Lock(_)
        | Operator::Tag(_)
        | Operator::IndexHint(_)
        | Operator::Paging(_)
        | Operator::Skip(_)
        | Operator::Take(_)
        | Operator::Store(_)
        | Operator::Distinct(_) => (first(), false),
        Operator::Existence(_) => (OrderSpec::empty(), !sources[0].established.is_empty()),
        Operator::Join(_) | Operator::PredicateJoin(_) => (combined(), false),
        Operator::Apply(apply) => {
            if apply.apply_type().produces_inner() {
                (combined(), false)
            } else {
                (first(), false)
            }
        }
        Operator::Union(_) | Operator::Concat(_) | Operator::Except(_) | Operator::Intersect(_) => {
            (OrderSpec::empty(), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::expr::{col, lit};
    use crate::properties::{kind_ordering_descriptor, OrderingDescriptor, OrderingTrait, Ordering};
    use crate::provider::{explain_to_string, ProviderBuilder};
    use crate::test_utils::{customers, orders};

    fn rewrite(root: &ProviderRef) -> ProviderRef {
        OrderingRewriter::default().rewrite(root).unwrap()
    }

    #[test]
    fn test_dead_sort_is_removed() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(1)])
            .distinct()
            .build()
            .unwrap();

        let expected = "\
Distinct
└─ Index { index: \"customers_pk\", table: \"customers\" }
";
        assert_eq!(expected, explain_to_string(&rewrite(&root)).unwrap());
    }

    #[test]
    fn test_redundant_sort_is_removed() {
        let scan = customers();
        let root = ProviderBuilder::from_provider(scan.clone())
            .sort(vec![Ordering::asc(0)])
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&scan, &rewrite(&root)));
    }

    #[test]
    fn test_sort_below_filter_at_root_is_kept() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::desc(3)])
            .filter(col(2).eq(lit("Oslo")))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&root, &rewrite(&root)));
    }

    #[test]
    fn test_sort_is_inserted_below_order_sensitive_consumer() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(1)])
            .distinct()
            .take(10u64)
            .build()
            .unwrap();

        let rewritten = rewrite(&root);

        let expected = "\
Take { count: 10 }
└─ Sort { order: [#1 Asc] }
   └─ Distinct
      └─ Index { index: \"customers_pk\", table: \"customers\" }
";
        assert_eq!(expected, explain_to_string(&rewritten).unwrap());
        let source = &rewritten.sources()[0];
        assert_eq!(ProviderKind::Sort, source.kind());
        assert!(source
            .header()
            .order()
            .satisfies(root.sources()[0].header().order()));
    }

    #[test]
    fn test_join_combines_orders() {
        let left = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(1)])
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(left)
            .join(JoinType::Inner, vec![(0, 1)], orders())
            .paging(0u64, 10u64)
            .build()
            .unwrap();
        assert_eq!(
            "[#1 Asc, #4 Asc]",
            root.sources()[0].header().order().to_string()
        );
        assert!(Arc::ptr_eq(&root, &rewrite(&root)));
    }

    #[test]
    fn test_losing_required_order_key_fails() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(1)])
            .select(vec![0])
            .take(1u64)
            .build()
            .unwrap();

        let err = OrderingRewriter::default().rewrite(&root).unwrap_err();
        assert!(matches!(
            err,
            StrataError::OrderingViolation {
                kind: ProviderKind::Select,
                ..
            }
        ));
        assert!(err.to_string().contains("root/0"));
    }

    #[test]
    fn test_losing_order_key_at_root_truncates() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(1)])
            .select(vec![0])
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&root, &rewrite(&root)));
    }

    #[test]
    fn test_custom_resolver() {
        // Treat filters as order breaking: the sort under the paging filter moves up.
        fn resolver(operator: &Operator) -> OrderingDescriptor {
            match operator.kind() {
                ProviderKind::Filter => OrderingDescriptor::new(OrderingTrait::BreaksOrder.into()),
                kind => kind_ordering_descriptor(kind),
            }
        }
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::desc(3)])
            .filter(col(3).gt(lit(0i64)))
            .skip(5u64)
            .build()
            .unwrap();

        let rewritten = OrderingRewriter::new(resolver).rewrite(&root).unwrap();

        let expected = "\
Skip { count: 5 }
└─ Sort { order: [#3 Desc] }
   └─ Filter { predicate: (#3 > 0) }
      └─ Index { index: \"customers_pk\", table: \"customers\" }
";
        assert_eq!(expected, explain_to_string(&rewritten).unwrap());
    }
}
