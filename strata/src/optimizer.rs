use log::debug;

use crate::error::StrataResult;
use crate::properties::{default_ordering_descriptor, DescriptorResolver};
use crate::provider::ProviderRef;
use crate::rewrite::{ColumnPruner, OrderingRewriter};
use crate::utils::{ColumnMap, ColumnSet};

/// Context for optimization: which passes run and how operators are classified.
#[derive(Clone)]
pub struct OptimizerContext {
    pub prune: bool,
    pub order: bool,
    pub resolver: DescriptorResolver,
}

impl Default for OptimizerContext {
    fn default() -> Self {
        Self {
            prune: true,
            order: true,
            resolver: default_ordering_descriptor,
        }
    }
}

/// Rewritten tree plus where each originally demanded root column ended up.
#[derive(Clone, Debug)]
pub struct OptimizedPlan {
    pub provider: ProviderRef,
    pub column_map: ColumnMap,
}

/// Runs pruning, then ordering preservation.
///
/// Pruning keeps the order keys of order-sensitive operators, so the ordering pass still
/// sees every key it has to check.
pub struct Optimizer {
    context: OptimizerContext,
}

impl Optimizer {
    pub fn new(context: OptimizerContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &OptimizerContext {
        &self.context
    }

    pub fn optimize(&self, root: &ProviderRef, demand: &ColumnSet) -> StrataResult<OptimizedPlan> {
        debug!(
            "Optimizing {} rooted tree of {} nodes, demand {:?}",
            root.kind(),
            root.node_count(),
            demand
        );

        let (provider, column_map) = if self.context.prune {
            let pruned = ColumnPruner::new().prune(root, demand)?;
            (pruned.provider, pruned.column_map)
        } else {
            (root.clone(), ColumnMap::identity(root.header().len()))
        };

        let provider = if self.context.order {
            OrderingRewriter::new(self.context.resolver).rewrite(&provider)?
        } else {
            provider
        };

        debug!(
            "Optimized into {} nodes, columns {}",
            provider.node_count(),
            column_map
        );
        Ok(OptimizedPlan {
            provider,
            column_map,
        })
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(OptimizerContext::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use maplit::btreeset;

    use super::*;
    use crate::expr::{col, lit};
    use crate::properties::Ordering;
    use crate::provider::{explain_to_string, ProviderBuilder};
    use crate::test_utils::customers;

    #[test]
    fn test_prune_then_order() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(2)])
            .distinct()
            .sort(vec![Ordering::desc(3)])
            .filter(col(1).eq(lit("Ann")))
            .paging(0u64, 10u64)
            .select(vec![0])
            .build()
            .unwrap();

        let plan = Optimizer::default().optimize(&root, &btreeset! {0}).unwrap();

        let expected = "\
Select { columns: [0] }
└─ Paging { skip: 0, take: 10 }
   └─ Filter { predicate: (#1 = Ann) }
      └─ Sort { order: [#3 Desc] }
         └─ Distinct
            └─ Index { index: \"customers_pk\", table: \"customers\" }
";
        assert_eq!(expected, explain_to_string(&plan.provider).unwrap());
        assert_eq!("[0->0]", plan.column_map.to_string());
    }

    #[test]
    fn test_disabled_passes_return_input() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(1)])
            .distinct()
            .build()
            .unwrap();
        let optimizer = Optimizer::new(OptimizerContext {
            prune: false,
            order: false,
            ..Default::default()
        });
        let plan = optimizer.optimize(&root, &btreeset! {0}).unwrap();
        assert!(Arc::ptr_eq(&root, &plan.provider));
        assert!(plan.column_map.is_identity());
    }
}
