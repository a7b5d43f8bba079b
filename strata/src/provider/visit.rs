use crate::expr::{gather_outer, ApplyParameter};
use crate::operator::OperatorTrait;
use crate::provider::Provider;
use crate::utils::{ColumnSet, NodePath};

impl Provider {
    /// Applies `f` to every node of the tree rooted here, parents first, with the path of
    /// each node from this one.
    pub fn visit_pre<F>(&self, f: &mut F)
    where
        F: FnMut(&Provider, &NodePath),
    {
        self.visit_pre_at(&NodePath::root(), f)
    }

    fn visit_pre_at<F>(&self, path: &NodePath, f: &mut F)
    where
        F: FnMut(&Provider, &NodePath),
    {
        f(self, path);
        for (idx, source) in self.sources().iter().enumerate() {
            source.visit_pre_at(&path.child(idx), f);
        }
    }
}

/// Columns of the outer tuple bound to `parameter` read anywhere in the tree rooted at `root`.
pub fn outer_references(root: &Provider, parameter: ApplyParameter) -> ColumnSet {
    let mut columns = ColumnSet::new();
    root.visit_pre(&mut |node, _| {
        for expr in node.operator().expressions() {
            columns.extend(gather_outer(expr, parameter));
        }
    });
    columns
}

#[cfg(test)]
mod tests {
    use maplit::btreeset;

    use super::*;
    use crate::expr::{col, outer_col};
    use crate::operator::ApplyType;
    use crate::provider::ProviderBuilder;
    use crate::test_utils::{customers, orders};

    #[test]
    fn test_outer_references_of_inner_tree() {
        let p = ApplyParameter::next();
        let inner = ProviderBuilder::from_provider(orders())
            .filter(col(1).eq(outer_col(p, 0)))
            .filter(col(2).gt(outer_col(p, 3)))
            .build()
            .unwrap();
        assert_eq!(btreeset! {0, 3}, outer_references(&inner, p));
        assert!(outer_references(&inner, ApplyParameter::next()).is_empty());

        let apply = ProviderBuilder::from_provider(customers())
            .apply(p, ApplyType::Cross, inner)
            .build()
            .unwrap();
        let mut paths = vec![];
        apply.visit_pre(&mut |node, path| paths.push(format!("{} {}", path, node.kind())));
        assert_eq!(
            vec![
                "root Apply",
                "root/0 Index",
                "root/1 Filter",
                "root/1/0 Filter",
                "root/1/0/0 Index"
            ],
            paths
        );
    }
}
