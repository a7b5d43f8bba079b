//! Column-demand pruning.
//!
//! A single top-down traversal carrying the set of columns the parent needs from each node.
//! Every node adds the columns its own logic reads, recurses, then remaps its parameters to
//! the positions its sources actually kept and reports its own old-to-new column mapping to
//! its parent.
//!
//! Rules worth knowing:
//!
//! * An empty demand is widened to the first column; a relation can't have zero columns.
//! * Leaves are never rewritten. When a leaf is asked for a strict subset of its columns, a
//!   `Select` is placed above it, except under a `Select`, which narrows the leaf itself.
//! * `Store` is a barrier: its source is demanded in full and its output is never narrowed.
//! * `Distinct`, `Union`, `Except` and `Intersect` need every column. `Concat` keeps both
//!   sides aligned to the same positional layout.
//! * A grouping `Aggregate` keeps all its group columns and only the demanded aggregates.
//! * `Apply` first gathers every column its right side reads through the correlation token,
//!   so they survive on the left, then visits the right side with the left's new mapping in
//!   scope.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use log::{debug, trace};

use crate::error::{StrataError, StrataResult};
use crate::expr::{gather, ApplyParameter, MissingColumn, ScalarExpr, TupleAccessRewriter};
use crate::operator::*;
use crate::provider::{outer_references, Provider, ProviderRef};
use crate::utils::{ColumnMap, ColumnSet, NodePath};

/// Output of the pruning pass.
#[derive(Clone, Debug)]
pub struct PruneResult {
    pub provider: ProviderRef,
    /// Maps the root columns of the input tree to the root columns of `provider`.
    pub column_map: ColumnMap,
}

struct Pruned {
    provider: ProviderRef,
    mapping: ColumnMap,
}

/// Scratch state of one traversal.
#[derive(Default)]
struct PruneContext {
    /// New column mapping of the left side of every `Apply` whose right side is being visited.
    outer: HashMap<ApplyParameter, ColumnMap>,
}

#[derive(Default)]
pub struct ColumnPruner {}

impl ColumnPruner {
    pub fn new() -> Self {
        Self {}
    }

    /// Prunes the tree rooted at `root` so that it only computes `demand` and what is needed
    /// to compute it. The root's own order keys are always kept.
    pub fn prune(&self, root: &ProviderRef, demand: &ColumnSet) -> StrataResult<PruneResult> {
        let mut demand = demand.clone();
        demand.extend(root.header().order().columns());

        let mut ctx = PruneContext::default();
        let pruned = self.visit(root, demand, &NodePath::root(), &mut ctx, true)?;

        Ok(PruneResult {
            provider: pruned.provider,
            column_map: pruned.mapping,
        })
    }

    fn visit(
        &self,
        node: &ProviderRef,
        demand: ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
        narrow_leaf: bool,
    ) -> StrataResult<Pruned> {
        let kind = node.kind();
        let len = node.header().len();
        if let Some(c) = demand.iter().find(|c| **c >= len) {
            return Err(StrataError::invariant(
                kind,
                path,
                format!("column #{} demanded from {} columns", c, len),
            ));
        }
        let demand = if demand.is_empty() && len > 0 {
            ColumnSet::from([0])
        } else {
            demand
        };
        trace!("{} at {} demands {:?}", kind, path, demand);

        let pruned = match node.operator() {
            Operator::Index(_) | Operator::Raw(_) | Operator::Void(_) => {
                self.leaf(node, node.operator().clone(), &demand, narrow_leaf)?
            }
            Operator::Seek(seek) => {
                let key = seek
                    .key()
                    .iter()
                    .map(|e| rewrite_expr(e, &ColumnMap::identity(0), ctx, kind, path))
                    .collect::<StrataResult<Vec<_>>>()?;
                self.leaf(node, seek.with_key(key).into(), &demand, narrow_leaf)?
            }
            Operator::FreeText(FreeText(search)) => {
                let search = rewrite_search(search, ctx, kind, path)?;
                self.leaf(node, FreeText(search).into(), &demand, narrow_leaf)?
            }
            Operator::ContainsTable(ContainsTable(search)) => {
                let search = rewrite_search(search, ctx, kind, path)?;
                self.leaf(node, ContainsTable(search).into(), &demand, narrow_leaf)?
            }
            Operator::Store(_) | Operator::Distinct(_) => {
                self.unary(node, (0..len).collect(), path, ctx, |_, _| {
                    Ok(node.operator().clone())
                })?
            }
            Operator::Lock(_) | Operator::Tag(_) | Operator::IndexHint(_) => {
                self.unary(node, demand.clone(), path, ctx, |_, _| {
                    Ok(node.operator().clone())
                })?
            }
            Operator::Paging(_) | Operator::Skip(_) | Operator::Take(_) => {
                let mut source_demand = demand.clone();
                source_demand.extend(node.sources()[0].header().order().columns());
                self.unary(node, source_demand, path, ctx, |_, _| {
                    Ok(node.operator().clone())
                })?
            }
            Operator::Filter(filter) => {
                let mut source_demand = demand.clone();
                source_demand.extend(gather(filter.predicate()));
                self.unary(node, source_demand, path, ctx, |mapping, ctx| {
                    let predicate = rewrite_expr(filter.predicate(), mapping, ctx, kind, path)?;
                    Ok(Filter::new(predicate).into())
                })?
            }
            Operator::Sort(sort) => {
                // Pruning runs before ordering, so keys of a sort that will turn out dead are
                // still kept here.
                let mut source_demand = demand.clone();
                source_demand.extend(sort.order().columns());
                self.unary(node, source_demand, path, ctx, |mapping, _| {
                    let (order, lost) = sort.order().remap(mapping);
                    if lost {
                        return Err(StrataError::invariant(
                            kind,
                            path,
                            format!("sort keys {} did not survive", sort.order()),
                        ));
                    }
                    Ok(Sort::new(order).into())
                })?
            }
            Operator::Select(select) => self.select(node, select, &demand, path, ctx)?,
            Operator::Calculate(calculate) => self.calculate(node, calculate, &demand, path, ctx)?,
            Operator::RowNumber(_) => self.row_number(node, &demand, path, ctx)?,
            Operator::Include(include) => self.include(node, include, &demand, path, ctx)?,
            Operator::Aggregate(aggregate) => self.aggregate(node, aggregate, &demand, path, ctx)?,
            Operator::Existence(_) => {
                let source = self.visit_source(node, 0, ColumnSet::new(), path, ctx)?;
                Pruned {
                    provider: Provider::with_sources(node, [source.provider])?,
                    mapping: ColumnMap::identity(len),
                }
            }
            Operator::Join(join) => self.join(node, join, &demand, path, ctx)?,
            Operator::PredicateJoin(join) => self.predicate_join(node, join, &demand, path, ctx)?,
            Operator::Apply(apply) => self.apply(node, apply, &demand, path, ctx)?,
            Operator::Union(_) | Operator::Except(_) | Operator::Intersect(_) => {
                self.set_operation(node, (0..len).collect(), path, ctx)?
            }
            Operator::Concat(_) => self.set_operation(node, demand.clone(), path, ctx)?,
        };

        if pruned.mapping.old_len() != len
            || pruned.mapping.new_len() != pruned.provider.header().len()
        {
            return Err(StrataError::invariant(
                kind,
                path,
                format!(
                    "mapping {} does not match {} to {} columns",
                    pruned.mapping,
                    len,
                    pruned.provider.header().len()
                ),
            ));
        }
        if let Some(c) = demand.iter().find(|c| pruned.mapping.get(**c).is_none()) {
            return Err(StrataError::invariant(
                kind,
                path,
                format!("demanded column #{} did not survive", c),
            ));
        }
        if !Arc::ptr_eq(&pruned.provider, node) {
            debug!(
                "Pruned {} at {} into {}, columns {}",
                kind,
                path,
                pruned.provider.kind(),
                pruned.mapping
            );
        }

        Ok(pruned)
    }

    fn visit_source(
        &self,
        node: &ProviderRef,
        idx: usize,
        demand: ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let narrow_leaf = node.kind() != ProviderKind::Select;
        self.visit(&node.sources()[idx], demand, &path.child(idx), ctx, narrow_leaf)
    }

    fn leaf(
        &self,
        node: &ProviderRef,
        operator: Operator,
        demand: &ColumnSet,
        narrow_leaf: bool,
    ) -> StrataResult<Pruned> {
        let provider = Provider::rebuild(node, operator, std::iter::empty())?;
        let len = provider.header().len();
        if narrow_leaf && demand.len() < len {
            let select = Select::new(demand.iter().copied().collect());
            return Ok(Pruned {
                provider: Provider::unary(select, provider)?,
                mapping: ColumnMap::dense(len, demand),
            });
        }

        Ok(Pruned {
            provider,
            mapping: ColumnMap::identity(len),
        })
    }

    /// Visits the only source of a node whose output columns are its source's columns.
    fn unary<F>(
        &self,
        node: &ProviderRef,
        source_demand: ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
        operator: F,
    ) -> StrataResult<Pruned>
    where
        F: FnOnce(&ColumnMap, &PruneContext) -> StrataResult<Operator>,
    {
        let source = self.visit_source(node, 0, source_demand, path, ctx)?;
        let operator = operator(&source.mapping, ctx)?;
        Ok(Pruned {
            provider: Provider::rebuild(node, operator, [source.provider])?,
            mapping: source.mapping,
        })
    }

    fn select(
        &self,
        node: &ProviderRef,
        select: &Select,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let kept = demand.iter().map(|c| select.columns()[*c]).collect_vec();
        let source = self.visit_source(node, 0, kept.iter().copied().collect(), path, ctx)?;
        let columns = kept
            .iter()
            .map(|c| remap_column(&source.mapping, *c, node.kind(), path))
            .collect::<StrataResult<Vec<_>>>()?;
        let mapping = ColumnMap::dense(node.header().len(), demand);

        if is_identity(&columns, &source.provider) {
            return Ok(Pruned {
                provider: source.provider,
                mapping,
            });
        }

        Ok(Pruned {
            provider: Provider::rebuild(node, Select::new(columns).into(), [source.provider])?,
            mapping,
        })
    }

    fn calculate(
        &self,
        node: &ProviderRef,
        calculate: &Calculate,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let source_len = node.sources()[0].header().len();
        let kept = (0..calculate.columns().len())
            .map(|i| demand.contains(&(source_len + i)))
            .collect_vec();

        let mut source_demand: ColumnSet = demand.range(..source_len).copied().collect();
        for (c, _) in calculate.columns().iter().zip(&kept).filter(|(_, k)| **k) {
            source_demand.extend(gather(&c.expression));
        }
        let source = self.visit_source(node, 0, source_demand, path, ctx)?;
        let mapping = appended_mapping(&source, &kept);

        let columns = calculate
            .columns()
            .iter()
            .zip(&kept)
            .filter(|(_, k)| **k)
            .map(|(c, _)| -> StrataResult<CalculatedColumn> {
                let expression = rewrite_expr(&c.expression, &source.mapping, ctx, node.kind(), path)?;
                Ok(CalculatedColumn::new(c.name.clone(), c.data_type.clone(), expression))
            })
            .collect::<StrataResult<Vec<_>>>()?;
        if columns.is_empty() {
            return Ok(Pruned {
                provider: source.provider,
                mapping,
            });
        }

        Ok(Pruned {
            provider: Provider::rebuild(node, Calculate::new(columns).into(), [source.provider])?,
            mapping,
        })
    }

    fn row_number(
        &self,
        node: &ProviderRef,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let source_header = node.sources()[0].header();
        let kept = demand.contains(&source_header.len());

        let mut source_demand: ColumnSet = demand.range(..source_header.len()).copied().collect();
        if kept {
            source_demand.extend(source_header.order().columns());
        }
        let source = self.visit_source(node, 0, source_demand, path, ctx)?;
        let mapping = appended_mapping(&source, &[kept]);
        if !kept {
            return Ok(Pruned {
                provider: source.provider,
                mapping,
            });
        }

        Ok(Pruned {
            provider: Provider::rebuild(node, node.operator().clone(), [source.provider])?,
            mapping,
        })
    }

    fn include(
        &self,
        node: &ProviderRef,
        include: &Include,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let source_len = node.sources()[0].header().len();
        let kept = demand.contains(&source_len);

        let mut source_demand: ColumnSet = demand.range(..source_len).copied().collect();
        if kept {
            source_demand.extend(include.columns());
        }
        let source = self.visit_source(node, 0, source_demand, path, ctx)?;
        let mapping = appended_mapping(&source, &[kept]);
        if !kept {
            return Ok(Pruned {
                provider: source.provider,
                mapping,
            });
        }

        let columns = include
            .columns()
            .iter()
            .map(|c| remap_column(&source.mapping, *c, node.kind(), path))
            .collect::<StrataResult<Vec<_>>>()?;
        Ok(Pruned {
            provider: Provider::rebuild(node, include.with_columns(columns).into(), [source.provider])?,
            mapping,
        })
    }

    fn aggregate(
        &self,
        node: &ProviderRef,
        aggregate: &Aggregate,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let groups = aggregate.group_columns().len();
        let kept = (0..aggregate.aggregates().len())
            .map(|i| demand.contains(&(groups + i)))
            .collect_vec();

        let mut source_demand: ColumnSet = aggregate.group_columns().iter().copied().collect();
        source_demand.extend(
            aggregate
                .aggregates()
                .iter()
                .zip(&kept)
                .filter(|(_, k)| **k)
                .filter_map(|(a, _)| a.source),
        );
        let source = self.visit_source(node, 0, source_demand, path, ctx)?;

        let group_columns = aggregate
            .group_columns()
            .iter()
            .map(|c| remap_column(&source.mapping, *c, node.kind(), path))
            .collect::<StrataResult<Vec<_>>>()?;
        let aggregates = aggregate
            .aggregates()
            .iter()
            .zip(&kept)
            .filter(|(_, k)| **k)
            .map(|(a, _)| -> StrataResult<AggregateColumn> {
                let column = match a.source {
                    Some(c) => Some(remap_column(&source.mapping, c, node.kind(), path)?),
                    None => None,
                };
                Ok(a.with_source(column))
            })
            .collect::<StrataResult<Vec<_>>>()?;

        let mut entries = (0..groups).map(Some).collect_vec();
        let mut next = groups;
        for k in &kept {
            entries.push(if *k {
                next += 1;
                Some(next - 1)
            } else {
                None
            });
        }

        Ok(Pruned {
            provider: Provider::rebuild(
                node,
                Aggregate::new(group_columns, aggregates).into(),
                [source.provider],
            )?,
            mapping: ColumnMap::from_entries(entries),
        })
    }

    fn join(
        &self,
        node: &ProviderRef,
        join: &Join,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let (mut left_demand, mut right_demand) = split(node, demand);
        left_demand.extend(join.equal_columns().iter().map(|(l, _)| *l));
        right_demand.extend(join.equal_columns().iter().map(|(_, r)| *r));

        let left = self.visit_source(node, 0, left_demand, path, ctx)?;
        let right = self.visit_source(node, 1, right_demand, path, ctx)?;
        let equal_columns = join
            .equal_columns()
            .iter()
            .map(|(l, r)| -> StrataResult<(usize, usize)> {
                Ok((
                    remap_column(&left.mapping, *l, node.kind(), path)?,
                    remap_column(&right.mapping, *r, node.kind(), path)?,
                ))
            })
            .collect::<StrataResult<Vec<_>>>()?;

        let mapping = left
            .mapping
            .concat(&right.mapping, left.provider.header().len());
        Ok(Pruned {
            provider: Provider::rebuild(
                node,
                Join::new(join.join_type(), equal_columns).into(),
                [left.provider, right.provider],
            )?,
            mapping,
        })
    }

    fn predicate_join(
        &self,
        node: &ProviderRef,
        join: &PredicateJoin,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let mut combined = demand.clone();
        combined.extend(gather(join.predicate()));
        let (left_demand, right_demand) = split(node, &combined);

        let left = self.visit_source(node, 0, left_demand, path, ctx)?;
        let right = self.visit_source(node, 1, right_demand, path, ctx)?;
        let mapping = left
            .mapping
            .concat(&right.mapping, left.provider.header().len());
        let predicate = rewrite_expr(join.predicate(), &mapping, ctx, node.kind(), path)?;

        Ok(Pruned {
            provider: Provider::rebuild(
                node,
                PredicateJoin::new(join.join_type(), predicate).into(),
                [left.provider, right.provider],
            )?,
            mapping,
        })
    }

    fn apply(
        &self,
        node: &ProviderRef,
        apply: &Apply,
        demand: &ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let parameter = apply.parameter();
        let (mut left_demand, right_demand) = if apply.apply_type().produces_inner() {
            split(node, demand)
        } else {
            (demand.clone(), ColumnSet::new())
        };
        let correlated = outer_references(&node.sources()[1], parameter);
        trace!("{} at {} reads outer columns {:?}", parameter, path, correlated);
        left_demand.extend(correlated);

        let left = self.visit_source(node, 0, left_demand, path, ctx)?;
        ctx.outer.insert(parameter, left.mapping.clone());
        let right = self.visit_source(node, 1, right_demand, path, ctx);
        ctx.outer.remove(&parameter);
        let right = right?;

        let mapping = if apply.apply_type().produces_inner() {
            left.mapping
                .concat(&right.mapping, left.provider.header().len())
        } else {
            left.mapping.clone()
        };
        Ok(Pruned {
            provider: Provider::with_sources(node, [left.provider, right.provider])?,
            mapping,
        })
    }

    /// Prunes both sides of a set operation to `demand` and aligns them to the same layout.
    fn set_operation(
        &self,
        node: &ProviderRef,
        demand: ColumnSet,
        path: &NodePath,
        ctx: &mut PruneContext,
    ) -> StrataResult<Pruned> {
        let columns = demand.iter().copied().collect_vec();
        let left = self.visit_source(node, 0, demand.clone(), path, ctx)?;
        let right = self.visit_source(node, 1, demand.clone(), path, ctx)?;
        let left = align(left, &columns, node.kind(), path)?;
        let right = align(right, &columns, node.kind(), path)?;

        Ok(Pruned {
            provider: Provider::with_sources(node, [left, right])?,
            mapping: ColumnMap::dense(node.header().len(), &demand),
        })
    }
}

/// Splits a demand on the combined tuple of a binary node into its left and right parts.
fn split(node: &ProviderRef, demand: &ColumnSet) -> (ColumnSet, ColumnSet) {
    let left_len = node.sources()[0].header().len();
    let left = demand.range(..left_len).copied().collect();
    let right = demand.range(left_len..).map(|c| c - left_len).collect();
    (left, right)
}

/// Mapping of a node producing its source's columns followed by added columns, of which only
/// the `kept` ones survive.
fn appended_mapping(source: &Pruned, kept: &[bool]) -> ColumnMap {
    let mut next = source.provider.header().len();
    let mut entries = (0..source.mapping.old_len())
        .map(|c| source.mapping.get(c))
        .collect_vec();
    for k in kept {
        entries.push(if *k {
            next += 1;
            Some(next - 1)
        } else {
            None
        });
    }
    ColumnMap::from_entries(entries)
}

fn is_identity(columns: &[usize], source: &ProviderRef) -> bool {
    columns.len() == source.header().len() && columns.iter().enumerate().all(|(i, c)| i == *c)
}

/// Narrows `pruned` to exactly `columns` of its original layout, in that order.
fn align(
    pruned: Pruned,
    columns: &[usize],
    kind: ProviderKind,
    path: &NodePath,
) -> StrataResult<ProviderRef> {
    let positions = columns
        .iter()
        .map(|c| remap_column(&pruned.mapping, *c, kind, path))
        .collect::<StrataResult<Vec<_>>>()?;
    if is_identity(&positions, &pruned.provider) {
        Ok(pruned.provider)
    } else {
        Provider::unary(Select::new(positions), pruned.provider)
    }
}

fn remap_column(
    mapping: &ColumnMap,
    column: usize,
    kind: ProviderKind,
    path: &NodePath,
) -> StrataResult<usize> {
    mapping.get(column).ok_or_else(|| {
        StrataError::invariant(
            kind,
            path,
            format!("source column #{} did not survive", column),
        )
    })
}

fn rewrite_expr(
    expr: &ScalarExpr,
    mapping: &ColumnMap,
    ctx: &PruneContext,
    kind: ProviderKind,
    path: &NodePath,
) -> StrataResult<ScalarExpr> {
    TupleAccessRewriter::new(mapping, &ctx.outer)
        .rewrite(expr)
        .map_err(|MissingColumn(access)| {
            StrataError::invariant(kind, path, format!("{} did not survive", access))
        })
}

fn rewrite_search(
    search: &FullTextSearch,
    ctx: &PruneContext,
    kind: ProviderKind,
    path: &NodePath,
) -> StrataResult<FullTextSearch> {
    let criteria = rewrite_expr(&search.criteria, &ColumnMap::identity(0), ctx, kind, path)?;
    Ok(FullTextSearch {
        criteria,
        ..search.clone()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_schema::DataType;
    use datafusion_common::ScalarValue;
    use maplit::btreeset;

    use super::*;
    use crate::expr::{col, lit, outer_col};
    use crate::properties::Ordering;
    use crate::provider::{explain_to_string, AggregateFunction, ProviderBuilder};
    use crate::test_utils::{customers, orders};

    fn prune(root: &ProviderRef, demand: ColumnSet) -> PruneResult {
        ColumnPruner::new().prune(root, &demand).unwrap()
    }

    #[test]
    fn test_select_filter_sort() {
        let root = ProviderBuilder::from_provider(orders())
            .select(vec![0, 2, 4])
            .filter(col(1).gt(lit(100i64)))
            .sort(vec![Ordering::asc(0)])
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0, 1});

        let expected = "\
Sort { order: [#0 Asc] }
└─ Filter { predicate: (#1 > 100) }
   └─ Select { columns: [0, 2] }
      └─ Index { index: \"orders_pk\", table: \"orders\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
        assert_eq!(2, result.provider.header().len());
        assert_eq!("[0->0, 1->1]", result.column_map.to_string());
    }

    fn unordered_outer() -> ProviderRef {
        ProviderBuilder::raw(
            vec![
                ColumnDef::new("a", DataType::Int64),
                ColumnDef::new("b", DataType::Utf8),
                ColumnDef::new("c", DataType::Int64),
                ColumnDef::new("d", DataType::Utf8),
            ],
            vec![],
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_apply_keeps_correlated_outer_column() {
        let p = ApplyParameter::next();
        let inner = ProviderBuilder::from_provider(orders())
            .filter(col(1).eq(outer_col(p, 2)))
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(unordered_outer())
            .apply(p, ApplyType::Cross, inner)
            .build()
            .unwrap();

        // Only the inner `id`; nothing explicitly asked from the outer side.
        let result = prune(&root, btreeset! {4});

        let left = &result.provider.sources()[0];
        assert_eq!(1, left.header().len());
        assert_eq!("c", left.header().columns()[0].name);

        let expected = "\
Apply { parameter: $P, apply_type: Cross }
├─ Select { columns: [2] }
│  └─ Raw { columns: [a, b, c, d], rows: 0 }
└─ Filter { predicate: (#1 = $P.#0) }
   └─ Select { columns: [0, 1] }
      └─ Index { index: \"orders_pk\", table: \"orders\" }
"
        .replace("$P", &p.to_string());
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
        assert_eq!(Some(1), result.column_map.get(4));
    }

    #[test]
    fn test_existing_apply_prunes_inner_to_one_column() {
        let p = ApplyParameter::next();
        let inner = ProviderBuilder::from_provider(orders())
            .filter(col(1).eq(outer_col(p, 0)))
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(customers())
            .apply(p, ApplyType::Existing, inner)
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {1});

        assert_eq!(2, result.provider.header().len());
        let left = &result.provider.sources()[0];
        assert_eq!(
            vec!["id", "name"],
            left.header()
                .columns()
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
        );
        assert_eq!(2, result.provider.sources()[1].header().len());
        assert_eq!(Some(1), result.column_map.get(1));
        assert_eq!(Some(0), result.column_map.get(0));
    }

    #[test]
    fn test_pruning_is_idempotent() {
        let p = ApplyParameter::next();
        let inner = ProviderBuilder::from_provider(orders())
            .filter(col(1).eq(outer_col(p, 0)))
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(customers())
            .calculate(vec![CalculatedColumn::new(
                "upper_name",
                DataType::Utf8,
                col(1),
            )])
            .apply(p, ApplyType::Outer, inner)
            .filter(col(3).gt(lit(0i64)))
            .take(5u64)
            .build()
            .unwrap();

        let first = prune(&root, btreeset! {4, 7});
        let demand = btreeset! {4, 7}
            .into_iter()
            .filter_map(|c| first.column_map.get(c))
            .collect();
        let second = prune(&first.provider, demand);

        assert!(Arc::ptr_eq(&first.provider, &second.provider));
        assert!(second.column_map.is_identity());
    }

    #[test]
    fn test_full_demand_returns_same_tree() {
        let root = ProviderBuilder::from_provider(orders())
            .filter(col(2).gt(lit(1i64)))
            .build()
            .unwrap();
        let result = prune(&root, (0..5).collect());
        assert!(Arc::ptr_eq(&root, &result.provider));
        assert!(result.column_map.is_identity());
    }

    #[test]
    fn test_calculate_drops_undemanded_columns() {
        let base = ProviderBuilder::from_provider(customers())
            .calculate(vec![
                CalculatedColumn::new("a", DataType::Float64, col(3)),
                CalculatedColumn::new("b", DataType::Utf8, col(2)),
            ])
            .build()
            .unwrap();

        let result = prune(&base, btreeset! {0, 5});
        let calculate = result.provider.operator().as_calculate().unwrap();
        assert_eq!(1, calculate.columns().len());
        assert_eq!(col(1), calculate.columns()[0].expression);
        assert_eq!(Some(2), result.column_map.get(5));
        assert_eq!(None, result.column_map.get(4));

        // The key column is kept for the root order.
        let gone = prune(&base, btreeset! {1});
        assert_eq!(ProviderKind::Select, gone.provider.kind());
        assert_eq!(2, gone.provider.header().len());
    }

    #[test]
    fn test_aggregate_keeps_groups_and_demanded_aggregates() {
        let root = ProviderBuilder::from_provider(orders())
            .aggregate(
                vec![1],
                vec![
                    AggregateColumn::new("total", AggregateFunction::Sum, 2),
                    AggregateColumn::count_rows("n"),
                    AggregateColumn::new("last", AggregateFunction::Max, 3),
                ],
            )
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {3});

        let expected = "\
Aggregate { group_columns: [0], aggregates: [last := Max(#1)] }
└─ Select { columns: [1, 3] }
   └─ Index { index: \"orders_pk\", table: \"orders\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
        assert_eq!("[0->0, 3->1]", result.column_map.to_string());
    }

    #[test]
    fn test_concat_aligns_both_sides() {
        let left = ProviderBuilder::from_provider(orders())
            .filter(col(4).eq(lit("open")))
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(left)
            .concat(orders())
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0, 2});

        let expected = "\
Concat
├─ Select { columns: [0, 1] }
│  └─ Filter { predicate: (#2 = open) }
│     └─ Select { columns: [0, 2, 4] }
│        └─ Index { index: \"orders_pk\", table: \"orders\" }
└─ Select { columns: [0, 2] }
   └─ Index { index: \"orders_pk\", table: \"orders\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
        assert_eq!("[0->0, 2->1]", result.column_map.to_string());
    }

    #[test]
    fn test_union_and_store_are_not_narrowed() {
        let root = ProviderBuilder::from_provider(orders())
            .store("recent")
            .union(orders())
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {1});
        assert!(Arc::ptr_eq(&root, &result.provider));
        assert_eq!(5, result.provider.header().len());
    }

    #[test]
    fn test_paging_keeps_source_order_keys() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::desc(3)])
            .paging(10u64, 20u64)
            .select(vec![1])
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0});

        let expected = "\
Select { columns: [0] }
└─ Paging { skip: 10, take: 20 }
   └─ Sort { order: [#1 Desc] }
      └─ Select { columns: [1, 3] }
         └─ Index { index: \"customers_pk\", table: \"customers\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
    }

    #[test]
    fn test_join_splits_demand_and_offsets_right_side() {
        let join = ProviderBuilder::from_provider(customers())
            .join(JoinType::Inner, vec![(0, 1)], orders())
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(join.clone())
            .select(vec![1, 6])
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0, 1});

        let expected = "\
Select { columns: [1, 3] }
└─ Join { join_type: Inner, equal_columns: [#0 = #0] }
   ├─ Select { columns: [0, 1] }
   │  └─ Index { index: \"customers_pk\", table: \"customers\" }
   └─ Select { columns: [1, 2] }
      └─ Index { index: \"orders_pk\", table: \"orders\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
        assert_eq!("[0->0, 1->1]", result.column_map.to_string());

        // At the root the join also keeps both sides' order keys.
        let result = prune(&join, btreeset! {1, 6});
        assert_eq!(
            "[0->0, 1->1, 4->2, 5->3, 6->4]",
            result.column_map.to_string()
        );
        let join = result.provider.operator().as_join().unwrap();
        assert_eq!(vec![(0, 1)], join.equal_columns().to_vec());
    }

    #[test]
    fn test_predicate_join_rewrites_predicate() {
        let root = ProviderBuilder::from_provider(customers())
            .predicate_join(
                JoinType::LeftOuter,
                col(0).eq(col(5)).and(col(8).eq(lit("open"))),
                orders(),
            )
            .select(vec![1])
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0});

        let expected = "\
Select { columns: [1] }
└─ PredicateJoin { join_type: LeftOuter, predicate: ((#0 = #2) AND (#3 = open)) }
   ├─ Select { columns: [0, 1] }
   │  └─ Index { index: \"customers_pk\", table: \"customers\" }
   └─ Select { columns: [1, 4] }
      └─ Index { index: \"orders_pk\", table: \"orders\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
        assert_eq!("[0->0]", result.column_map.to_string());
    }

    #[test]
    fn test_row_number_keeps_source_order_keys() {
        let root = ProviderBuilder::from_provider(orders())
            .sort(vec![Ordering::desc(2)])
            .row_number("seq")
            .select(vec![1, 5])
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0, 1});

        let expected = "\
Select { columns: [0, 2] }
└─ RowNumber { name: \"seq\" }
   └─ Sort { order: [#1 Desc] }
      └─ Select { columns: [1, 2] }
         └─ Index { index: \"orders_pk\", table: \"orders\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
        assert_eq!("[0->0, 1->1]", result.column_map.to_string());
    }

    #[test]
    fn test_include_keeps_matched_columns() {
        let root = ProviderBuilder::from_provider(customers())
            .include(vec![2], vec![vec![ScalarValue::from("Oslo")]], "local")
            .select(vec![1, 4])
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0, 1});

        let expected = "\
Select { columns: [0, 2] }
└─ Include { columns: [1], rows: 1, name: \"local\" }
   └─ Select { columns: [1, 2] }
      └─ Index { index: \"customers_pk\", table: \"customers\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());

        // Without its flag demanded the include goes away with its matched column.
        let result = prune(&root, btreeset! {0});
        let expected = "\
Select { columns: [1] }
└─ Index { index: \"customers_pk\", table: \"customers\" }
";
        assert_eq!(expected, explain_to_string(&result.provider).unwrap());
    }

    #[test]
    fn test_sort_keys_are_kept_under_aggregate() {
        let root = ProviderBuilder::from_provider(orders())
            .sort(vec![Ordering::desc(2)])
            .aggregate(vec![1], vec![AggregateColumn::count_rows("n")])
            .build()
            .unwrap();

        let result = prune(&root, btreeset! {0, 1});

        // The sort is dead but its key survives until the ordering pass removes it.
        let sort = &result.provider.sources()[0];
        assert_eq!(ProviderKind::Sort, sort.kind());
        assert_eq!(2, sort.header().len());
        assert_eq!("[#1 Desc]", sort.header().order().to_string());
    }

    #[test]
    fn test_empty_demand_is_widened() {
        let root = ProviderBuilder::from_provider(customers())
            .existence("any")
            .build()
            .unwrap();
        let result = prune(&root, btreeset! {});
        assert_eq!(
            1,
            result.provider.sources()[0].header().len(),
            "{}",
            explain_to_string(&result.provider).unwrap()
        );
    }

    #[test]
    fn test_out_of_range_demand_is_an_invariant_violation() {
        let err = ColumnPruner::new()
            .prune(&customers(), &btreeset! {7})
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::InvariantViolation {
                kind: ProviderKind::Index,
                ..
            }
        ));
        assert_eq!(
            "invariant violated in Index at root: column #7 demanded from 4 columns",
            err.to_string()
        );
    }
}
