//! Lowering of a provider tree to a SQL node tree.
//!
//! Every provider lowers to a query whose output columns are named `c0`, `c1`, ... after
//! their position. A unary provider folds into the select of its source when doing so keeps
//! the meaning of the clauses already there (a filter can join the `WHERE` of a select
//! without grouping or limit, paging can be added to a select without one, and so on).
//! Otherwise the source is wrapped as a derived table `tK` and the provider builds a new
//! select over it. Joins and applies reuse the `FROM` of plain sides so chains of joins
//! come out flat.
//!
//! `Sort` only contributes order: `ORDER BY` is written by paging providers, inside
//! `ROW_NUMBER() OVER` and at the root. The root columns take the names of the header.

use std::collections::HashMap;

use datafusion_common::ScalarValue;
use itertools::Itertools;
use log::{debug, trace};
use strata::expr::ApplyParameter;
use strata::operator::{
    ApplyType, ColumnDef, FullTextSearch, JoinType, Operator, RowCount,
};
use strata::provider::ProviderRef;

use crate::ast::{
    FullTextKind, Limit, LockClause, QueryStatement, SelectItem, SetOperator, SqlExpr,
    SqlJoinType, SqlQuery, SqlSelect, Statement, TableRef, FULL_TEXT_KEY, FULL_TEXT_RANK,
};
use crate::error::{SqlError, SqlResult};

mod expr;

use expr::{row_count, Scope};

/// Lowers the tree rooted at `root` to a query statement.
pub fn lower(root: &ProviderRef) -> SqlResult<Statement> {
    Lowering::default().lower_root(root)
}

/// A lowered provider: its query and the number of columns the query returns.
struct Fragment {
    query: SqlQuery,
    width: usize,
}

impl Fragment {
    fn select(select: SqlSelect) -> Self {
        Self {
            width: select.columns.len(),
            query: SqlQuery::Select(Box::new(select)),
        }
    }
}

/// A side of a join: its table reference, its columns and the filter of its rows, when
/// the filter can move to the enclosing select.
struct JoinSide {
    table: TableRef,
    columns: Vec<SqlExpr>,
    selection: Option<SqlExpr>,
}

#[derive(Default)]
struct Lowering {
    aliases: usize,
    /// Left columns of every `Apply` whose right side is being lowered.
    outer: HashMap<ApplyParameter, Vec<SqlExpr>>,
    tags: Vec<String>,
}

fn column_name(index: usize) -> String {
    format!("c{}", index)
}

/// Select items of `exprs`, named after their position.
fn items(exprs: Vec<SqlExpr>) -> Vec<SelectItem> {
    exprs
        .into_iter()
        .enumerate()
        .map(|(i, expr)| SelectItem {
            expr,
            alias: column_name(i),
        })
        .collect()
}

fn columns_of(select: &SqlSelect) -> Vec<SqlExpr> {
    select.columns.iter().map(|c| c.expr.clone()).collect()
}

fn pick(columns: &[SqlExpr], index: usize) -> SqlResult<SqlExpr> {
    columns
        .get(index)
        .cloned()
        .ok_or_else(|| SqlError::Malformed(format!("column #{} does not resolve", index)))
}

fn has_no_limit(select: &SqlSelect) -> bool {
    select.limit.is_none() && select.lock.is_none()
}

impl Lowering {
    fn lower_root(mut self, root: &ProviderRef) -> SqlResult<Statement> {
        let fragment = self.lower(root)?;
        let order = root.header().order();
        let mut select = self.into_select(fragment, |s| {
            order.is_empty() || !s.order_by.is_empty() || s.limit.is_none()
        });
        if select.order_by.is_empty() && !order.is_empty() {
            let current = columns_of(&select);
            select.order_by = self.scope(&current).order(order)?;
        }
        for (item, column) in select.columns.iter_mut().zip(root.header().columns()) {
            item.alias = column.name.clone();
        }
        Ok(Statement::Query(QueryStatement {
            tags: self.tags,
            query: SqlQuery::Select(Box::new(select)),
        }))
    }

    fn alias(&mut self) -> String {
        let alias = format!("t{}", self.aliases);
        self.aliases += 1;
        alias
    }

    fn scope<'a>(&'a self, current: &'a [SqlExpr]) -> Scope<'a> {
        Scope {
            current,
            outer: &self.outer,
        }
    }

    /// Select over all columns of `query`, read as a derived table.
    fn wrap(&mut self, query: SqlQuery, width: usize) -> SqlSelect {
        let alias = self.alias();
        trace!("Wrapping a query of {} columns as {}", width, alias);
        let columns = (0..width)
            .map(|i| SqlExpr::column(alias.as_str(), column_name(i)))
            .collect();
        SqlSelect {
            columns: items(columns),
            from: Some(TableRef::Derived {
                query: Box::new(query),
                alias,
            }),
            ..Default::default()
        }
    }

    /// The select of `fragment` when `mergeable` accepts it, otherwise a select wrapping it.
    fn into_select<F>(&mut self, fragment: Fragment, mergeable: F) -> SqlSelect
    where
        F: Fn(&SqlSelect) -> bool,
    {
        match fragment.query {
            SqlQuery::Select(select) if mergeable(&select) => *select,
            query => self.wrap(query, fragment.width),
        }
    }

    fn lower(&mut self, node: &ProviderRef) -> SqlResult<Fragment> {
        let source = || node.sources()[0].clone();

        let fragment = match node.operator() {
            Operator::Index(scan) => {
                let index = scan.index();
                let alias = self.alias();
                let columns = index
                    .columns
                    .iter()
                    .map(|c| SqlExpr::column(alias.as_str(), c.name.as_str()))
                    .collect();
                Fragment::select(SqlSelect {
                    columns: items(columns),
                    from: Some(TableRef::table(index.table.as_str(), alias)),
                    ..Default::default()
                })
            }
            Operator::Seek(seek) => {
                let index = seek.index();
                let alias = self.alias();
                let columns = index
                    .columns
                    .iter()
                    .map(|c| SqlExpr::column(alias.as_str(), c.name.as_str()))
                    .collect_vec();
                let mut select = SqlSelect {
                    columns: items(columns.clone()),
                    from: Some(TableRef::table(index.table.as_str(), alias)),
                    ..Default::default()
                };
                for (key, ordering) in seek.key().iter().zip(index.key_order.orders()) {
                    let value = self.scope(&columns).expr(key)?;
                    select.and_where(pick(&columns, ordering.column)?.eq(value));
                }
                Fragment::select(select)
            }
            Operator::Raw(raw) if raw.rows().is_empty() => self.void(raw.columns()),
            Operator::Raw(raw) => {
                let alias = self.alias();
                let names = (0..raw.columns().len()).map(column_name).collect_vec();
                let columns = names
                    .iter()
                    .map(|n| SqlExpr::column(alias.as_str(), n.as_str()))
                    .collect();
                Fragment::select(SqlSelect {
                    columns: items(columns),
                    from: Some(TableRef::Values {
                        rows: raw.rows().to_vec(),
                        alias,
                        columns: names,
                    }),
                    ..Default::default()
                })
            }
            Operator::Void(void) => self.void(void.columns()),
            Operator::FreeText(search) => self.full_text(FullTextKind::FreeText, &search.0)?,
            Operator::ContainsTable(search) => {
                self.full_text(FullTextKind::Contains, &search.0)?
            }
            Operator::Store(_) | Operator::Sort(_) => self.lower(&source())?,
            Operator::Tag(tag) => {
                self.tags.push(tag.tag().to_string());
                self.lower(&source())?
            }
            Operator::IndexHint(hint) => {
                let mut fragment = self.lower(&source())?;
                let attached = match &mut fragment.query {
                    SqlQuery::Select(select) => select
                        .from
                        .as_mut()
                        .map_or(false, |from| from.hint_index(hint.index())),
                    SqlQuery::SetOperation { .. } => false,
                };
                if !attached {
                    debug!("No base table to carry index hint {}", hint.index());
                }
                fragment
            }
            Operator::Select(projection) => {
                let fragment = self.lower(&source())?;
                let mut select = self.into_select(fragment, |s| !s.distinct);
                let current = columns_of(&select);
                let columns = projection
                    .columns()
                    .iter()
                    .map(|i| pick(&current, *i))
                    .collect::<SqlResult<_>>()?;
                select.columns = items(columns);
                Fragment::select(select)
            }
            Operator::Filter(filter) => {
                let fragment = self.lower(&source())?;
                let mut select = self.into_select(fragment, SqlSelect::is_plain);
                let predicate = self.scope(&columns_of(&select)).expr(filter.predicate())?;
                select.and_where(predicate);
                Fragment::select(select)
            }
            Operator::Calculate(calculate) => {
                let fragment = self.lower(&source())?;
                let mut select = self.into_select(fragment, |s| !s.distinct);
                let mut columns = columns_of(&select);
                for column in calculate.columns() {
                    let expr = self.scope(&columns).expr(&column.expression)?;
                    columns.push(expr);
                }
                select.columns = items(columns);
                Fragment::select(select)
            }
            Operator::Include(include) => {
                let fragment = self.lower(&source())?;
                let mut select = self.into_select(fragment, |s| !s.distinct);
                let mut columns = columns_of(&select);
                let exprs = include
                    .columns()
                    .iter()
                    .map(|i| pick(&columns, *i))
                    .collect::<SqlResult<_>>()?;
                columns.push(SqlExpr::truth_value(SqlExpr::InList {
                    exprs,
                    rows: include.rows().to_vec(),
                    negated: false,
                }));
                select.columns = items(columns);
                Fragment::select(select)
            }
            Operator::Distinct(_) => {
                let fragment = self.lower(&source())?;
                let mut select = self.into_select(fragment, has_no_limit);
                select.distinct = true;
                Fragment::select(select)
            }
            Operator::Paging(paging) => {
                self.limit(node, Some(paging.skip()), Some(paging.take()))?
            }
            Operator::Skip(skip) => self.limit(node, Some(skip.count()), None)?,
            Operator::Take(take) => self.limit(node, None, Some(take.count()))?,
            Operator::RowNumber(_) => {
                let fragment = self.lower(&source())?;
                let mut select =
                    self.into_select(fragment, |s| !s.distinct && has_no_limit(s));
                let mut columns = columns_of(&select);
                let order_by = self.scope(&columns).order(source().header().order())?;
                columns.push(SqlExpr::RowNumber { order_by });
                select.columns = items(columns);
                Fragment::select(select)
            }
            Operator::Aggregate(aggregate) => {
                let fragment = self.lower(&source())?;
                let mut select = self.into_select(fragment, SqlSelect::is_plain);
                let current = columns_of(&select);
                let groups = aggregate
                    .group_columns()
                    .iter()
                    .map(|i| pick(&current, *i))
                    .collect::<SqlResult<Vec<_>>>()?;
                let mut columns = groups.clone();
                for column in aggregate.aggregates() {
                    let arg = match column.source {
                        Some(i) => Some(Box::new(pick(&current, i)?)),
                        None => None,
                    };
                    columns.push(SqlExpr::Aggregate {
                        function: column.function,
                        arg,
                    });
                }
                select.columns = items(columns);
                select.group_by = groups;
                select.grouped = true;
                Fragment::select(select)
            }
            Operator::Lock(lock) => {
                let fragment = self.lower(&source())?;
                let mut select = self.into_select(fragment, SqlSelect::is_plain);
                select.lock = Some(LockClause {
                    mode: lock.mode(),
                    behavior: lock.behavior(),
                });
                Fragment::select(select)
            }
            Operator::Existence(_) => {
                let fragment = self.lower(&source())?;
                let exists = SqlExpr::Exists {
                    query: Box::new(fragment.query),
                    negated: false,
                };
                Fragment::select(SqlSelect {
                    columns: items(vec![SqlExpr::truth_value(exists)]),
                    ..Default::default()
                })
            }
            Operator::Join(join) => {
                let (left, right) = self.join_sides(node, join.join_type())?;
                let on = join
                    .equal_columns()
                    .iter()
                    .map(|(l, r)| Ok(pick(&left.columns, *l)?.eq(pick(&right.columns, *r)?)))
                    .collect::<SqlResult<Vec<_>>>()?
                    .into_iter()
                    .reduce(SqlExpr::and);
                self.joined(join.join_type(), left, right, on)
            }
            Operator::PredicateJoin(join) => {
                let (left, right) = self.join_sides(node, join.join_type())?;
                let combined = left.columns.iter().chain(&right.columns).cloned().collect_vec();
                let on = self.scope(&combined).expr(join.predicate())?;
                self.joined(join.join_type(), left, right, Some(on))
            }
            Operator::Apply(apply) => self.apply(node, apply.parameter(), apply.apply_type())?,
            Operator::Union(_) => self.set_operation(node, SetOperator::Union)?,
            Operator::Concat(_) => self.set_operation(node, SetOperator::UnionAll)?,
            Operator::Except(_) => self.set_operation(node, SetOperator::Except)?,
            Operator::Intersect(_) => self.set_operation(node, SetOperator::Intersect)?,
        };
        Ok(fragment)
    }

    /// Typed `NULL`s, filtered out.
    fn void(&mut self, columns: &[ColumnDef]) -> Fragment {
        let columns = columns
            .iter()
            .map(|c| SqlExpr::Cast {
                expr: Box::new(SqlExpr::Literal(ScalarValue::Null)),
                data_type: c.data_type.clone(),
            })
            .collect();
        let never = SqlExpr::Literal(ScalarValue::Int64(Some(1)))
            .eq(SqlExpr::Literal(ScalarValue::Int64(Some(0))));
        Fragment::select(SqlSelect {
            columns: items(columns),
            selection: Some(never),
            ..Default::default()
        })
    }

    fn full_text(&mut self, kind: FullTextKind, search: &FullTextSearch) -> SqlResult<Fragment> {
        let criteria = self.scope(&[]).expr(&search.criteria)?;
        let top_n = search.top_n.as_ref().map(row_count);
        let alias = self.alias();
        let columns = vec![
            SqlExpr::column(alias.as_str(), FULL_TEXT_KEY),
            SqlExpr::column(alias.as_str(), FULL_TEXT_RANK),
        ];
        Ok(Fragment::select(SqlSelect {
            columns: items(columns),
            from: Some(TableRef::full_text(kind, search, criteria, top_n, alias)),
            ..Default::default()
        }))
    }

    fn limit(
        &mut self,
        node: &ProviderRef,
        skip: Option<&RowCount>,
        take: Option<&RowCount>,
    ) -> SqlResult<Fragment> {
        let source = &node.sources()[0];
        let fragment = self.lower(source)?;
        let mut select = self.into_select(fragment, has_no_limit);
        select.order_by = self
            .scope(&columns_of(&select))
            .order(source.header().order())?;
        select.limit = Some(Limit {
            skip: skip
                .filter(|s| **s != RowCount::Literal(0))
                .map(row_count),
            take: take.map(row_count),
        });
        Ok(Fragment::select(select))
    }

    /// Lowers `node` as one side of a join. Its filter is handed back when `keep_filter`
    /// allows moving it to the enclosing select.
    fn join_side(&mut self, node: &ProviderRef, keep_filter: bool) -> SqlResult<JoinSide> {
        let fragment = self.lower(node)?;
        let select = self.into_select(fragment, |s| {
            s.is_plain() && s.from.is_some() && (keep_filter || s.selection.is_none())
        });
        let columns = columns_of(&select);
        let table = select
            .from
            .ok_or_else(|| SqlError::Malformed("join side without a table".to_string()))?;
        Ok(JoinSide {
            table,
            columns,
            selection: select.selection,
        })
    }

    fn join_sides(&mut self, node: &ProviderRef, join_type: JoinType) -> SqlResult<(JoinSide, JoinSide)> {
        let left = self.join_side(&node.sources()[0], true)?;
        let right = self.join_side(&node.sources()[1], join_type == JoinType::Inner)?;
        Ok((left, right))
    }

    fn joined(
        &mut self,
        join_type: JoinType,
        left: JoinSide,
        right: JoinSide,
        on: Option<SqlExpr>,
    ) -> Fragment {
        let join_type = match join_type {
            JoinType::Inner => SqlJoinType::Inner,
            JoinType::LeftOuter => SqlJoinType::LeftOuter,
        };
        let columns = left.columns.into_iter().chain(right.columns).collect();
        let mut select = SqlSelect {
            columns: items(columns),
            from: Some(TableRef::Join {
                join_type,
                left: Box::new(left.table),
                right: Box::new(right.table),
                on,
            }),
            ..Default::default()
        };
        for selection in [left.selection, right.selection].into_iter().flatten() {
            select.and_where(selection);
        }
        Fragment::select(select)
    }

    fn apply(
        &mut self,
        node: &ProviderRef,
        parameter: ApplyParameter,
        apply_type: ApplyType,
    ) -> SqlResult<Fragment> {
        let left = self.join_side(&node.sources()[0], true)?;
        self.outer.insert(parameter, left.columns.clone());
        let right = self.lower(&node.sources()[1]);
        self.outer.remove(&parameter);
        let right = right?;

        let mut select = match apply_type {
            ApplyType::Cross | ApplyType::Outer => {
                let alias = self.alias();
                let columns = left
                    .columns
                    .into_iter()
                    .chain((0..right.width).map(|i| SqlExpr::column(alias.as_str(), column_name(i))))
                    .collect();
                let join_type = if apply_type == ApplyType::Cross {
                    SqlJoinType::CrossApply
                } else {
                    SqlJoinType::OuterApply
                };
                SqlSelect {
                    columns: items(columns),
                    from: Some(TableRef::Join {
                        join_type,
                        left: Box::new(left.table),
                        right: Box::new(TableRef::Derived {
                            query: Box::new(right.query),
                            alias,
                        }),
                        on: None,
                    }),
                    ..Default::default()
                }
            }
            ApplyType::Existing | ApplyType::NotExisting => {
                let mut select = SqlSelect {
                    columns: items(left.columns),
                    from: Some(left.table),
                    ..Default::default()
                };
                select.and_where(SqlExpr::Exists {
                    query: Box::new(right.query),
                    negated: apply_type == ApplyType::NotExisting,
                });
                select
            }
        };
        if let Some(selection) = left.selection {
            let existing = select.selection.take();
            select.selection = Some(match existing {
                Some(existing) => selection.and(existing),
                None => selection,
            });
        }
        Ok(Fragment::select(select))
    }

    fn set_operation(&mut self, node: &ProviderRef, op: SetOperator) -> SqlResult<Fragment> {
        let left = self.lower(&node.sources()[0])?;
        let width = left.width;
        let left = self.set_operand(left);
        let right = self.lower(&node.sources()[1])?;
        let right = self.set_operand(right);
        Ok(Fragment {
            query: SqlQuery::SetOperation {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            width,
        })
    }

    /// Operands keep no clause that would bind to the whole set operation.
    fn set_operand(&mut self, fragment: Fragment) -> SqlQuery {
        let select = self.into_select(fragment, |s| s.order_by.is_empty() && has_no_limit(s));
        SqlQuery::Select(Box::new(select))
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use strata::expr::{binary, col, lit, outer_col, BinaryOperator};
    use strata::operator::{CalculatedColumn, LockBehavior, LockMode};
    use strata::properties::Ordering;
    use strata::provider::ProviderBuilder;

    use super::*;
    use crate::dialect::{AnyDialect, DialectKind};
    use crate::test_utils::{customers, customers_index, orders};
    use crate::translator::Translator;

    fn sql(root: &ProviderRef) -> String {
        let statement = lower(root).unwrap();
        Translator::new(&AnyDialect::new(DialectKind::Generic))
            .translate(&statement)
            .unwrap()
            .sql
    }

    #[test]
    fn test_scan_with_root_order() {
        let root = ProviderBuilder::from_provider(customers())
            .select(vec![1, 0])
            .build()
            .unwrap();
        assert_eq!(
            "SELECT t0.name AS name, t0.id AS id FROM customers AS t0 ORDER BY t0.id",
            sql(&root)
        );
    }

    #[test]
    fn test_unary_chain_merges() {
        let root = ProviderBuilder::from_provider(customers())
            .filter(col(2).eq(lit("Oslo")))
            .sort(vec![Ordering::desc(3)])
            .take(10u64)
            .select(vec![1])
            .build()
            .unwrap();
        assert_eq!(
            "SELECT t0.name AS name FROM customers AS t0 WHERE (t0.city = 'Oslo') \
             ORDER BY t0.balance DESC FETCH FIRST 10 ROWS ONLY",
            sql(&root)
        );
    }

    #[test]
    fn test_filter_over_limit_wraps() {
        let root = ProviderBuilder::from_provider(customers())
            .skip(5u64)
            .filter(col(3).gt(lit(0.5)))
            .select(vec![0])
            .build()
            .unwrap();
        assert_eq!(
            "SELECT t1.c0 AS id FROM (SELECT t0.id AS c0, t0.name AS c1, t0.city AS c2, \
             t0.balance AS c3 FROM customers AS t0 ORDER BY t0.id OFFSET 5 ROWS) AS t1 \
             WHERE (t1.c3 > 0.5) ORDER BY t1.c0",
            sql(&root)
        );
    }

    #[test]
    fn test_join_is_flat() {
        let root = ProviderBuilder::from_provider(customers())
            .filter(col(2).eq(lit("Oslo")))
            .join(JoinType::Inner, vec![(0, 1)], orders())
            .select(vec![1, 6])
            .build()
            .unwrap();
        assert_eq!(
            "SELECT t0.name AS name, t1.amount AS amount FROM customers AS t0 \
             INNER JOIN orders AS t1 ON (t0.id = t1.customer_id) WHERE (t0.city = 'Oslo')",
            sql(&root)
        );
    }

    #[test]
    fn test_correlated_apply() {
        let p = ApplyParameter::next();
        let inner = ProviderBuilder::from_provider(orders())
            .filter(col(1).eq(outer_col(p, 0)))
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(customers())
            .apply(p, ApplyType::Existing, inner)
            .select(vec![1])
            .build()
            .unwrap();
        assert_eq!(
            "SELECT t0.name AS name FROM customers AS t0 WHERE EXISTS \
             (SELECT t1.id AS c0, t1.customer_id AS c1, t1.amount AS c2, t1.placed AS c3, \
             t1.status AS c4 FROM orders AS t1 WHERE (t1.customer_id = t0.id))",
            sql(&root)
        );
    }

    #[test]
    fn test_calculate_and_lock() {
        let root = ProviderBuilder::from_provider(customers())
            .calculate(vec![CalculatedColumn::new(
                "doubled",
                DataType::Float64,
                binary(col(3), BinaryOperator::Multiply, lit(2.0)),
            )])
            .lock(LockMode::Update, LockBehavior::Wait)
            .select(vec![0, 4])
            .build()
            .unwrap();
        assert_eq!(
            "SELECT t0.id AS id, (t0.balance * 2.0) AS doubled FROM customers AS t0 \
             ORDER BY t0.id FOR UPDATE",
            sql(&root)
        );
    }

    #[test]
    fn test_void_and_empty_raw() {
        let root = ProviderBuilder::raw(customers_index().columns[..2].to_vec(), vec![])
            .build()
            .unwrap();
        assert_eq!(
            "SELECT CAST(NULL AS BIGINT) AS id, CAST(NULL AS VARCHAR) AS name WHERE (1 = 0)",
            sql(&root)
        );
    }

    #[test]
    fn test_set_operands_are_wrapped() {
        let left = ProviderBuilder::from_provider(customers())
            .take(3u64)
            .select(vec![0])
            .build()
            .unwrap();
        let right = ProviderBuilder::from_provider(orders()).select(vec![1]).build().unwrap();
        let root = ProviderBuilder::from_provider(left).concat(right).build().unwrap();
        assert_eq!(
            "SELECT t3.c0 AS id FROM (SELECT t1.c0 AS c0 FROM (SELECT t0.id AS c0 \
             FROM customers AS t0 ORDER BY t0.id FETCH FIRST 3 ROWS ONLY) AS t1 \
             UNION ALL SELECT t2.customer_id AS c0 FROM orders AS t2) AS t3",
            sql(&root)
        );
    }
}
