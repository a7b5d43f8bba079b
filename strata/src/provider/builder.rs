use datafusion_common::ScalarValue;

use crate::error::StrataResult;
use crate::expr::{ApplyParameter, ScalarExpr};
use crate::operator::*;
use crate::properties::{OrderSpec, Ordering};
use crate::provider::{Provider, ProviderRef};

/// Fluent construction of provider trees, bottom-up.
///
/// The first construction error is kept and returned by [`ProviderBuilder::build`]; later
/// calls are no-ops.
pub struct ProviderBuilder {
    root: StrataResult<ProviderRef>,
}

impl ProviderBuilder {
    pub fn from_provider(root: ProviderRef) -> Self {
        Self { root: Ok(root) }
    }

    fn leaf<O: Into<Operator>>(operator: O) -> Self {
        Self {
            root: Provider::leaf(operator),
        }
    }

    pub fn index(index: IndexInfo) -> Self {
        Self::leaf(IndexScan::new(index))
    }

    pub fn seek(index: IndexInfo, key: Vec<ScalarExpr>) -> Self {
        Self::leaf(IndexSeek::new(index, key))
    }

    pub fn raw(columns: Vec<ColumnDef>, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self::leaf(RawValues::new(columns, rows))
    }

    pub fn void(columns: Vec<ColumnDef>) -> Self {
        Self::leaf(Void::new(columns))
    }

    pub fn free_text(search: FullTextSearch) -> Self {
        Self::leaf(FreeText(search))
    }

    pub fn contains_table(search: FullTextSearch) -> Self {
        Self::leaf(ContainsTable(search))
    }

    fn unary<O: Into<Operator>>(&mut self, operator: O) -> &mut Self {
        self.root = self
            .root
            .clone()
            .and_then(|source| Provider::unary(operator, source));
        self
    }

    fn binary<O: Into<Operator>>(&mut self, operator: O, right: ProviderRef) -> &mut Self {
        self.root = self
            .root
            .clone()
            .and_then(|left| Provider::binary(operator, left, right));
        self
    }

    pub fn store<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.unary(Store::new(name))
    }

    pub fn select(&mut self, columns: Vec<usize>) -> &mut Self {
        self.unary(Select::new(columns))
    }

    pub fn filter(&mut self, predicate: ScalarExpr) -> &mut Self {
        self.unary(Filter::new(predicate))
    }

    pub fn sort<I: IntoIterator<Item = Ordering>>(&mut self, orders: I) -> &mut Self {
        self.unary(Sort::new(OrderSpec::new(orders)))
    }

    pub fn calculate(&mut self, columns: Vec<CalculatedColumn>) -> &mut Self {
        self.unary(Calculate::new(columns))
    }

    pub fn aggregate(
        &mut self,
        group_columns: Vec<usize>,
        aggregates: Vec<AggregateColumn>,
    ) -> &mut Self {
        self.unary(Aggregate::new(group_columns, aggregates))
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.unary(Distinct::new())
    }

    pub fn row_number<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.unary(RowNumber::new(name))
    }

    pub fn paging<S: Into<RowCount>, T: Into<RowCount>>(&mut self, skip: S, take: T) -> &mut Self {
        self.unary(Paging::new(skip, take))
    }

    pub fn skip<C: Into<RowCount>>(&mut self, count: C) -> &mut Self {
        self.unary(Skip::new(count))
    }

    pub fn take<C: Into<RowCount>>(&mut self, count: C) -> &mut Self {
        self.unary(Take::new(count))
    }

    pub fn existence<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.unary(Existence::new(name))
    }

    pub fn lock(&mut self, mode: LockMode, behavior: LockBehavior) -> &mut Self {
        self.unary(Lock::new(mode, behavior))
    }

    pub fn include<S: Into<String>>(
        &mut self,
        columns: Vec<usize>,
        rows: Vec<Vec<ScalarValue>>,
        name: S,
    ) -> &mut Self {
        self.unary(Include::new(columns, rows, name))
    }

    pub fn tag<S: Into<String>>(&mut self, tag: S) -> &mut Self {
        self.unary(Tag::new(tag))
    }

    pub fn index_hint<S: Into<String>>(&mut self, index: S) -> &mut Self {
        self.unary(IndexHint::new(index))
    }

    pub fn join(
        &mut self,
        join_type: JoinType,
        equal_columns: Vec<(usize, usize)>,
        right: ProviderRef,
    ) -> &mut Self {
        self.binary(Join::new(join_type, equal_columns), right)
    }

    pub fn predicate_join(
        &mut self,
        join_type: JoinType,
        predicate: ScalarExpr,
        right: ProviderRef,
    ) -> &mut Self {
        self.binary(PredicateJoin::new(join_type, predicate), right)
    }

    /// Correlates `right`, which must read the left tuple through `parameter`.
    pub fn apply(
        &mut self,
        parameter: ApplyParameter,
        apply_type: ApplyType,
        right: ProviderRef,
    ) -> &mut Self {
        self.binary(Apply::new(parameter, apply_type), right)
    }

    pub fn union(&mut self, right: ProviderRef) -> &mut Self {
        self.binary(Union::new(), right)
    }

    pub fn concat(&mut self, right: ProviderRef) -> &mut Self {
        self.binary(Concat::new(), right)
    }

    pub fn except(&mut self, right: ProviderRef) -> &mut Self {
        self.binary(Except::new(), right)
    }

    pub fn intersect(&mut self, right: ProviderRef) -> &mut Self {
        self.binary(Intersect::new(), right)
    }

    pub fn build(&self) -> StrataResult<ProviderRef> {
        self.root.clone()
    }
}
