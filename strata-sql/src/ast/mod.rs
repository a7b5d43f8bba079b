//! SQL node tree.
//!
//! A small, dialect-neutral model of the SQL the compiler emits. Lowering builds it from a
//! provider tree; the translator walks it and asks the target dialect how to spell each
//! section. Operator, function and ordering vocabulary is shared with the scalar expressions
//! of the provider tree.

use arrow_schema::DataType;
use datafusion_common::ScalarValue;
use enum_as_inner::EnumAsInner;
use strata::expr::{BinaryOperator, QueryParameter, ScalarFunction, TrimKind, UnaryOperator};
use strata::operator::{FullTextSearch, IndexInfo, LockBehavior, LockMode};
use strata::properties::Direction;
use strata::provider::AggregateFunction;

mod ddl;

pub use ddl::*;

#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner)]
pub enum Statement {
    Query(QueryStatement),
    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
}

/// A query plus the tags attached to it, emitted as a leading comment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryStatement {
    pub tags: Vec<String>,
    pub query: SqlQuery,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner)]
pub enum SqlQuery {
    Select(Box<SqlSelect>),
    SetOperation {
        op: SetOperator,
        left: Box<SqlQuery>,
        right: Box<SqlQuery>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SetOperator {
    Union,
    UnionAll,
    Except,
    Intersect,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SqlSelect {
    pub distinct: bool,
    pub columns: Vec<SelectItem>,
    pub from: Option<TableRef>,
    pub selection: Option<SqlExpr>,
    pub group_by: Vec<SqlExpr>,
    /// Set when `columns` hold aggregate calls, with or without `group_by`.
    pub grouped: bool,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
    pub lock: Option<LockClause>,
}

impl SqlSelect {
    /// Expression of output column `index`.
    pub fn column(&self, index: usize) -> Option<&SqlExpr> {
        self.columns.get(index).map(|c| &c.expr)
    }

    pub fn has_window(&self) -> bool {
        self.columns.iter().any(|c| c.expr.contains_window())
    }

    /// No clause that changes which rows the select list sees, or how many it returns.
    pub fn is_plain(&self) -> bool {
        !self.distinct
            && !self.grouped
            && self.group_by.is_empty()
            && self.limit.is_none()
            && self.lock.is_none()
            && !self.has_window()
    }

    /// Adds `predicate` to the `WHERE` clause.
    pub fn and_where(&mut self, predicate: SqlExpr) {
        self.selection = Some(match self.selection.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SelectItem {
    pub expr: SqlExpr,
    pub alias: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderItem {
    pub expr: SqlExpr,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Limit {
    pub skip: Option<SqlExpr>,
    pub take: Option<SqlExpr>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LockClause {
    pub mode: LockMode,
    pub behavior: LockBehavior,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SqlJoinType {
    Inner,
    LeftOuter,
    Cross,
    /// Right side is a correlated sub-query evaluated once per left row.
    CrossApply,
    /// As `CrossApply`, keeping left rows the sub-query returns nothing for.
    OuterApply,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FullTextKind {
    /// Natural language search.
    FreeText,
    /// Search with a boolean condition language.
    Contains,
}

/// Name of the key column a full-text table reference exposes.
pub const FULL_TEXT_KEY: &str = "KEY";
/// Name of the rank column a full-text table reference exposes.
pub const FULL_TEXT_RANK: &str = "RANK";

#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner)]
pub enum TableRef {
    Table {
        name: String,
        alias: String,
        index_hint: Option<String>,
    },
    Derived {
        query: Box<SqlQuery>,
        alias: String,
    },
    Join {
        join_type: SqlJoinType,
        left: Box<TableRef>,
        right: Box<TableRef>,
        on: Option<SqlExpr>,
    },
    Values {
        rows: Vec<Vec<ScalarValue>>,
        alias: String,
        columns: Vec<String>,
    },
    /// Full-text search over `table`, exposing [`FULL_TEXT_KEY`] and [`FULL_TEXT_RANK`].
    FullText {
        kind: FullTextKind,
        table: String,
        key: String,
        columns: Vec<String>,
        criteria: SqlExpr,
        top_n: Option<SqlExpr>,
        alias: String,
    },
}

impl TableRef {
    pub fn table<N: Into<String>, A: Into<String>>(name: N, alias: A) -> Self {
        TableRef::Table {
            name: name.into(),
            alias: alias.into(),
            index_hint: None,
        }
    }

    pub fn full_text(
        kind: FullTextKind,
        search: &FullTextSearch,
        criteria: SqlExpr,
        top_n: Option<SqlExpr>,
        alias: String,
    ) -> Self {
        TableRef::FullText {
            kind,
            table: search.table.clone(),
            key: search.key.name.clone(),
            columns: search.columns.clone(),
            criteria,
            top_n,
            alias,
        }
    }

    /// Attaches an index hint to the first base table reachable through the left sides of
    /// joins. Returns false when there is none.
    pub fn hint_index(&mut self, index: &str) -> bool {
        match self {
            TableRef::Table { index_hint, .. } => {
                *index_hint = Some(index.to_string());
                true
            }
            TableRef::Join { left, .. } => left.hint_index(index),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner)]
pub enum SqlExpr {
    Column {
        table: Option<String>,
        name: String,
    },
    Literal(ScalarValue),
    Parameter(QueryParameter),
    Unary {
        op: UnaryOperator,
        expr: Box<SqlExpr>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    Function {
        function: ScalarFunction,
        args: Vec<SqlExpr>,
    },
    Aggregate {
        function: AggregateFunction,
        /// `None` counts rows.
        arg: Option<Box<SqlExpr>>,
    },
    Cast {
        expr: Box<SqlExpr>,
        data_type: DataType,
    },
    Trim {
        expr: Box<SqlExpr>,
        kind: TrimKind,
        characters: Option<String>,
    },
    Case {
        branches: Vec<(SqlExpr, SqlExpr)>,
        otherwise: Option<Box<SqlExpr>>,
    },
    Exists {
        query: Box<SqlQuery>,
        negated: bool,
    },
    /// Tests whether the tuple of `exprs` is one of `rows`.
    InList {
        exprs: Vec<SqlExpr>,
        rows: Vec<Vec<ScalarValue>>,
        negated: bool,
    },
    RowNumber {
        order_by: Vec<OrderItem>,
    },
}

impl SqlExpr {
    pub fn column<T: Into<String>, N: Into<String>>(table: T, name: N) -> Self {
        SqlExpr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn and(self, other: SqlExpr) -> SqlExpr {
        SqlExpr::Binary {
            op: BinaryOperator::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn eq(self, other: SqlExpr) -> SqlExpr {
        SqlExpr::Binary {
            op: BinaryOperator::Eq,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Turns a predicate into a value: `CASE WHEN predicate THEN TRUE ELSE FALSE END`.
    ///
    /// Not every dialect can select a predicate directly.
    pub fn truth_value(predicate: SqlExpr) -> SqlExpr {
        SqlExpr::Case {
            branches: vec![(predicate, SqlExpr::Literal(ScalarValue::Boolean(Some(true))))],
            otherwise: Some(Box::new(SqlExpr::Literal(ScalarValue::Boolean(Some(false))))),
        }
    }

    pub fn contains_window(&self) -> bool {
        match self {
            SqlExpr::RowNumber { .. } => true,
            SqlExpr::Column { .. }
            | SqlExpr::Literal(_)
            | SqlExpr::Parameter(_)
            | SqlExpr::Exists { .. }
            | SqlExpr::Aggregate { .. } => false,
            SqlExpr::Unary { expr, .. } | SqlExpr::Cast { expr, .. } | SqlExpr::Trim { expr, .. } => {
                expr.contains_window()
            }
            SqlExpr::Binary { left, right, .. } => left.contains_window() || right.contains_window(),
            SqlExpr::Function { args, .. } => args.iter().any(SqlExpr::contains_window),
            SqlExpr::Case {
                branches,
                otherwise,
            } => {
                branches
                    .iter()
                    .any(|(w, t)| w.contains_window() || t.contains_window())
                    || otherwise.as_ref().map_or(false, |e| e.contains_window())
            }
            SqlExpr::InList { exprs, .. } => exprs.iter().any(SqlExpr::contains_window),
        }
    }
}

impl From<&IndexInfo> for CreateIndex {
    fn from(index: &IndexInfo) -> Self {
        let columns = index
            .key_order
            .orders()
            .iter()
            .filter_map(|o| {
                index.columns.get(o.column).map(|c| IndexColumn {
                    name: c.name.clone(),
                    direction: o.direction,
                })
            })
            .collect();
        CreateIndex::new(index.name.clone(), index.table.clone(), columns)
    }
}
