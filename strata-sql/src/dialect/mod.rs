//! Target database dialects.
//!
//! The translator walks a SQL node tree and calls back into the [`Dialect`] once per
//! structural section of each construct: the entry and exit of a select, the alias and hints
//! of a table reference, the entry, argument delimiter and exit of a function call and so
//! on. Every method has an ANSI default in [`ansi`]; a dialect overrides the sections whose
//! syntax differs and hands the others back to the default.
//!
//! Before emitting a construct that not every engine has, the translator checks the
//! dialect's [`Feature`] set and fails with [`SqlError::Unsupported`](crate::error::SqlError::Unsupported) rather than emit text
//! the engine would reject.

use std::fmt::{Display, Formatter};

use arrow_schema::DataType;
use enum_dispatch::enum_dispatch;
use enumset::{EnumSet, EnumSetType};
use serde::Deserialize;
use strata::expr::{BinaryOperator, ScalarFunction, TrimKind};
use strum_macros::EnumIter;

use crate::ast::{
    ColumnDefinition, CreateIndex, CreateTable, OrderItem, SetOperator, SqlExpr, SqlJoinType,
    SqlSelect, TableRef,
};
use crate::error::SqlResult;
use crate::literal::LiteralStyle;
use crate::translator::Translator;

pub mod ansi;
mod generic;
mod keywords;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

pub use generic::*;
pub use keywords::is_plain_identifier;
pub use mysql::*;
pub use oracle::*;
pub use postgres::*;
pub use sqlite::*;
pub use sqlserver::*;

/// Selector of the target engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Generic,
    PostgreSql,
    SqlServer,
    MySql,
    Sqlite,
    Oracle,
}

impl Display for DialectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DialectKind::Generic => "generic SQL",
            DialectKind::PostgreSql => "PostgreSQL",
            DialectKind::SqlServer => "SQL Server",
            DialectKind::MySql => "MySQL",
            DialectKind::Sqlite => "SQLite",
            DialectKind::Oracle => "Oracle",
        };
        write!(f, "{}", name)
    }
}

/// Constructs only some engines can express.
#[derive(EnumSetType, Debug)]
pub enum Feature {
    /// Correlated joins: `CROSS APPLY` or `JOIN LATERAL`.
    Apply,
    RowLocks,
    SharedLocks,
    NoWait,
    SkipLocked,
    FullTextSearch,
    FullTextIndex,
    SpatialIndex,
    ClusteredIndex,
    ExceptIntersect,
    /// `(a, b) IN ((1, 2), (3, 4))`.
    RowValues,
    TimeType,
}

/// Where a type name is written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeUsage {
    Cast,
    Column,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectSection {
    /// `SELECT` keyword and modifiers, up to the first column.
    Entry,
    /// Keyword before the table reference.
    From,
    /// Keyword before the predicate.
    Where,
    /// Keyword before the grouping expressions.
    GroupBy,
    OrderBy,
    Limit,
    Lock,
    Exit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TableSection {
    Alias,
    Hints,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JoinSection {
    /// Between the left and the right table reference.
    Operator,
    /// After the right table reference of a join without a condition.
    Exit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionSection {
    Entry,
    Delimiter,
    Exit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinarySection {
    Entry,
    Operator,
    Exit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexSection {
    /// `CREATE ... INDEX`, up to the index name.
    Entry,
    /// After the table name, before the column list.
    Using,
    Columns,
    Exit,
}

#[enum_dispatch(AnyDialect)]
pub trait Dialect {
    fn kind(&self) -> DialectKind;

    fn features(&self) -> EnumSet<Feature>;

    fn is_reserved(&self, word: &str) -> bool {
        keywords::ANSI_RESERVED.contains(word.to_ascii_uppercase().as_str())
    }

    /// Spells an identifier, quoting it when it is reserved or not a plain identifier.
    fn quote_identifier(&self, name: &str) -> String {
        if is_plain_identifier(name) && !self.is_reserved(name) {
            name.to_string()
        } else {
            format!("\"{}\"", name.replace('"', "\"\""))
        }
    }

    /// Placeholder of the parameter bound at `position`, starting at 1.
    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn literal_style(&self) -> LiteralStyle {
        LiteralStyle::default()
    }

    fn type_name(&self, data_type: &DataType, usage: TypeUsage) -> SqlResult<String> {
        ansi::type_name(self.kind(), data_type, usage)
    }

    fn select(
        &self,
        t: &mut Translator<'_>,
        section: SelectSection,
        select: &SqlSelect,
    ) -> SqlResult<()> {
        ansi::select(t, section, select)
    }

    fn table(&self, t: &mut Translator<'_>, section: TableSection, table: &TableRef) -> SqlResult<()> {
        ansi::table(t, section, table)
    }

    fn join(
        &self,
        t: &mut Translator<'_>,
        section: JoinSection,
        join_type: SqlJoinType,
    ) -> SqlResult<()> {
        ansi::join(t, section, join_type)
    }

    fn function(
        &self,
        t: &mut Translator<'_>,
        section: FunctionSection,
        function: ScalarFunction,
    ) -> SqlResult<()> {
        ansi::function(t, section, function)
    }

    fn binary(
        &self,
        t: &mut Translator<'_>,
        section: BinarySection,
        op: BinaryOperator,
    ) -> SqlResult<()> {
        ansi::binary(t, section, op)
    }

    fn set_operator(&self, t: &mut Translator<'_>, op: SetOperator) -> SqlResult<()> {
        ansi::set_operator(t, op)
    }

    fn trim(
        &self,
        t: &mut Translator<'_>,
        kind: TrimKind,
        characters: Option<&str>,
        expr: &SqlExpr,
    ) -> SqlResult<()> {
        ansi::trim(t, kind, characters, expr)
    }

    fn row_number(&self, t: &mut Translator<'_>, order_by: &[OrderItem]) -> SqlResult<()> {
        ansi::row_number(t, order_by)
    }

    /// Writes an inline table of `rows`, aliased with its column names.
    fn values_table(&self, t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
        ansi::values_table(t, table)
    }

    /// Writes a [`TableRef::FullText`]. Only called when [`Feature::FullTextSearch`] is
    /// available.
    fn full_text_table(&self, t: &mut Translator<'_>, _table: &TableRef) -> SqlResult<()> {
        Err(t.unsupported("full-text search"))
    }

    fn identity_column(
        &self,
        t: &mut Translator<'_>,
        _column: &ColumnDefinition,
        _table: &CreateTable,
    ) -> SqlResult<()> {
        t.push(" GENERATED BY DEFAULT AS IDENTITY");
        Ok(())
    }

    /// Whether [`Dialect::identity_column`] already declares the primary key.
    fn identity_is_primary_key(&self) -> bool {
        false
    }

    fn create_index(
        &self,
        t: &mut Translator<'_>,
        section: IndexSection,
        index: &CreateIndex,
    ) -> SqlResult<()> {
        ansi::create_index(t, section, index)
    }
}

#[enum_dispatch]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyDialect {
    Generic(GenericDialect),
    PostgreSql(PostgreSqlDialect),
    SqlServer(SqlServerDialect),
    MySql(MySqlDialect),
    Sqlite(SqliteDialect),
    Oracle(OracleDialect),
}

impl AnyDialect {
    pub fn new(kind: DialectKind) -> Self {
        match kind {
            DialectKind::Generic => GenericDialect {}.into(),
            DialectKind::PostgreSql => PostgreSqlDialect {}.into(),
            DialectKind::SqlServer => SqlServerDialect {}.into(),
            DialectKind::MySql => MySqlDialect {}.into(),
            DialectKind::Sqlite => SqliteDialect {}.into(),
            DialectKind::Oracle => OracleDialect {}.into(),
        }
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.features().contains(feature)
    }
}

impl From<DialectKind> for AnyDialect {
    fn from(kind: DialectKind) -> Self {
        AnyDialect::new(kind)
    }
}
