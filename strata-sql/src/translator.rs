//! Renders a SQL node tree as text for one dialect.

use datafusion_common::ScalarValue;
use itertools::Itertools;
use log::trace;
use strata::expr::{QueryParameter, UnaryOperator};
use strata::operator::{LockBehavior, LockMode};
use strata::properties::Direction;

use crate::ast::{
    CreateIndex, CreateTable, IndexKind, LockClause, OrderItem, SetOperator, SqlExpr,
    SqlJoinType, SqlQuery, SqlSelect, Statement, TableRef,
};
use crate::dialect::{
    AnyDialect, BinarySection, Dialect, DialectKind, Feature, FunctionSection, IndexSection,
    JoinSection, SelectSection, TableSection, TypeUsage,
};
use crate::error::{SqlError, SqlResult};
use crate::literal::write_literal;

/// SQL text plus the parameters its placeholders bind, in placeholder order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    pub sql: String,
    pub parameters: Vec<QueryParameter>,
}

pub struct Translator<'d> {
    dialect: &'d AnyDialect,
    sql: String,
    parameters: Vec<QueryParameter>,
    /// Lock of the innermost select being written; tables read under it carry it.
    lock: Option<LockClause>,
}

impl<'d> Translator<'d> {
    pub fn new(dialect: &'d AnyDialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            parameters: vec![],
            lock: None,
        }
    }

    pub fn translate(mut self, statement: &Statement) -> SqlResult<Translation> {
        match statement {
            Statement::Query(query) => {
                for tag in &query.tags {
                    self.push("/* ");
                    self.push(&tag.replace("*/", "* /"));
                    self.push(" */ ");
                }
                self.query(&query.query)?;
            }
            Statement::CreateTable(table) => self.create_table(table)?,
            Statement::CreateIndex(index) => self.create_index(index)?,
        }
        trace!("{}: {}", self.kind(), self.sql);
        Ok(Translation {
            sql: self.sql,
            parameters: self.parameters,
        })
    }

    pub fn dialect(&self) -> &'d AnyDialect {
        self.dialect
    }

    pub fn kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    pub fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
    }

    /// Lock in effect for the tables being written.
    pub fn lock(&self) -> Option<LockClause> {
        self.lock
    }

    pub fn unsupported<S: Into<String>>(&self, construct: S) -> SqlError {
        SqlError::unsupported(self.kind(), construct)
    }

    pub fn require(&self, feature: Feature, construct: &str) -> SqlResult<()> {
        if self.dialect.supports(feature) {
            Ok(())
        } else {
            Err(self.unsupported(construct))
        }
    }

    pub fn literal(&mut self, value: &ScalarValue) -> SqlResult<()> {
        let text = write_literal(self.dialect, value)?;
        self.push(&text);
        Ok(())
    }

    /// Comma separated literals.
    pub fn literals(&mut self, values: &[ScalarValue]) -> SqlResult<()> {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.literal(value)?;
        }
        Ok(())
    }

    pub fn string(&mut self, value: &str) -> SqlResult<()> {
        self.literal(&ScalarValue::Utf8(Some(value.to_string())))
    }

    pub fn parameter(&mut self, parameter: &QueryParameter) {
        self.parameters.push(parameter.clone());
        let placeholder = self.dialect.placeholder(self.parameters.len());
        self.push(&placeholder);
    }

    pub fn exprs(&mut self, exprs: &[SqlExpr]) -> SqlResult<()> {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(expr)?;
        }
        Ok(())
    }

    pub fn order_items(&mut self, items: &[OrderItem]) -> SqlResult<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(&item.expr)?;
            if item.direction == Direction::Desc {
                self.push(" DESC");
            }
        }
        Ok(())
    }

    pub fn query(&mut self, query: &SqlQuery) -> SqlResult<()> {
        match query {
            SqlQuery::Select(select) => self.select(select),
            SqlQuery::SetOperation { op, left, right } => {
                if matches!(op, SetOperator::Except | SetOperator::Intersect) {
                    self.require(Feature::ExceptIntersect, "EXCEPT and INTERSECT")?;
                }
                self.query(left)?;
                let d = self.dialect;
                d.set_operator(self, *op)?;
                self.query(right)
            }
        }
    }

    pub fn select(&mut self, select: &SqlSelect) -> SqlResult<()> {
        if let Some(lock) = &select.lock {
            self.check_lock(lock)?;
        }
        let outer_lock = self.lock;
        self.lock = select.lock.or(outer_lock);

        let d = self.dialect;
        d.select(self, SelectSection::Entry, select)?;
        if select.columns.is_empty() {
            self.push("1");
        }
        for (i, item) in select.columns.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(&item.expr)?;
            self.push(" AS ");
            self.identifier(&item.alias);
        }
        d.select(self, SelectSection::From, select)?;
        if let Some(from) = &select.from {
            self.table_ref(from)?;
        }
        if let Some(selection) = &select.selection {
            d.select(self, SelectSection::Where, select)?;
            self.expr(selection)?;
        }
        if !select.group_by.is_empty() {
            d.select(self, SelectSection::GroupBy, select)?;
            self.exprs(&select.group_by)?;
        }
        d.select(self, SelectSection::OrderBy, select)?;
        d.select(self, SelectSection::Limit, select)?;
        d.select(self, SelectSection::Lock, select)?;
        d.select(self, SelectSection::Exit, select)?;

        self.lock = outer_lock;
        Ok(())
    }

    fn check_lock(&self, lock: &LockClause) -> SqlResult<()> {
        self.require(Feature::RowLocks, "row locks")?;
        if lock.mode == LockMode::Shared {
            self.require(Feature::SharedLocks, "shared row locks")?;
        }
        match lock.behavior {
            LockBehavior::Wait => Ok(()),
            LockBehavior::NoWait => self.require(Feature::NoWait, "NOWAIT locks"),
            LockBehavior::SkipLocked => self.require(Feature::SkipLocked, "SKIP LOCKED locks"),
        }
    }

    pub fn table_ref(&mut self, table: &TableRef) -> SqlResult<()> {
        let d = self.dialect;
        match table {
            TableRef::Table { name, .. } => {
                self.identifier(name);
                d.table(self, TableSection::Alias, table)?;
                d.table(self, TableSection::Hints, table)
            }
            TableRef::Derived { query, .. } => {
                self.push("(");
                self.query(query)?;
                self.push(")");
                d.table(self, TableSection::Alias, table)
            }
            TableRef::Join {
                join_type,
                left,
                right,
                on,
            } => {
                if matches!(join_type, SqlJoinType::CrossApply | SqlJoinType::OuterApply) {
                    self.require(Feature::Apply, "correlated joins")?;
                }
                self.table_ref(left)?;
                d.join(self, JoinSection::Operator, *join_type)?;
                self.table_ref(right)?;
                match on {
                    Some(on) => {
                        self.push(" ON ");
                        self.expr(on)
                    }
                    None => d.join(self, JoinSection::Exit, *join_type),
                }
            }
            TableRef::Values { rows, .. } => {
                if rows.is_empty() {
                    return Err(SqlError::Malformed("inline table without rows".to_string()));
                }
                d.values_table(self, table)
            }
            TableRef::FullText { .. } => {
                self.require(Feature::FullTextSearch, "full-text search")?;
                d.full_text_table(self, table)
            }
        }
    }

    pub fn expr(&mut self, expr: &SqlExpr) -> SqlResult<()> {
        let d = self.dialect;
        match expr {
            SqlExpr::Column { table, name } => {
                if let Some(table) = table {
                    self.identifier(table);
                    self.push(".");
                }
                self.identifier(name);
            }
            SqlExpr::Literal(value) => self.literal(value)?,
            SqlExpr::Parameter(parameter) => self.parameter(parameter),
            SqlExpr::Unary { op, expr } => {
                let (prefix, suffix) = match op {
                    UnaryOperator::Not => ("NOT (", ")"),
                    UnaryOperator::Negate => ("-(", ")"),
                    UnaryOperator::IsNull => ("(", " IS NULL)"),
                    UnaryOperator::IsNotNull => ("(", " IS NOT NULL)"),
                };
                self.push(prefix);
                self.expr(expr)?;
                self.push(suffix);
            }
            SqlExpr::Binary { op, left, right } => {
                d.binary(self, BinarySection::Entry, *op)?;
                self.expr(left)?;
                d.binary(self, BinarySection::Operator, *op)?;
                self.expr(right)?;
                d.binary(self, BinarySection::Exit, *op)?;
            }
            SqlExpr::Function { function, args } => {
                d.function(self, FunctionSection::Entry, *function)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        d.function(self, FunctionSection::Delimiter, *function)?;
                    }
                    self.expr(arg)?;
                }
                d.function(self, FunctionSection::Exit, *function)?;
            }
            SqlExpr::Aggregate { function, arg } => {
                self.push(&function.as_ref().to_ascii_uppercase());
                self.push("(");
                match arg {
                    Some(arg) => self.expr(arg)?,
                    None => self.push("*"),
                }
                self.push(")");
            }
            SqlExpr::Cast { expr, data_type } => {
                let type_name = d.type_name(data_type, TypeUsage::Cast)?;
                self.push("CAST(");
                self.expr(expr)?;
                self.push(" AS ");
                self.push(&type_name);
                self.push(")");
            }
            SqlExpr::Trim {
                expr,
                kind,
                characters,
            } => d.trim(self, *kind, characters.as_deref(), expr)?,
            SqlExpr::Case {
                branches,
                otherwise,
            } => {
                self.push("CASE");
                for (when, then) in branches {
                    self.push(" WHEN ");
                    self.expr(when)?;
                    self.push(" THEN ");
                    self.expr(then)?;
                }
                if let Some(otherwise) = otherwise {
                    self.push(" ELSE ");
                    self.expr(otherwise)?;
                }
                self.push(" END");
            }
            SqlExpr::Exists { query, negated } => {
                if *negated {
                    self.push("NOT ");
                }
                self.push("EXISTS (");
                self.query(query)?;
                self.push(")");
            }
            SqlExpr::InList {
                exprs,
                rows,
                negated,
            } => self.in_list(exprs, rows, *negated)?,
            SqlExpr::RowNumber { order_by } => d.row_number(self, order_by)?,
        }
        Ok(())
    }

    fn in_list(
        &mut self,
        exprs: &[SqlExpr],
        rows: &[Vec<ScalarValue>],
        negated: bool,
    ) -> SqlResult<()> {
        if rows.is_empty() {
            self.push(if negated { "(1 = 1)" } else { "(1 = 0)" });
            return Ok(());
        }
        if let Some(row) = rows.iter().find(|r| r.len() != exprs.len()) {
            return Err(SqlError::Malformed(format!(
                "row of {} values tested against {} expressions",
                row.len(),
                exprs.len()
            )));
        }

        if exprs.len() == 1 {
            self.expr(&exprs[0])?;
            self.push(if negated { " NOT IN (" } else { " IN (" });
            let values = rows.iter().map(|r| r[0].clone()).collect_vec();
            self.literals(&values)?;
            self.push(")");
            return Ok(());
        }

        if self.dialect.supports(Feature::RowValues) {
            self.push("(");
            self.exprs(exprs)?;
            self.push(if negated { ") NOT IN (" } else { ") IN (" });
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.push("(");
                self.literals(row)?;
                self.push(")");
            }
            self.push(")");
            return Ok(());
        }

        if negated {
            self.push("NOT ");
        }
        self.push("(");
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                self.push(" OR ");
            }
            self.push("(");
            for (j, (expr, value)) in exprs.iter().zip(row).enumerate() {
                if j > 0 {
                    self.push(" AND ");
                }
                self.expr(expr)?;
                self.push(" = ");
                self.literal(value)?;
            }
            self.push(")");
        }
        self.push(")");
        Ok(())
    }

    fn create_table(&mut self, table: &CreateTable) -> SqlResult<()> {
        let d = self.dialect;
        self.push("CREATE TABLE ");
        self.identifier(&table.name);
        self.push(" (");
        for (i, column) in table.columns.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            let type_name = d.type_name(&column.data_type, TypeUsage::Column)?;
            self.identifier(&column.name);
            self.push(" ");
            self.push(&type_name);
            if column.identity {
                d.identity_column(self, column, table)?;
            }
            if !column.nullable {
                self.push(" NOT NULL");
            }
        }
        let has_identity = table.columns.iter().any(|c| c.identity);
        if !table.primary_key.is_empty() && !(has_identity && d.identity_is_primary_key()) {
            let key = table
                .primary_key
                .iter()
                .map(|c| d.quote_identifier(c))
                .join(", ");
            self.push(", PRIMARY KEY (");
            self.push(&key);
            self.push(")");
        }
        self.push(")");
        Ok(())
    }

    fn create_index(&mut self, index: &CreateIndex) -> SqlResult<()> {
        match index.kind {
            IndexKind::BTree => {}
            IndexKind::Clustered => self.require(Feature::ClusteredIndex, "clustered indexes")?,
            IndexKind::Spatial => self.require(Feature::SpatialIndex, "spatial indexes")?,
            IndexKind::FullText => self.require(Feature::FullTextIndex, "full-text indexes")?,
        }
        if index.columns.is_empty() {
            return Err(SqlError::Malformed(format!(
                "index {} has no columns",
                index.name
            )));
        }
        let d = self.dialect;
        d.create_index(self, IndexSection::Entry, index)?;
        self.identifier(&index.name);
        self.push(" ON ");
        self.identifier(&index.table);
        d.create_index(self, IndexSection::Using, index)?;
        d.create_index(self, IndexSection::Columns, index)?;
        d.create_index(self, IndexSection::Exit, index)
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use strata::expr::{col, outer_col, ApplyParameter, BinaryOperator, ScalarFunction};
    use strata::operator::ApplyType;
    use strata::provider::ProviderBuilder;

    use super::*;
    use crate::ast::{ColumnDefinition, IndexColumn, QueryStatement, SelectItem};
    use crate::lowering::lower;
    use crate::test_utils::{customers, orders};

    fn translate(kind: DialectKind, statement: &Statement) -> SqlResult<Translation> {
        Translator::new(&AnyDialect::new(kind)).translate(statement)
    }

    fn query(select: SqlSelect) -> Statement {
        Statement::Query(QueryStatement {
            tags: vec![],
            query: SqlQuery::Select(Box::new(select)),
        })
    }

    fn item(expr: SqlExpr, alias: &str) -> SelectItem {
        SelectItem {
            expr,
            alias: alias.to_string(),
        }
    }

    fn int(v: i64) -> SqlExpr {
        SqlExpr::Literal(ScalarValue::Int64(Some(v)))
    }

    #[test]
    fn test_parameters_follow_placeholder_order() {
        let select = SqlSelect {
            columns: vec![item(SqlExpr::column("t0", "name"), "c0")],
            from: Some(TableRef::table("customers", "t0")),
            selection: Some(
                SqlExpr::column("t0", "id")
                    .eq(SqlExpr::Parameter(QueryParameter::new("id", DataType::Int64)))
                    .and(SqlExpr::column("t0", "city").eq(SqlExpr::Parameter(
                        QueryParameter::new("city", DataType::Utf8),
                    ))),
            ),
            ..Default::default()
        };

        let pg = translate(DialectKind::PostgreSql, &query(select.clone())).unwrap();
        assert_eq!(
            "SELECT t0.name AS c0 FROM customers AS t0 WHERE ((t0.id = $1) AND (t0.city = $2))",
            pg.sql
        );
        assert_eq!(
            vec!["id", "city"],
            pg.parameters.iter().map(|p| p.name.as_str()).collect_vec()
        );

        let mssql = translate(DialectKind::SqlServer, &query(select)).unwrap();
        assert!(mssql.sql.ends_with("((t0.id = @p1) AND (t0.city = @p2))"));
    }

    #[test]
    fn test_tags_are_comments() {
        let statement = Statement::Query(QueryStatement {
            tags: vec!["report */ drop".to_string()],
            query: SqlQuery::Select(Box::new(SqlSelect {
                columns: vec![item(int(1), "c0")],
                ..Default::default()
            })),
        });
        assert_eq!(
            "/* report * / drop */ SELECT 1 AS c0",
            translate(DialectKind::Generic, &statement).unwrap().sql
        );
    }

    #[test]
    fn test_in_list_forms() {
        let pair = vec![SqlExpr::column("t0", "a"), SqlExpr::column("t0", "b")];
        let rows = vec![
            vec![ScalarValue::Int64(Some(1)), ScalarValue::Int64(Some(2))],
            vec![ScalarValue::Int64(Some(3)), ScalarValue::Int64(Some(4))],
        ];
        let select = |exprs: Vec<SqlExpr>, rows: Vec<Vec<ScalarValue>>, negated| SqlSelect {
            columns: vec![item(SqlExpr::column("t0", "a"), "c0")],
            from: Some(TableRef::table("t", "t0")),
            selection: Some(SqlExpr::InList {
                exprs,
                rows,
                negated,
            }),
            ..Default::default()
        };

        let generic = translate(DialectKind::Generic, &query(select(pair.clone(), rows.clone(), false)));
        assert!(generic
            .unwrap()
            .sql
            .ends_with("WHERE (t0.a, t0.b) IN ((1, 2), (3, 4))"));

        let mssql = translate(DialectKind::SqlServer, &query(select(pair.clone(), rows, true)));
        assert!(mssql
            .unwrap()
            .sql
            .ends_with("WHERE NOT ((t0.a = 1 AND t0.b = 2) OR (t0.a = 3 AND t0.b = 4))"));

        let empty = translate(DialectKind::Generic, &query(select(pair, vec![], false)));
        assert!(empty.unwrap().sql.ends_with("WHERE (1 = 0)"));
    }

    #[test]
    fn test_function_spelling() {
        let select = SqlSelect {
            columns: vec![
                item(
                    SqlExpr::Function {
                        function: ScalarFunction::Length,
                        args: vec![SqlExpr::column("t0", "name")],
                    },
                    "c0",
                ),
                item(
                    SqlExpr::Function {
                        function: ScalarFunction::Year,
                        args: vec![SqlExpr::column("t0", "born")],
                    },
                    "c1",
                ),
            ],
            from: Some(TableRef::table("people", "t0")),
            ..Default::default()
        };
        let sql = |kind| translate(kind, &query(select.clone())).unwrap().sql;

        assert_eq!(
            "SELECT CHAR_LENGTH(t0.name) AS c0, EXTRACT(YEAR FROM t0.born) AS c1 FROM people AS t0",
            sql(DialectKind::Generic)
        );
        assert_eq!(
            "SELECT LEN(t0.name) AS c0, YEAR(t0.born) AS c1 FROM people AS t0",
            sql(DialectKind::SqlServer)
        );
        assert_eq!(
            "SELECT LENGTH(t0.name) AS c0, CAST(STRFTIME('%Y', t0.born) AS INTEGER) AS c1 FROM people AS t0",
            sql(DialectKind::Sqlite)
        );
    }

    #[test]
    fn test_string_concat() {
        let select = SqlSelect {
            columns: vec![item(
                SqlExpr::Binary {
                    op: BinaryOperator::StringConcat,
                    left: Box::new(SqlExpr::column("t0", "first")),
                    right: Box::new(SqlExpr::column("t0", "last")),
                },
                "c0",
            )],
            from: Some(TableRef::table("people", "t0")),
            ..Default::default()
        };
        let sql = |kind| translate(kind, &query(select.clone())).unwrap().sql;
        assert!(sql(DialectKind::Generic).starts_with("SELECT (t0.first || t0.last) AS c0"));
        assert!(sql(DialectKind::SqlServer).starts_with("SELECT (t0.first + t0.last) AS c0"));
        assert!(sql(DialectKind::MySql).starts_with("SELECT CONCAT(t0.first, t0.last) AS c0"));
    }

    #[test]
    fn test_create_table() {
        let table = CreateTable::new(
            "orders",
            vec![
                ColumnDefinition::new("id", DataType::Int64).identity(),
                ColumnDefinition::new("note", DataType::Utf8),
            ],
        )
        .with_primary_key(["id"]);
        let statement = Statement::CreateTable(table);
        let sql = |kind| translate(kind, &statement).unwrap().sql;

        assert_eq!(
            "CREATE TABLE orders (id BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL, note VARCHAR, PRIMARY KEY (id))",
            sql(DialectKind::Generic)
        );
        assert_eq!(
            "CREATE TABLE orders (id BIGINT IDENTITY(1, 1) NOT NULL, note NVARCHAR(MAX), PRIMARY KEY (id))",
            sql(DialectKind::SqlServer)
        );
        assert_eq!(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, note TEXT)",
            sql(DialectKind::Sqlite)
        );
    }

    #[test]
    fn test_index_kind_needs_feature() {
        let index = CreateIndex::new("ix_name", "customers", vec![IndexColumn::asc("name")])
            .with_kind(IndexKind::Clustered);
        let err = translate(DialectKind::PostgreSql, &Statement::CreateIndex(index.clone()))
            .unwrap_err();
        assert_eq!(
            SqlError::unsupported(DialectKind::PostgreSql, "clustered indexes"),
            err
        );
        assert_eq!(
            "CREATE CLUSTERED INDEX ix_name ON customers (name)",
            translate(DialectKind::SqlServer, &Statement::CreateIndex(index))
                .unwrap()
                .sql
        );
    }

    #[test]
    fn test_apply_needs_feature() {
        let p = ApplyParameter::next();
        let inner = ProviderBuilder::from_provider(orders())
            .filter(col(1).eq(outer_col(p, 0)))
            .build()
            .unwrap();
        let root = ProviderBuilder::from_provider(customers())
            .apply(p, ApplyType::Cross, inner)
            .build()
            .unwrap();
        let statement = lower(&root).unwrap();

        assert_eq!(
            SqlError::unsupported(DialectKind::Sqlite, "correlated joins"),
            translate(DialectKind::Sqlite, &statement).unwrap_err()
        );
        assert!(translate(DialectKind::SqlServer, &statement)
            .unwrap()
            .sql
            .contains(" CROSS APPLY "));
        assert!(translate(DialectKind::PostgreSql, &statement)
            .unwrap()
            .sql
            .contains(" CROSS JOIN LATERAL "));
    }

    #[test]
    fn test_except_needs_feature() {
        let root = ProviderBuilder::from_provider(customers())
            .select(vec![0])
            .except(
                ProviderBuilder::from_provider(orders())
                    .select(vec![1])
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let statement = lower(&root).unwrap();

        assert_eq!(
            SqlError::unsupported(DialectKind::MySql, "EXCEPT and INTERSECT"),
            translate(DialectKind::MySql, &statement).unwrap_err()
        );
        assert!(translate(DialectKind::Sqlite, &statement)
            .unwrap()
            .sql
            .contains(" EXCEPT "));
        assert!(translate(DialectKind::Oracle, &statement)
            .unwrap()
            .sql
            .contains(" MINUS "));
    }
}
