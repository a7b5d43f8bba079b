use arrow_schema::{DataType, TimeUnit};
use enumset::EnumSet;
use itertools::Itertools;
use strata::expr::{BinaryOperator, ScalarFunction, TrimKind};
use strata::operator::{LockBehavior, LockMode};

use crate::ast::{
    ColumnDefinition, CreateTable, FullTextKind, OrderItem, SqlExpr, SqlJoinType, SqlSelect,
    TableRef,
};
use crate::dialect::keywords::{ANSI_RESERVED, SQLSERVER_RESERVED};
use crate::dialect::{
    ansi, is_plain_identifier, BinarySection, Dialect, DialectKind, Feature, FunctionSection,
    JoinSection, SelectSection, TableSection, TypeUsage,
};
use crate::error::{SqlError, SqlResult};
use crate::literal::{
    BinaryStyle, BooleanStyle, GuidStyle, LiteralStyle, StringStyle, TemporalStyle,
};
use crate::translator::Translator;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SqlServerDialect {}

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn features(&self) -> EnumSet<Feature> {
        EnumSet::all() - Feature::RowValues - Feature::FullTextIndex
    }

    fn is_reserved(&self, word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        ANSI_RESERVED.contains(upper.as_str()) || SQLSERVER_RESERVED.contains(upper.as_str())
    }

    fn quote_identifier(&self, name: &str) -> String {
        if is_plain_identifier(name) && !self.is_reserved(name) {
            name.to_string()
        } else {
            format!("[{}]", name.replace(']', "]]"))
        }
    }

    fn placeholder(&self, position: usize) -> String {
        format!("@p{}", position)
    }

    fn literal_style(&self) -> LiteralStyle {
        LiteralStyle {
            boolean: BooleanStyle::Numeric,
            string: StringStyle::National,
            binary: BinaryStyle::HexPrefix,
            temporal: TemporalStyle::Cast,
            guid: GuidStyle::Cast,
        }
    }

    fn type_name(&self, data_type: &DataType, usage: TypeUsage) -> SqlResult<String> {
        let name = match data_type {
            DataType::Boolean => "BIT",
            DataType::Int8 | DataType::Int16 | DataType::UInt8 => "SMALLINT",
            DataType::Int32 | DataType::UInt16 => "INT",
            DataType::Int64 | DataType::UInt32 => "BIGINT",
            DataType::UInt64 => "DECIMAL(20)",
            DataType::Float32 => "REAL",
            DataType::Float64 => "FLOAT",
            DataType::Utf8 | DataType::LargeUtf8 => "NVARCHAR(MAX)",
            DataType::Date64 => "DATETIME2(3)",
            DataType::Timestamp(TimeUnit::Microsecond, None) => "DATETIME2(6)",
            DataType::Binary | DataType::LargeBinary => "VARBINARY(MAX)",
            DataType::FixedSizeBinary(16) => "UNIQUEIDENTIFIER",
            _ => return ansi::type_name(self.kind(), data_type, usage),
        };
        Ok(name.to_string())
    }

    fn select(
        &self,
        t: &mut Translator<'_>,
        section: SelectSection,
        select: &SqlSelect,
    ) -> SqlResult<()> {
        let skip = select.limit.as_ref().and_then(|l| l.skip.as_ref());
        let take = select.limit.as_ref().and_then(|l| l.take.as_ref());
        match section {
            SelectSection::Entry => {
                ansi::select(t, section, select)?;
                if let (None, Some(take)) = (skip, take) {
                    t.push("TOP (");
                    t.expr(take)?;
                    t.push(") ");
                }
            }
            SelectSection::OrderBy if select.order_by.is_empty() && skip.is_some() => {
                t.push(" ORDER BY (SELECT NULL)");
            }
            SelectSection::Limit => {
                if let Some(skip) = skip {
                    t.push(" OFFSET ");
                    t.expr(skip)?;
                    t.push(" ROWS");
                    if let Some(take) = take {
                        t.push(" FETCH NEXT ");
                        t.expr(take)?;
                        t.push(" ROWS ONLY");
                    }
                }
            }
            // Row locks are table hints.
            SelectSection::Lock => {}
            _ => ansi::select(t, section, select)?,
        }
        Ok(())
    }

    fn table(&self, t: &mut Translator<'_>, section: TableSection, table: &TableRef) -> SqlResult<()> {
        if section != TableSection::Hints {
            return ansi::table(t, section, table);
        }
        let index_hint = match table {
            TableRef::Table { index_hint, .. } => index_hint.as_deref(),
            _ => return Ok(()),
        };

        let mut hints = vec![];
        if let Some(index) = index_hint {
            hints.push(format!("INDEX({})", self.quote_identifier(index)));
        }
        if let Some(lock) = t.lock() {
            hints.push(
                match lock.mode {
                    LockMode::Shared => "HOLDLOCK",
                    LockMode::Exclusive => "XLOCK",
                    LockMode::Update => "UPDLOCK",
                }
                .to_string(),
            );
            hints.push("ROWLOCK".to_string());
            match lock.behavior {
                LockBehavior::Wait => {}
                LockBehavior::NoWait => hints.push("NOWAIT".to_string()),
                LockBehavior::SkipLocked => hints.push("READPAST".to_string()),
            }
        }
        if !hints.is_empty() {
            t.push(" WITH (");
            t.push(&hints.join(", "));
            t.push(")");
        }
        Ok(())
    }

    fn join(
        &self,
        t: &mut Translator<'_>,
        section: JoinSection,
        join_type: SqlJoinType,
    ) -> SqlResult<()> {
        match (section, join_type) {
            (JoinSection::Operator, SqlJoinType::CrossApply) => t.push(" CROSS APPLY "),
            (JoinSection::Operator, SqlJoinType::OuterApply) => t.push(" OUTER APPLY "),
            (JoinSection::Exit, _) => {}
            _ => return ansi::join(t, section, join_type),
        }
        Ok(())
    }

    fn function(
        &self,
        t: &mut Translator<'_>,
        section: FunctionSection,
        function: ScalarFunction,
    ) -> SqlResult<()> {
        match (section, function) {
            (FunctionSection::Entry, ScalarFunction::Length) => t.push("LEN("),
            (FunctionSection::Entry, ScalarFunction::Year | ScalarFunction::Month | ScalarFunction::Day) => {
                t.push(ansi::function_name(function));
                t.push("(");
            }
            _ => return ansi::function(t, section, function),
        }
        Ok(())
    }

    fn binary(
        &self,
        t: &mut Translator<'_>,
        section: BinarySection,
        op: BinaryOperator,
    ) -> SqlResult<()> {
        match (section, op) {
            (BinarySection::Operator, BinaryOperator::StringConcat) => {
                t.push(" + ");
                Ok(())
            }
            _ => ansi::binary(t, section, op),
        }
    }

    fn trim(
        &self,
        t: &mut Translator<'_>,
        kind: TrimKind,
        characters: Option<&str>,
        expr: &SqlExpr,
    ) -> SqlResult<()> {
        match (kind, characters) {
            (TrimKind::Both, Some(_)) => return ansi::trim(t, kind, characters, expr),
            (_, Some(_)) => {
                return Err(t.unsupported("trimming given characters from one end"));
            }
            (TrimKind::Both, None) => {
                t.push("LTRIM(RTRIM(");
                t.expr(expr)?;
                t.push("))");
            }
            (TrimKind::Leading, None) => {
                t.push("LTRIM(");
                t.expr(expr)?;
                t.push(")");
            }
            (TrimKind::Trailing, None) => {
                t.push("RTRIM(");
                t.expr(expr)?;
                t.push(")");
            }
        }
        Ok(())
    }

    fn row_number(&self, t: &mut Translator<'_>, order_by: &[OrderItem]) -> SqlResult<()> {
        if order_by.is_empty() {
            t.push("ROW_NUMBER() OVER (ORDER BY (SELECT NULL))");
            Ok(())
        } else {
            ansi::row_number(t, order_by)
        }
    }

    fn full_text_table(&self, t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
        let (kind, name, columns, criteria, top_n) = match table {
            TableRef::FullText {
                kind,
                table,
                columns,
                criteria,
                top_n,
                ..
            } => (kind, table, columns, criteria, top_n),
            _ => return Err(SqlError::Malformed("expected a full-text search".to_string())),
        };
        t.push(match kind {
            FullTextKind::FreeText => "FREETEXTTABLE(",
            FullTextKind::Contains => "CONTAINSTABLE(",
        });
        t.identifier(name);
        t.push(", ");
        if columns.is_empty() {
            t.push("*");
        } else {
            let columns = columns.iter().map(|c| self.quote_identifier(c)).join(", ");
            t.push("(");
            t.push(&columns);
            t.push(")");
        }
        t.push(", ");
        t.expr(criteria)?;
        if let Some(top_n) = top_n {
            t.push(", ");
            t.expr(top_n)?;
        }
        t.push(")");
        self.table(t, TableSection::Alias, table)
    }

    fn identity_column(
        &self,
        t: &mut Translator<'_>,
        _column: &ColumnDefinition,
        _table: &CreateTable,
    ) -> SqlResult<()> {
        t.push(" IDENTITY(1, 1)");
        Ok(())
    }
}
