use arrow_schema::DataType;
use enumset::EnumSet;
use strata::expr::{ScalarFunction, TrimKind};

use crate::ast::{ColumnDefinition, CreateTable, SqlExpr, SqlSelect, TableRef};
use crate::dialect::keywords::{ANSI_RESERVED, SQLITE_RESERVED};
use crate::dialect::{
    ansi, Dialect, DialectKind, Feature, FunctionSection, SelectSection, TableSection,
    TypeUsage,
};
use crate::error::{SqlError, SqlResult};
use crate::literal::{BooleanStyle, LiteralStyle, TemporalStyle};
use crate::translator::Translator;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SqliteDialect {}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn features(&self) -> EnumSet<Feature> {
        Feature::ExceptIntersect | Feature::RowValues | Feature::TimeType
    }

    fn is_reserved(&self, word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        ANSI_RESERVED.contains(upper.as_str()) || SQLITE_RESERVED.contains(upper.as_str())
    }

    fn literal_style(&self) -> LiteralStyle {
        LiteralStyle {
            boolean: BooleanStyle::Numeric,
            temporal: TemporalStyle::Plain,
            ..Default::default()
        }
    }

    /// Storage classes; dates and times are ISO-8601 text.
    fn type_name(&self, data_type: &DataType, _usage: TypeUsage) -> SqlResult<String> {
        let name = match data_type {
            DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => "INTEGER",
            DataType::Float32 | DataType::Float64 => "REAL",
            DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Date32
            | DataType::Date64
            | DataType::Timestamp(_, None)
            | DataType::Time64(_) => "TEXT",
            DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => "BLOB",
            other => {
                return Err(SqlError::unsupported(self.kind(), format!("type {}", other)))
            }
        };
        Ok(name.to_string())
    }

    fn select(
        &self,
        t: &mut Translator<'_>,
        section: SelectSection,
        select: &SqlSelect,
    ) -> SqlResult<()> {
        match (section, &select.limit) {
            (SelectSection::Limit, Some(limit)) => {
                t.push(" LIMIT ");
                match &limit.take {
                    Some(take) => t.expr(take)?,
                    None => t.push("-1"),
                }
                if let Some(skip) = &limit.skip {
                    t.push(" OFFSET ");
                    t.expr(skip)?;
                }
                Ok(())
            }
            _ => ansi::select(t, section, select),
        }
    }

    fn table(&self, t: &mut Translator<'_>, section: TableSection, table: &TableRef) -> SqlResult<()> {
        match (section, table) {
            (
                TableSection::Hints,
                TableRef::Table {
                    index_hint: Some(index),
                    ..
                },
            ) => {
                t.push(" INDEXED BY ");
                t.identifier(index);
                Ok(())
            }
            _ => ansi::table(t, section, table),
        }
    }

    fn function(
        &self,
        t: &mut Translator<'_>,
        section: FunctionSection,
        function: ScalarFunction,
    ) -> SqlResult<()> {
        let part = match function {
            ScalarFunction::Year => Some("%Y"),
            ScalarFunction::Month => Some("%m"),
            ScalarFunction::Day => Some("%d"),
            _ => None,
        };
        match (section, function, part) {
            (FunctionSection::Entry, _, Some(part)) => {
                t.push("CAST(STRFTIME('");
                t.push(part);
                t.push("', ");
            }
            (FunctionSection::Exit, _, Some(_)) => t.push(") AS INTEGER)"),
            (FunctionSection::Entry, ScalarFunction::Length, _) => t.push("LENGTH("),
            (FunctionSection::Entry, ScalarFunction::Substring, _) => t.push("SUBSTR("),
            _ => return ansi::function(t, section, function),
        }
        Ok(())
    }

    fn trim(
        &self,
        t: &mut Translator<'_>,
        kind: TrimKind,
        characters: Option<&str>,
        expr: &SqlExpr,
    ) -> SqlResult<()> {
        t.push(match kind {
            TrimKind::Both => "TRIM(",
            TrimKind::Leading => "LTRIM(",
            TrimKind::Trailing => "RTRIM(",
        });
        t.expr(expr)?;
        if let Some(characters) = characters {
            t.push(", ");
            t.string(characters)?;
        }
        t.push(")");
        Ok(())
    }

    fn values_table(&self, t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
        ansi::values_as_union(t, table, None)
    }

    fn identity_column(
        &self,
        t: &mut Translator<'_>,
        column: &ColumnDefinition,
        table: &CreateTable,
    ) -> SqlResult<()> {
        if table.primary_key != [column.name.as_str()] {
            return Err(t.unsupported(format!(
                "identity column {} outside a single column primary key",
                column.name
            )));
        }
        t.push(" PRIMARY KEY AUTOINCREMENT");
        Ok(())
    }

    fn identity_is_primary_key(&self) -> bool {
        true
    }
}
