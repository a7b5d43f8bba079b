use arrow_schema::{DataType, TimeUnit};
use enumset::EnumSet;
use strata::expr::BinaryOperator;

use crate::ast::{
    ColumnDefinition, CreateTable, FullTextKind, SqlSelect, TableRef, FULL_TEXT_KEY,
    FULL_TEXT_RANK,
};
use crate::dialect::keywords::{ANSI_RESERVED, MYSQL_RESERVED};
use crate::dialect::{
    ansi, is_plain_identifier, BinarySection, Dialect, DialectKind, Feature, SelectSection,
    TableSection, TypeUsage,
};
use crate::error::{SqlError, SqlResult};
use crate::literal::{LiteralStyle, StringStyle};
use crate::translator::Translator;

/// `LIMIT` needs a row count; this is the largest one.
const NO_LIMIT: &str = "18446744073709551615";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MySqlDialect {}

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn features(&self) -> EnumSet<Feature> {
        EnumSet::all() - Feature::ExceptIntersect - Feature::ClusteredIndex
    }

    fn is_reserved(&self, word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        ANSI_RESERVED.contains(upper.as_str()) || MYSQL_RESERVED.contains(upper.as_str())
    }

    fn quote_identifier(&self, name: &str) -> String {
        if is_plain_identifier(name) && !self.is_reserved(name) {
            name.to_string()
        } else {
            format!("`{}`", name.replace('`', "``"))
        }
    }

    fn literal_style(&self) -> LiteralStyle {
        LiteralStyle {
            string: StringStyle::Backslash,
            ..Default::default()
        }
    }

    fn type_name(&self, data_type: &DataType, usage: TypeUsage) -> SqlResult<String> {
        let cast = usage == TypeUsage::Cast;
        let name = match data_type {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 if cast => {
                "SIGNED"
            }
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 if cast => {
                "UNSIGNED"
            }
            DataType::Boolean if cast => "SIGNED",
            DataType::Utf8 | DataType::LargeUtf8 if cast => "CHAR",
            DataType::Binary | DataType::LargeBinary if cast => "BINARY",
            DataType::Boolean => "BOOLEAN",
            DataType::Int8 => "TINYINT",
            DataType::Int16 => "SMALLINT",
            DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::UInt8 => "TINYINT UNSIGNED",
            DataType::UInt16 => "SMALLINT UNSIGNED",
            DataType::UInt32 => "INT UNSIGNED",
            DataType::UInt64 => "BIGINT UNSIGNED",
            DataType::Float32 => "FLOAT",
            DataType::Float64 => "DOUBLE",
            DataType::Utf8 | DataType::LargeUtf8 => "VARCHAR(255)",
            DataType::Binary | DataType::LargeBinary => "LONGBLOB",
            DataType::Date64 => "DATETIME(3)",
            DataType::Timestamp(TimeUnit::Microsecond, None) => "DATETIME(6)",
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
        match (section, &select.limit) {
            (SelectSection::Limit, Some(limit)) => {
                t.push(" LIMIT ");
                match &limit.take {
                    Some(take) => t.expr(take)?,
                    None => t.push(NO_LIMIT),
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
                t.push(" FORCE INDEX (");
                t.identifier(index);
                t.push(")");
                Ok(())
            }
            _ => ansi::table(t, section, table),
        }
    }

    fn binary(
        &self,
        t: &mut Translator<'_>,
        section: BinarySection,
        op: BinaryOperator,
    ) -> SqlResult<()> {
        if op != BinaryOperator::StringConcat {
            return ansi::binary(t, section, op);
        }
        t.push(match section {
            BinarySection::Entry => "CONCAT(",
            BinarySection::Operator => ", ",
            BinarySection::Exit => ")",
        });
        Ok(())
    }

    fn values_table(&self, t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
        ansi::values_as_union(t, table, None)
    }

    fn full_text_table(&self, t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
        let (kind, name, key, columns, criteria, top_n) = match table {
            TableRef::FullText {
                kind,
                table,
                key,
                columns,
                criteria,
                top_n,
                ..
            } => (kind, table, key, columns, criteria, top_n),
            _ => return Err(SqlError::Malformed("expected a full-text search".to_string())),
        };
        if columns.is_empty() {
            return Err(t.unsupported("full-text search over every indexed column"));
        }
        let matches = |t: &mut Translator<'_>| -> SqlResult<()> {
            t.push("MATCH (");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    t.push(", ");
                }
                t.identifier(column);
            }
            t.push(") AGAINST (");
            t.expr(criteria)?;
            t.push(match kind {
                FullTextKind::FreeText => " IN NATURAL LANGUAGE MODE)",
                FullTextKind::Contains => " IN BOOLEAN MODE)",
            });
            Ok(())
        };

        t.push("(SELECT ");
        t.identifier(key);
        t.push(" AS ");
        t.identifier(FULL_TEXT_KEY);
        t.push(", ");
        matches(t)?;
        t.push(" AS ");
        t.identifier(FULL_TEXT_RANK);
        t.push(" FROM ");
        t.identifier(name);
        t.push(" WHERE ");
        matches(t)?;
        if let Some(top_n) = top_n {
            t.push(" ORDER BY ");
            t.identifier(FULL_TEXT_RANK);
            t.push(" DESC LIMIT ");
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
        t.push(" AUTO_INCREMENT");
        Ok(())
    }
}
