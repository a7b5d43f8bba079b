use arrow_schema::{DataType, TimeUnit};
use enumset::EnumSet;
use strata::expr::{BinaryOperator, ScalarFunction};

use crate::ast::{
    CreateIndex, IndexKind, OrderItem, SetOperator, SqlJoinType, SqlSelect, TableRef,
};
use crate::dialect::keywords::{ANSI_RESERVED, ORACLE_RESERVED};
use crate::dialect::{
    ansi, BinarySection, Dialect, DialectKind, Feature, FunctionSection, IndexSection,
    JoinSection, SelectSection, TableSection, TypeUsage,
};
use crate::error::{SqlError, SqlResult};
use crate::literal::{BinaryStyle, BooleanStyle, LiteralStyle};
use crate::translator::Translator;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OracleDialect {}

impl Dialect for OracleDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn features(&self) -> EnumSet<Feature> {
        Feature::Apply
            | Feature::RowLocks
            | Feature::NoWait
            | Feature::SkipLocked
            | Feature::SpatialIndex
            | Feature::ExceptIntersect
            | Feature::RowValues
    }

    fn is_reserved(&self, word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        ANSI_RESERVED.contains(upper.as_str()) || ORACLE_RESERVED.contains(upper.as_str())
    }

    fn placeholder(&self, position: usize) -> String {
        format!(":p{}", position)
    }

    fn literal_style(&self) -> LiteralStyle {
        LiteralStyle {
            boolean: BooleanStyle::Numeric,
            binary: BinaryStyle::HexToRaw,
            ..Default::default()
        }
    }

    fn type_name(&self, data_type: &DataType, _usage: TypeUsage) -> SqlResult<String> {
        let name = match data_type {
            DataType::Boolean => "NUMBER(1)",
            DataType::Int8 | DataType::Int16 | DataType::UInt8 => "NUMBER(5)",
            DataType::Int32 | DataType::UInt16 => "NUMBER(10)",
            DataType::Int64 | DataType::UInt32 => "NUMBER(19)",
            DataType::UInt64 => "NUMBER(20)",
            DataType::Float32 => "BINARY_FLOAT",
            DataType::Float64 => "BINARY_DOUBLE",
            DataType::Utf8 | DataType::LargeUtf8 => "VARCHAR2(4000)",
            DataType::Date32 => "DATE",
            DataType::Date64 => "TIMESTAMP(3)",
            DataType::Timestamp(TimeUnit::Microsecond, None) => "TIMESTAMP(6)",
            DataType::Binary | DataType::LargeBinary => "BLOB",
            DataType::FixedSizeBinary(16) => "RAW(16)",
            other => return Err(SqlError::unsupported(self.kind(), format!("type {}", other))),
        };
        Ok(name.to_string())
    }

    fn select(
        &self,
        t: &mut Translator<'_>,
        section: SelectSection,
        select: &SqlSelect,
    ) -> SqlResult<()> {
        match section {
            SelectSection::From if select.from.is_none() => {
                t.push(" FROM DUAL");
                Ok(())
            }
            _ => ansi::select(t, section, select),
        }
    }

    /// Table aliases take no `AS`.
    fn table(&self, t: &mut Translator<'_>, section: TableSection, table: &TableRef) -> SqlResult<()> {
        match (section, ansi::alias_of(table)) {
            (TableSection::Alias, Some(alias)) => {
                t.push(" ");
                t.identifier(alias);
                Ok(())
            }
            _ => ansi::table(t, section, table),
        }
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
            (FunctionSection::Entry, ScalarFunction::Length) => t.push("LENGTH("),
            (FunctionSection::Entry, ScalarFunction::Substring) => t.push("SUBSTR("),
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
        if op != BinaryOperator::Modulo {
            return ansi::binary(t, section, op);
        }
        t.push(match section {
            BinarySection::Entry => "MOD(",
            BinarySection::Operator => ", ",
            BinarySection::Exit => ")",
        });
        Ok(())
    }

    fn set_operator(&self, t: &mut Translator<'_>, op: SetOperator) -> SqlResult<()> {
        match op {
            SetOperator::Except => {
                t.push(" MINUS ");
                Ok(())
            }
            _ => ansi::set_operator(t, op),
        }
    }

    fn row_number(&self, t: &mut Translator<'_>, order_by: &[OrderItem]) -> SqlResult<()> {
        if order_by.is_empty() {
            t.push("ROW_NUMBER() OVER (ORDER BY NULL)");
            Ok(())
        } else {
            ansi::row_number(t, order_by)
        }
    }

    fn values_table(&self, t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
        ansi::values_as_union(t, table, Some("DUAL"))
    }

    fn create_index(
        &self,
        t: &mut Translator<'_>,
        section: IndexSection,
        index: &CreateIndex,
    ) -> SqlResult<()> {
        match (section, index.kind) {
            (IndexSection::Entry, IndexKind::Spatial) => t.push("CREATE INDEX "),
            (IndexSection::Exit, IndexKind::Spatial) => t.push(" INDEXTYPE IS MDSYS.SPATIAL_INDEX"),
            _ => return ansi::create_index(t, section, index),
        }
        Ok(())
    }
}
