//! ANSI spelling of every section, the default of [`Dialect`](super::Dialect).

use arrow_schema::{DataType, TimeUnit};
use itertools::Itertools;
use log::debug;
use strata::expr::{BinaryOperator, ScalarFunction, TrimKind};
use strata::operator::{LockBehavior, LockMode};
use strata::properties::Direction;

use crate::ast::{
    CreateIndex, IndexKind, OrderItem, SetOperator, SqlExpr, SqlJoinType, SqlSelect, TableRef,
};
use crate::dialect::{
    BinarySection, Dialect, DialectKind, FunctionSection, IndexSection, JoinSection, SelectSection,
    TableSection, TypeUsage,
};
use crate::error::{SqlError, SqlResult};
use crate::translator::Translator;

pub fn select(t: &mut Translator<'_>, section: SelectSection, select: &SqlSelect) -> SqlResult<()> {
    match section {
        SelectSection::Entry => {
            t.push("SELECT ");
            if select.distinct {
                t.push("DISTINCT ");
            }
        }
        SelectSection::From => {
            if select.from.is_some() {
                t.push(" FROM ");
            }
        }
        SelectSection::Where => t.push(" WHERE "),
        SelectSection::GroupBy => t.push(" GROUP BY "),
        SelectSection::OrderBy => {
            if !select.order_by.is_empty() {
                t.push(" ORDER BY ");
                t.order_items(&select.order_by)?;
            }
        }
        SelectSection::Limit => {
            if let Some(limit) = &select.limit {
                if let Some(skip) = &limit.skip {
                    t.push(" OFFSET ");
                    t.expr(skip)?;
                    t.push(" ROWS");
                }
                if let Some(take) = &limit.take {
                    t.push(" FETCH FIRST ");
                    t.expr(take)?;
                    t.push(" ROWS ONLY");
                }
            }
        }
        SelectSection::Lock => {
            if let Some(lock) = &select.lock {
                t.push(match lock.mode {
                    LockMode::Shared => " FOR SHARE",
                    LockMode::Exclusive | LockMode::Update => " FOR UPDATE",
                });
                t.push(match lock.behavior {
                    LockBehavior::Wait => "",
                    LockBehavior::NoWait => " NOWAIT",
                    LockBehavior::SkipLocked => " SKIP LOCKED",
                });
            }
        }
        SelectSection::Exit => {}
    }
    Ok(())
}

pub fn table(t: &mut Translator<'_>, section: TableSection, table: &TableRef) -> SqlResult<()> {
    match section {
        TableSection::Alias => {
            if let Some(alias) = alias_of(table) {
                t.push(" AS ");
                t.identifier(alias);
            }
        }
        TableSection::Hints => {
            if let TableRef::Table {
                index_hint: Some(index),
                name,
                ..
            } = table
            {
                debug!("{} has no index hints, ignoring {} on {}", t.kind(), index, name);
            }
        }
    }
    Ok(())
}

pub fn alias_of(table: &TableRef) -> Option<&str> {
    match table {
        TableRef::Table { alias, .. }
        | TableRef::Derived { alias, .. }
        | TableRef::Values { alias, .. }
        | TableRef::FullText { alias, .. } => Some(alias),
        TableRef::Join { .. } => None,
    }
}

pub fn join(t: &mut Translator<'_>, section: JoinSection, join_type: SqlJoinType) -> SqlResult<()> {
    match section {
        JoinSection::Operator => t.push(match join_type {
            SqlJoinType::Inner => " INNER JOIN ",
            SqlJoinType::LeftOuter => " LEFT OUTER JOIN ",
            SqlJoinType::Cross => " CROSS JOIN ",
            SqlJoinType::CrossApply => " CROSS JOIN LATERAL ",
            SqlJoinType::OuterApply => " LEFT OUTER JOIN LATERAL ",
        }),
        JoinSection::Exit => {
            if join_type == SqlJoinType::OuterApply {
                t.push(" ON TRUE");
            }
        }
    }
    Ok(())
}

pub fn function_name(function: ScalarFunction) -> &'static str {
    match function {
        ScalarFunction::Upper => "UPPER",
        ScalarFunction::Lower => "LOWER",
        ScalarFunction::Length => "CHAR_LENGTH",
        ScalarFunction::Substring => "SUBSTRING",
        ScalarFunction::Replace => "REPLACE",
        ScalarFunction::Abs => "ABS",
        ScalarFunction::Round => "ROUND",
        ScalarFunction::Coalesce => "COALESCE",
        ScalarFunction::CurrentTimestamp => "CURRENT_TIMESTAMP",
        ScalarFunction::Year => "YEAR",
        ScalarFunction::Month => "MONTH",
        ScalarFunction::Day => "DAY",
    }
}

pub fn function(
    t: &mut Translator<'_>,
    section: FunctionSection,
    function: ScalarFunction,
) -> SqlResult<()> {
    match (section, function) {
        (FunctionSection::Entry, ScalarFunction::CurrentTimestamp) => t.push("CURRENT_TIMESTAMP"),
        (FunctionSection::Exit, ScalarFunction::CurrentTimestamp) => {}
        (FunctionSection::Entry, ScalarFunction::Year | ScalarFunction::Month | ScalarFunction::Day) => {
            t.push("EXTRACT(");
            t.push(function_name(function));
            t.push(" FROM ");
        }
        (FunctionSection::Entry, _) => {
            t.push(function_name(function));
            t.push("(");
        }
        (FunctionSection::Delimiter, _) => t.push(", "),
        (FunctionSection::Exit, _) => t.push(")"),
    }
    Ok(())
}

pub fn binary(t: &mut Translator<'_>, section: BinarySection, op: BinaryOperator) -> SqlResult<()> {
    match section {
        BinarySection::Entry => t.push("("),
        BinarySection::Operator => {
            t.push(" ");
            t.push(op.symbol());
            t.push(" ");
        }
        BinarySection::Exit => t.push(")"),
    }
    Ok(())
}

pub fn set_operator(t: &mut Translator<'_>, op: SetOperator) -> SqlResult<()> {
    t.push(match op {
        SetOperator::Union => " UNION ",
        SetOperator::UnionAll => " UNION ALL ",
        SetOperator::Except => " EXCEPT ",
        SetOperator::Intersect => " INTERSECT ",
    });
    Ok(())
}

pub fn trim_keyword(kind: TrimKind) -> &'static str {
    match kind {
        TrimKind::Both => "BOTH",
        TrimKind::Leading => "LEADING",
        TrimKind::Trailing => "TRAILING",
    }
}

pub fn trim(
    t: &mut Translator<'_>,
    kind: TrimKind,
    characters: Option<&str>,
    expr: &SqlExpr,
) -> SqlResult<()> {
    t.push("TRIM(");
    t.push(trim_keyword(kind));
    if let Some(characters) = characters {
        t.push(" ");
        t.string(characters)?;
    }
    t.push(" FROM ");
    t.expr(expr)?;
    t.push(")");
    Ok(())
}

pub fn row_number(t: &mut Translator<'_>, order_by: &[OrderItem]) -> SqlResult<()> {
    t.push("ROW_NUMBER() OVER (");
    if !order_by.is_empty() {
        t.push("ORDER BY ");
        t.order_items(order_by)?;
    }
    t.push(")");
    Ok(())
}

pub fn values_table(t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
    let (rows, columns) = match table {
        TableRef::Values { rows, columns, .. } => (rows, columns),
        _ => return Err(SqlError::Malformed("expected an inline table".to_string())),
    };
    t.push("(VALUES ");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            t.push(", ");
        }
        t.push("(");
        t.literals(row)?;
        t.push(")");
    }
    t.push(")");
    let dialect = t.dialect();
    dialect_table_alias(t, table)?;
    t.push(" (");
    let names = columns.iter().map(|c| dialect.quote_identifier(c)).join(", ");
    t.push(&names);
    t.push(")");
    Ok(())
}

/// Writes an inline table as a derived `UNION ALL` of one-row selects, for engines without
/// column aliases on `VALUES`. `dual` is the table a select without `FROM` must read.
pub fn values_as_union(t: &mut Translator<'_>, table: &TableRef, dual: Option<&str>) -> SqlResult<()> {
    let (rows, columns) = match table {
        TableRef::Values { rows, columns, .. } => (rows, columns),
        _ => return Err(SqlError::Malformed("expected an inline table".to_string())),
    };
    t.push("(");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            t.push(" UNION ALL ");
        }
        t.push("SELECT ");
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                t.push(", ");
            }
            t.literal(value)?;
            if i == 0 {
                t.push(" AS ");
                if let Some(column) = columns.get(j) {
                    t.identifier(column);
                }
            }
        }
        if let Some(dual) = dual {
            t.push(" FROM ");
            t.push(dual);
        }
    }
    t.push(")");
    dialect_table_alias(t, table)
}

fn dialect_table_alias(t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
    let dialect = t.dialect();
    dialect.table(t, TableSection::Alias, table)
}

pub fn create_index(
    t: &mut Translator<'_>,
    section: IndexSection,
    index: &CreateIndex,
) -> SqlResult<()> {
    match section {
        IndexSection::Entry => {
            t.push("CREATE ");
            if index.unique {
                t.push("UNIQUE ");
            }
            t.push(match index.kind {
                IndexKind::BTree => "INDEX ",
                IndexKind::Clustered => "CLUSTERED INDEX ",
                IndexKind::Spatial => "SPATIAL INDEX ",
                IndexKind::FullText => "FULLTEXT INDEX ",
            });
        }
        IndexSection::Using | IndexSection::Exit => {}
        IndexSection::Columns => {
            t.push(" (");
            for (i, column) in index.columns.iter().enumerate() {
                if i > 0 {
                    t.push(", ");
                }
                t.identifier(&column.name);
                if column.direction == Direction::Desc {
                    t.push(" DESC");
                }
            }
            t.push(")");
        }
    }
    Ok(())
}

pub fn type_name(dialect: DialectKind, data_type: &DataType, _usage: TypeUsage) -> SqlResult<String> {
    let name = match data_type {
        DataType::Boolean => "BOOLEAN",
        DataType::Int8 | DataType::Int16 | DataType::UInt8 => "SMALLINT",
        DataType::Int32 | DataType::UInt16 => "INTEGER",
        DataType::Int64 | DataType::UInt32 => "BIGINT",
        DataType::UInt64 => "NUMERIC(20)",
        DataType::Float32 => "REAL",
        DataType::Float64 => "DOUBLE PRECISION",
        DataType::Utf8 | DataType::LargeUtf8 => "VARCHAR",
        DataType::Date32 => "DATE",
        DataType::Date64 => "TIMESTAMP(3)",
        DataType::Timestamp(TimeUnit::Microsecond, None) => "TIMESTAMP(6)",
        DataType::Time64(TimeUnit::Microsecond) => "TIME(6)",
        DataType::Binary | DataType::LargeBinary => "VARBINARY",
        DataType::FixedSizeBinary(16) => "BINARY(16)",
        other => return Err(SqlError::unsupported(dialect, format!("type {}", other))),
    };
    Ok(name.to_string())
}
