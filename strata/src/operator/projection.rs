use std::fmt::Formatter;

use arrow_schema::DataType;
use itertools::Itertools;

use crate::error::StrataResult;
use crate::expr::ScalarExpr;
use crate::operator::{check_columns, check_expr, DisplayFields, OperatorTrait, ProviderKind};
use crate::provider::{ColumnOrigin, Header, ProviderRef};

/// Reorders and subsets the source columns.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Select {
    columns: Vec<usize>,
}

impl Select {
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }
}

impl OperatorTrait for Select {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let source = sources[0].header();
        if self.columns.is_empty() {
            malformed!(ProviderKind::Select, "no columns selected");
        }
        check_columns(ProviderKind::Select, &self.columns, source.len())?;
        if let Some(dup) = self.columns.iter().duplicates().next() {
            malformed!(ProviderKind::Select, "column #{} is selected twice", dup);
        }
        Ok(source.select(&self.columns))
    }
}

impl DisplayFields for Select {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("").field("columns", &self.columns).finish()
    }
}

/// Column computed from the source tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CalculatedColumn {
    pub name: String,
    pub data_type: DataType,
    pub expression: ScalarExpr,
}

impl CalculatedColumn {
    pub fn new<S: Into<String>>(name: S, data_type: DataType, expression: ScalarExpr) -> Self {
        Self {
            name: name.into(),
            data_type,
            expression,
        }
    }
}

/// Appends calculated columns to the source columns.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Calculate {
    columns: Vec<CalculatedColumn>,
}

impl Calculate {
    pub fn new(columns: Vec<CalculatedColumn>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[CalculatedColumn] {
        &self.columns
    }
}

impl OperatorTrait for Calculate {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let source = sources[0].header();
        if self.columns.is_empty() {
            malformed!(ProviderKind::Calculate, "no calculated columns");
        }
        for c in &self.columns {
            check_expr(ProviderKind::Calculate, &c.expression, source.len())?;
        }
        Ok(source.append(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.data_type.clone(), ColumnOrigin::Calculated)),
        ))
    }

    fn expressions(&self) -> Vec<&ScalarExpr> {
        self.columns.iter().map(|c| &c.expression).collect()
    }
}

impl DisplayFields for Calculate {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field(
                "columns",
                &format_args!(
                    "[{}]",
                    self.columns
                        .iter()
                        .map(|c| format!("{} := {}", c.name, c.expression))
                        .join(", ")
                ),
            )
            .finish()
    }
}

/// Appends a 1-based row number in source order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowNumber {
    name: String,
}

impl RowNumber {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl OperatorTrait for RowNumber {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().append(std::iter::once((
            self.name.clone(),
            DataType::Int64,
            ColumnOrigin::Calculated,
        ))))
    }
}

impl DisplayFields for RowNumber {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("").field("name", &self.name).finish()
    }
}
