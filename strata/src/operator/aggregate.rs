use std::fmt::Formatter;

use arrow_schema::DataType;
use itertools::Itertools;

use crate::error::StrataResult;
use crate::operator::{check_columns, DisplayFields, OperatorTrait, ProviderKind};
use crate::properties::OrderSpec;
use crate::provider::{AggregateFunction, Column, ColumnOrigin, Header, ProviderRef};

/// One aggregate computed per group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggregateColumn {
    pub name: String,
    pub function: AggregateFunction,
    /// Aggregated source column; `None` counts rows.
    pub source: Option<usize>,
}

impl AggregateColumn {
    pub fn new<S: Into<String>>(name: S, function: AggregateFunction, source: usize) -> Self {
        Self {
            name: name.into(),
            function,
            source: Some(source),
        }
    }

    pub fn count_rows<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            function: AggregateFunction::Count,
            source: None,
        }
    }

    pub fn with_source(&self, source: Option<usize>) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }
}

/// Groups the source by `group_columns`, producing the group columns followed by the
/// aggregates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aggregate {
    group_columns: Vec<usize>,
    aggregates: Vec<AggregateColumn>,
}

impl Aggregate {
    pub fn new(group_columns: Vec<usize>, aggregates: Vec<AggregateColumn>) -> Self {
        Self {
            group_columns,
            aggregates,
        }
    }

    pub fn group_columns(&self) -> &[usize] {
        &self.group_columns
    }

    pub fn aggregates(&self) -> &[AggregateColumn] {
        &self.aggregates
    }

    pub fn is_grouping(&self) -> bool {
        !self.group_columns.is_empty()
    }
}

impl OperatorTrait for Aggregate {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let source = sources[0].header();
        if self.group_columns.is_empty() && self.aggregates.is_empty() {
            malformed!(ProviderKind::Aggregate, "neither group columns nor aggregates");
        }
        check_columns(ProviderKind::Aggregate, &self.group_columns, source.len())?;
        check_columns(
            ProviderKind::Aggregate,
            self.aggregates.iter().filter_map(|a| a.source.as_ref()),
            source.len(),
        )?;
        if let Some(a) = self
            .aggregates
            .iter()
            .find(|a| a.source.is_none() && a.function != AggregateFunction::Count)
        {
            malformed!(ProviderKind::Aggregate, "{} has no source column", a.name);
        }

        let groups = self
            .group_columns
            .iter()
            .enumerate()
            .map(|(i, g)| source.columns()[*g].pass_through(0, i));
        let aggregates = self.aggregates.iter().enumerate().map(|(i, a)| {
            let data_type = match a.source {
                Some(c) => a.function.result_type(&source.columns()[c].data_type),
                None => DataType::Int64,
            };
            Column::new(
                self.group_columns.len() + i,
                a.name.clone(),
                data_type,
                ColumnOrigin::Aggregate(a.function),
            )
        });

        Ok(Header::new(
            groups.chain(aggregates).collect(),
            OrderSpec::empty(),
        ))
    }
}

impl DisplayFields for Aggregate {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        let aggregates = self
            .aggregates
            .iter()
            .map(|a| match a.source {
                Some(c) => format!("{} := {}(#{})", a.name, a.function.as_ref(), c),
                None => format!("{} := {}(*)", a.name, a.function.as_ref()),
            })
            .join(", ");
        f.debug_struct("")
            .field("group_columns", &self.group_columns)
            .field("aggregates", &format_args!("[{}]", aggregates))
            .finish()
    }
}

/// Removes duplicate tuples.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Distinct {}

impl Distinct {
    pub fn new() -> Self {
        Self {}
    }
}

impl OperatorTrait for Distinct {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for Distinct {
    fn display(&self, _f: &mut Formatter) -> std::fmt::Result {
        Ok(())
    }
}
