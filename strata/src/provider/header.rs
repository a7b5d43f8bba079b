use std::sync::Arc;

use arrow_schema::DataType;
use strum_macros::AsRefStr;

use crate::properties::OrderSpec;
use crate::utils::ColumnMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Type of the aggregate column given the type of the aggregated column.
    pub fn result_type(&self, input: &DataType) -> DataType {
        match self {
            AggregateFunction::Count => DataType::Int64,
            AggregateFunction::Avg => DataType::Float64,
            AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => {
                input.clone()
            }
        }
    }
}

/// Where the values of a column come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnOrigin {
    /// Read from a stored table.
    Stored { table: String },
    /// Copied unchanged from column `index` of source `source`.
    PassThrough { source: usize, index: usize },
    /// Computed by the owning provider.
    Calculated,
    /// Computed by an aggregate over the source.
    Aggregate(AggregateFunction),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Column {
    pub index: usize,
    pub name: String,
    pub data_type: DataType,
    pub origin: ColumnOrigin,
}

impl Column {
    pub fn new<S: Into<String>>(index: usize, name: S, data_type: DataType, origin: ColumnOrigin) -> Self {
        Self {
            index,
            name: name.into(),
            data_type,
            origin,
        }
    }

    /// The same column seen through a provider that copies it from source `source` to
    /// position `index`.
    pub fn pass_through(&self, source: usize, index: usize) -> Column {
        Column {
            index,
            name: self.name.clone(),
            data_type: self.data_type.clone(),
            origin: ColumnOrigin::PassThrough {
                source,
                index: self.index,
            },
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(
            self.origin,
            ColumnOrigin::Calculated | ColumnOrigin::Aggregate(_)
        )
    }
}

/// Shape of the tuples flowing out of a provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleDescriptor(Arc<[DataType]>);

impl TupleDescriptor {
    pub fn types(&self) -> &[DataType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output schema of a provider: ordered columns, declared order and tuple shape.
///
/// Built once when its provider is constructed and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Header {
    columns: Vec<Column>,
    order: OrderSpec,
    tuple_descriptor: TupleDescriptor,
}

impl Header {
    pub fn new(columns: Vec<Column>, order: OrderSpec) -> Self {
        let tuple_descriptor = TupleDescriptor(
            columns
                .iter()
                .map(|c| c.data_type.clone())
                .collect::<Vec<_>>()
                .into(),
        );
        Self {
            columns,
            order,
            tuple_descriptor,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn order(&self) -> &OrderSpec {
        &self.order
    }

    pub fn tuple_descriptor(&self) -> &TupleDescriptor {
        &self.tuple_descriptor
    }

    /// Header of a provider passing every column of source `source` through unchanged.
    pub fn pass_through(&self, source: usize) -> Header {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| c.pass_through(source, i))
            .collect();
        Header::new(columns, self.order.clone())
    }

    pub fn with_order(&self, order: OrderSpec) -> Header {
        Header::new(self.columns.clone(), order)
    }

    /// Header made of the given columns of `self`, in the given order. Order keys are kept up
    /// to the first key that is not selected.
    pub fn select(&self, indexes: &[usize]) -> Header {
        let columns = indexes
            .iter()
            .enumerate()
            .map(|(new, old)| self.columns[*old].pass_through(0, new))
            .collect();
        let mut entries = vec![None; self.len()];
        for (new, old) in indexes.iter().enumerate() {
            if entries[*old].is_none() {
                entries[*old] = Some(new);
            }
        }
        let (order, _) = self.order.remap(&ColumnMap::from_entries(entries));
        Header::new(columns, order)
    }

    /// Columns of `self` followed by the columns of `right`, right positions shifted by
    /// `self.len()`. The order is the left order followed by the shifted right order.
    pub fn join(&self, right: &Header) -> Header {
        let offset = self.len();
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| c.pass_through(0, i))
            .chain(
                right
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c.pass_through(1, offset + i)),
            )
            .collect();
        let order = self.order.then(&right.order.offset(offset));
        Header::new(columns, order)
    }

    /// Pass-through of `self` followed by new computed columns.
    pub fn append<I: IntoIterator<Item = (String, DataType, ColumnOrigin)>>(&self, added: I) -> Header {
        let mut columns = self.pass_through(0).columns;
        for (name, data_type, origin) in added {
            let index = columns.len();
            columns.push(Column::new(index, name, data_type, origin));
        }
        Header::new(columns, self.order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Ordering;

    fn stored(names: &[&str]) -> Header {
        let columns = names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                Column::new(
                    i,
                    *n,
                    DataType::Int64,
                    ColumnOrigin::Stored {
                        table: "t".to_string(),
                    },
                )
            })
            .collect();
        Header::new(columns, OrderSpec::new(vec![Ordering::asc(0), Ordering::asc(1)]))
    }

    #[test]
    fn test_select_keeps_order_prefix() {
        let header = stored(&["a", "b", "c"]);
        let selected = header.select(&[2, 0]);
        assert_eq!(2, selected.len());
        assert_eq!("c", selected.columns()[0].name);
        assert_eq!(
            ColumnOrigin::PassThrough { source: 0, index: 2 },
            selected.columns()[0].origin
        );
        assert_eq!(&OrderSpec::new(vec![Ordering::asc(1)]), selected.order());
    }

    #[test]
    fn test_join_offsets_right_columns() {
        let left = stored(&["a", "b"]);
        let right = stored(&["x"]);
        let joined = left.join(&right);
        assert_eq!(3, joined.len());
        assert_eq!(2, joined.columns()[2].index);
        assert_eq!(
            ColumnOrigin::PassThrough { source: 1, index: 0 },
            joined.columns()[2].origin
        );
        assert_eq!(
            &OrderSpec::new(vec![Ordering::asc(0), Ordering::asc(1), Ordering::asc(2)]),
            joined.order()
        );
        assert_eq!(3, joined.tuple_descriptor().len());
    }
}
