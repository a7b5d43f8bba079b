//! Sample tables shared by unit tests.

use arrow_schema::DataType;

use crate::operator::{ColumnDef, IndexInfo};
use crate::properties::{OrderSpec, Ordering};
use crate::provider::{ProviderBuilder, ProviderRef};

/// `customers(id, name, city, balance)`, keyed by `id`.
pub fn customers_index() -> IndexInfo {
    IndexInfo::new(
        "customers_pk",
        "customers",
        vec![
            ColumnDef::new("id", DataType::Int64),
            ColumnDef::new("name", DataType::Utf8),
            ColumnDef::new("city", DataType::Utf8),
            ColumnDef::new("balance", DataType::Float64),
        ],
        OrderSpec::new(vec![Ordering::asc(0)]),
    )
}

/// `orders(id, customer_id, amount, placed, status)`, keyed by `id`.
pub fn orders_index() -> IndexInfo {
    IndexInfo::new(
        "orders_pk",
        "orders",
        vec![
            ColumnDef::new("id", DataType::Int64),
            ColumnDef::new("customer_id", DataType::Int64),
            ColumnDef::new("amount", DataType::Float64),
            ColumnDef::new("placed", DataType::Date32),
            ColumnDef::new("status", DataType::Utf8),
        ],
        OrderSpec::new(vec![Ordering::asc(0)]),
    )
}

pub fn customers() -> ProviderRef {
    ProviderBuilder::index(customers_index()).build().unwrap()
}

pub fn orders() -> ProviderRef {
    ProviderBuilder::index(orders_index()).build().unwrap()
}
