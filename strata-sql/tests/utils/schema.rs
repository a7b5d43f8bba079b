use std::collections::HashMap;

use arrow_schema::DataType;
use strata::expr::{col, lit, outer_col, param, ApplyParameter};
use strata::operator::{
    AggregateColumn, ApplyType, ColumnDef, IndexInfo, JoinType, LockBehavior, LockMode,
};
use strata::properties::{OrderSpec, Ordering};
use strata::provider::{AggregateFunction, ProviderBuilder, ProviderRef};

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

fn customers() -> ProviderBuilder {
    ProviderBuilder::index(customers_index())
}

fn orders() -> ProviderBuilder {
    ProviderBuilder::index(orders_index())
}

/// Named queries over `customers` and `orders`, as test fixtures refer to them.
pub fn queries() -> HashMap<String, ProviderRef> {
    let p = ApplyParameter::next();
    let placed_orders = orders()
        .filter(col(1).eq(outer_col(p, 0)))
        .build()
        .unwrap();

    let queries = vec![
        (
            "customers_in_city",
            customers()
                .filter(col(2).eq(param("city", DataType::Utf8)))
                .select(vec![0, 1])
                .build(),
        ),
        (
            "top_balances",
            customers()
                .sort(vec![Ordering::desc(3)])
                .paging(5u64, 10u64)
                .select(vec![1])
                .build(),
        ),
        (
            "customers_with_orders",
            customers()
                .apply(p, ApplyType::Existing, placed_orders)
                .select(vec![1])
                .build(),
        ),
        (
            "order_totals",
            orders()
                .aggregate(
                    vec![1],
                    vec![AggregateColumn::new("total", AggregateFunction::Sum, 2)],
                )
                .build(),
        ),
        (
            "locked_customer",
            ProviderBuilder::seek(customers_index(), vec![param("id", DataType::Int64)])
                .lock(LockMode::Update, LockBehavior::Wait)
                .build(),
        ),
        (
            "ranked_customers",
            customers()
                .sort(vec![Ordering::asc(1)])
                .row_number("seq")
                .build(),
        ),
        (
            "large_orders",
            customers()
                .join(JoinType::Inner, vec![(0, 1)], orders().build().unwrap())
                .filter(col(6).gt(lit(100.0)))
                .select(vec![1, 6])
                .build(),
        ),
        (
            "first_cities",
            customers().select(vec![2]).distinct().take(3u64).build(),
        ),
        (
            "all_customer_ids",
            customers()
                .select(vec![0])
                .concat(orders().select(vec![1]).build().unwrap())
                .build(),
        ),
        (
            "idle_customer_ids",
            customers()
                .select(vec![0])
                .except(orders().select(vec![1]).build().unwrap())
                .build(),
        ),
    ];

    queries
        .into_iter()
        .map(|(name, query)| (name.to_string(), query.unwrap()))
        .collect()
}
