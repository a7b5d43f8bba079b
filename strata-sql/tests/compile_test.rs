use std::path::PathBuf;

use strata::utils::ColumnSet;
use strata_sql::ast::{CreateIndex, IndexKind, Statement};
use strata_sql::compiler::{CompilerOptions, QueryCompiler};
use strata_sql::dialect::DialectKind;
use strata_sql::error::SqlError;

use crate::utils::schema::{customers_index, queries};
use crate::utils::{load_options, TestCaseRunner};

mod utils;

#[test]
fn test_compile_queries() {
    let runner = TestCaseRunner {
        paths: vec![PathBuf::from("resources/compile.yaml")],
        queries: queries(),
        options: load_options("resources/options.yaml"),
    };

    runner.run()
}

#[test]
fn test_options_from_yaml() {
    let options: CompilerOptions = serde_yaml::from_str("dialect: sqlserver\nprune: false\n").unwrap();
    assert_eq!(DialectKind::SqlServer, options.dialect);
    assert!(!options.prune);
    assert!(options.order);

    let loaded = load_options("resources/options.yaml");
    assert_eq!(DialectKind::Generic, loaded.dialect);
    assert_eq!(16, loaded.cache_capacity);
}

#[test]
fn test_unpruned_compile_reads_every_column() {
    let compiler = QueryCompiler::new(CompilerOptions {
        prune: false,
        ..Default::default()
    });
    let root = &queries()["order_totals"];
    let demand = [1].into_iter().collect::<ColumnSet>();
    let compiled = compiler.compile(root, &demand).unwrap();
    assert_eq!(
        "SELECT t0.customer_id AS customer_id, SUM(t0.amount) AS total FROM orders AS t0 \
         GROUP BY t0.customer_id",
        compiled.sql
    );
    assert!(compiled.column_map.is_identity());
}

#[test]
fn test_schema_statements() {
    let index = CreateIndex::from(&customers_index());
    let generic = QueryCompiler::default();
    assert_eq!(
        "CREATE INDEX customers_pk ON customers (id)",
        generic
            .translate(&Statement::CreateIndex(index.clone()))
            .unwrap()
            .sql
    );

    let spatial = Statement::CreateIndex(index.with_kind(IndexKind::Spatial));
    assert_eq!(
        SqlError::unsupported(DialectKind::Sqlite, "spatial indexes"),
        QueryCompiler::new(CompilerOptions {
            dialect: DialectKind::Sqlite,
            ..Default::default()
        })
        .translate(&spatial)
        .unwrap_err()
    );
}
