//! Query compiler: provider tree in, SQL text out.

use std::sync::Arc;

use log::debug;
use serde::Deserialize;
use strata::expr::QueryParameter;
use strata::optimizer::{Optimizer, OptimizerContext};
use strata::provider::ProviderRef;
use strata::utils::{ColumnMap, ColumnSet};

use crate::ast::Statement;
use crate::cache::{CacheEntry, PlanCache};
use crate::dialect::{AnyDialect, DialectKind};
use crate::error::SqlResult;
use crate::lowering::lower;
use crate::translator::{Translation, Translator};

const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub dialect: DialectKind,
    /// Run column-demand pruning.
    pub prune: bool,
    /// Run ordering preservation.
    pub order: bool,
    /// Compiled queries kept by the compiler; zero turns caching off.
    pub cache_capacity: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            prune: true,
            order: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Result of compiling a provider tree.
#[derive(Clone, Debug)]
pub struct CompiledQuery {
    /// The tree after rewriting, which the SQL was generated from.
    pub provider: ProviderRef,
    /// Position of every demanded root column in the rows the SQL returns.
    pub column_map: ColumnMap,
    pub sql: String,
    /// Parameters in placeholder order.
    pub parameters: Vec<QueryParameter>,
}

/// Compiles provider trees to the SQL of one dialect.
///
/// A compiler can be shared between threads. Compilations only share the plan cache.
pub struct QueryCompiler {
    options: CompilerOptions,
    dialect: AnyDialect,
    optimizer: Optimizer,
    cache: PlanCache,
}

impl QueryCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        let optimizer = Optimizer::new(OptimizerContext {
            prune: options.prune,
            order: options.order,
            ..Default::default()
        });
        Self {
            dialect: AnyDialect::new(options.dialect),
            cache: PlanCache::new(options.cache_capacity),
            optimizer,
            options,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn dialect(&self) -> &AnyDialect {
        &self.dialect
    }

    pub fn cache(&self) -> &PlanCache {
        &self.cache
    }

    /// Compiles `root`, of which the caller reads the columns in `demand`.
    pub fn compile(&self, root: &ProviderRef, demand: &ColumnSet) -> SqlResult<Arc<CompiledQuery>> {
        let dialect = self.options.dialect;
        if let Some(compiled) = self.cache.get(root, demand, dialect) {
            debug!("Plan cache hit for {} rooted tree", root.kind());
            return Ok(compiled);
        }
        if self.cache.is_enabled() {
            debug!("Plan cache miss for {} rooted tree", root.kind());
        }

        let plan = self.optimizer.optimize(root, demand)?;
        let statement = lower(&plan.provider)?;
        let Translation { sql, parameters } = self.translate(&statement)?;
        let compiled = Arc::new(CompiledQuery {
            provider: plan.provider,
            column_map: plan.column_map,
            sql,
            parameters,
        });

        Ok(self.cache.insert(CacheEntry {
            root: root.clone(),
            demand: demand.clone(),
            dialect,
            compiled,
        }))
    }

    /// Translates a statement built by the caller, such as schema statements.
    pub fn translate(&self, statement: &Statement) -> SqlResult<Translation> {
        Translator::new(&self.dialect).translate(statement)
    }
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use maplit::btreeset;
    use strata::expr::{col, lit, param};
    use strata::error::StrataError;
    use strata::operator::{LockBehavior, LockMode};
    use strata::properties::Ordering;
    use strata::provider::ProviderBuilder;

    use super::*;
    use crate::error::SqlError;
    use crate::test_utils::customers;

    fn named_customers() -> ProviderRef {
        ProviderBuilder::from_provider(customers())
            .filter(col(2).eq(lit("Oslo")))
            .select(vec![0, 1])
            .build()
            .unwrap()
    }

    #[test]
    fn test_compile_keeps_root_order_key() {
        let compiler = QueryCompiler::default();
        let compiled = compiler.compile(&named_customers(), &btreeset! {1}).unwrap();
        assert_eq!(
            "SELECT t0.id AS id, t0.name AS name FROM customers AS t0 \
             WHERE (t0.city = 'Oslo') ORDER BY t0.id",
            compiled.sql
        );
        assert_eq!(Some(1), compiled.column_map.get(1));
        assert!(compiled.parameters.is_empty());
    }

    #[test]
    fn test_cache_returns_shared_result() {
        let compiler = QueryCompiler::default();
        let first = compiler.compile(&named_customers(), &btreeset! {0, 1}).unwrap();
        let second = compiler.compile(&named_customers(), &btreeset! {0, 1}).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, compiler.cache().len());

        let uncached = QueryCompiler::new(CompilerOptions {
            cache_capacity: 0,
            ..Default::default()
        });
        let first = uncached.compile(&named_customers(), &btreeset! {0, 1}).unwrap();
        let second = uncached.compile(&named_customers(), &btreeset! {0, 1}).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.sql, second.sql);
    }

    #[test]
    fn test_parameters_follow_placeholders() {
        let root = ProviderBuilder::from_provider(customers())
            .filter(
                col(1)
                    .eq(param("name", DataType::Utf8))
                    .or(col(2).eq(param("city", DataType::Utf8))),
            )
            .select(vec![0])
            .build()
            .unwrap();
        let compiler = QueryCompiler::new(CompilerOptions {
            dialect: DialectKind::PostgreSql,
            ..Default::default()
        });
        let compiled = compiler.compile(&root, &btreeset! {0}).unwrap();
        assert_eq!(
            "SELECT t0.id AS id FROM customers AS t0 \
             WHERE ((t0.name = $1) OR (t0.city = $2)) ORDER BY t0.id",
            compiled.sql
        );
        let names = compiled.parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["name", "city"], names);
    }

    #[test]
    fn test_unsupported_construct_is_reported() {
        let root = ProviderBuilder::from_provider(customers())
            .lock(LockMode::Update, LockBehavior::Wait)
            .build()
            .unwrap();
        let compiler = QueryCompiler::new(CompilerOptions {
            dialect: DialectKind::Sqlite,
            ..Default::default()
        });
        let err = compiler.compile(&root, &btreeset! {0}).unwrap_err();
        assert!(matches!(err, SqlError::Unsupported { dialect: DialectKind::Sqlite, .. }));
    }

    #[test]
    fn test_lost_order_key_under_take_fails() {
        let root = ProviderBuilder::from_provider(customers())
            .sort(vec![Ordering::asc(1)])
            .select(vec![0])
            .take(1u64)
            .build()
            .unwrap();
        let compiler = QueryCompiler::default();
        let err = compiler.compile(&root, &btreeset! {0}).unwrap_err();
        assert!(matches!(
            err,
            SqlError::Core(StrataError::OrderingViolation { .. })
        ));
        assert!(compiler.cache().is_empty());
    }

    #[test]
    fn test_options_defaults() {
        let options: CompilerOptions = serde_json::from_str(r#"{"dialect": "mysql"}"#).unwrap();
        assert_eq!(DialectKind::MySql, options.dialect);
        assert!(options.prune && options.order);
        assert_eq!(DEFAULT_CACHE_CAPACITY, options.cache_capacity);
    }
}
