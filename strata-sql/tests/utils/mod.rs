pub mod schema;

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use strata::provider::ProviderRef;
use strata::utils::ColumnSet;
use strata_sql::compiler::{CompilerOptions, QueryCompiler};
use strata_sql::dialect::DialectKind;
use strata_sql::error::SqlError;
use strum::IntoEnumIterator;

#[derive(Deserialize)]
pub struct TestCase {
    /// Name of a query of the runner.
    pub query: String,
    /// Root columns the caller reads.
    pub demand: Vec<usize>,
    /// Expected SQL per dialect.
    #[serde(default)]
    pub expected: HashMap<DialectKind, String>,
    /// Dialects expected to reject the query.
    #[serde(default)]
    pub unsupported: Vec<DialectKind>,
}

pub struct TestCaseRunner {
    /// Input file paths.
    pub paths: Vec<PathBuf>,
    pub queries: HashMap<String, ProviderRef>,
    /// Options of every compiler, except for the dialect.
    pub options: CompilerOptions,
}

impl TestCaseRunner {
    pub fn run(self) {
        let compilers = DialectKind::iter()
            .map(|dialect| {
                let options = CompilerOptions {
                    dialect,
                    ..self.options.clone()
                };
                (dialect, QueryCompiler::new(options))
            })
            .collect::<HashMap<_, _>>();

        for path in &self.paths {
            let file = File::options()
                .read(true)
                .open(path)
                .with_context(|| format!("Failed to open test case file: {:?}", path))
                .unwrap();

            let test_cases: Vec<TestCase> = serde_yaml::from_reader(file)
                .with_context(|| format!("Failed to load test cases from file: {:?}", path))
                .unwrap();

            for test_case in test_cases {
                self.run_case(path, &compilers, test_case);
            }
        }
    }

    fn run_case<P: AsRef<Path> + Debug>(
        &self,
        path: &P,
        compilers: &HashMap<DialectKind, QueryCompiler>,
        test_case: TestCase,
    ) {
        let root = self
            .queries
            .get(&test_case.query)
            .with_context(|| format!("Unknown query {} in {:?}", test_case.query, path))
            .unwrap();
        let demand = test_case.demand.iter().copied().collect::<ColumnSet>();

        for dialect in DialectKind::iter() {
            let result = compilers[&dialect].compile(root, &demand);
            if test_case.unsupported.contains(&dialect) {
                let err = result.expect_err(&format!(
                    "{} should be rejected by {} in {:?}",
                    test_case.query, dialect, path
                ));
                assert!(
                    matches!(err, SqlError::Unsupported { .. }),
                    "{} failed on {} with {} in {:?}",
                    test_case.query,
                    dialect,
                    err,
                    path
                );
                continue;
            }

            let expected = test_case
                .expected
                .get(&dialect)
                .with_context(|| {
                    format!("No {} sql for {} in {:?}", dialect, test_case.query, path)
                })
                .unwrap();
            let compiled = result
                .with_context(|| format!("Failed to compile {} for {}", test_case.query, dialect))
                .unwrap();
            assert_eq!(
                expected, &compiled.sql,
                "Sql of {} for {} in {:?} is different.",
                test_case.query, dialect, path
            );
        }
    }
}

pub fn load_options<P: AsRef<Path> + Debug>(path: P) -> CompilerOptions {
    let file = File::options()
        .read(true)
        .open(&path)
        .with_context(|| format!("Failed to open options file: {:?}", path))
        .unwrap();
    serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to load options from file: {:?}", path))
        .unwrap()
}
