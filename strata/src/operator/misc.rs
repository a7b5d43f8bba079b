use std::fmt::Formatter;

use arrow_schema::DataType;
use datafusion_common::ScalarValue;
use strum_macros::AsRefStr;

use crate::error::StrataResult;
use crate::operator::{check_columns, DisplayFields, OperatorTrait, ProviderKind};
use crate::properties::OrderSpec;
use crate::provider::{Column, ColumnOrigin, Header, ProviderRef};

/// Materialization boundary: the source is computed once and reused under `name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Store {
    name: String,
}

impl Store {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl OperatorTrait for Store {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for Store {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("").field("name", &self.name).finish()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum LockMode {
    Shared,
    Exclusive,
    Update,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum LockBehavior {
    Wait,
    NoWait,
    SkipLocked,
}

/// Locks the rows read by the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Lock {
    mode: LockMode,
    behavior: LockBehavior,
}

impl Lock {
    pub fn new(mode: LockMode, behavior: LockBehavior) -> Self {
        Self { mode, behavior }
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn behavior(&self) -> LockBehavior {
        self.behavior
    }
}

impl OperatorTrait for Lock {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for Lock {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("mode", &self.mode)
            .field("behavior", &self.behavior)
            .finish()
    }
}

/// Opaque marker carried through to the generated statement as a comment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    tag: String,
}

impl Tag {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl OperatorTrait for Tag {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for Tag {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("").field("tag", &self.tag).finish()
    }
}

/// Asks the target to read the source table through a named index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexHint {
    index: String,
}

impl IndexHint {
    pub fn new<S: Into<String>>(index: S) -> Self {
        Self {
            index: index.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

impl OperatorTrait for IndexHint {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(sources[0].header().pass_through(0))
    }
}

impl DisplayFields for IndexHint {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("").field("index", &self.index).finish()
    }
}

/// Appends a Boolean column telling whether the tuple projected on `columns` is one of
/// `rows`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Include {
    columns: Vec<usize>,
    rows: Vec<Vec<ScalarValue>>,
    name: String,
}

impl Include {
    pub fn new<S: Into<String>>(columns: Vec<usize>, rows: Vec<Vec<ScalarValue>>, name: S) -> Self {
        Self {
            columns,
            rows,
            name: name.into(),
        }
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<ScalarValue>] {
        &self.rows
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_columns(&self, columns: Vec<usize>) -> Self {
        Self {
            columns,
            rows: self.rows.clone(),
            name: self.name.clone(),
        }
    }
}

impl OperatorTrait for Include {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, sources: &[ProviderRef]) -> StrataResult<Header> {
        let source = sources[0].header();
        if self.columns.is_empty() {
            malformed!(ProviderKind::Include, "no columns to match");
        }
        check_columns(ProviderKind::Include, &self.columns, source.len())?;
        if let Some(row) = self.rows.iter().find(|r| r.len() != self.columns.len()) {
            malformed!(
                ProviderKind::Include,
                "row has {} values, expected {}",
                row.len(),
                self.columns.len()
            );
        }
        Ok(source.append(std::iter::once((
            self.name.clone(),
            DataType::Boolean,
            ColumnOrigin::Calculated,
        ))))
    }
}

impl DisplayFields for Include {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .field("name", &self.name)
            .finish()
    }
}

/// Single Boolean tuple telling whether the source has any tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Existence {
    name: String,
}

impl Existence {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl OperatorTrait for Existence {
    fn arity(&self) -> usize {
        1
    }

    fn derive_header(&self, _sources: &[ProviderRef]) -> StrataResult<Header> {
        Ok(Header::new(
            vec![Column::new(
                0,
                self.name.clone(),
                DataType::Boolean,
                ColumnOrigin::Calculated,
            )],
            OrderSpec::empty(),
        ))
    }
}

impl DisplayFields for Existence {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("").field("name", &self.name).finish()
    }
}
