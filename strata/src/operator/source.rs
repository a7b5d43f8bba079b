use std::fmt::Formatter;

use arrow_schema::DataType;
use datafusion_common::ScalarValue;
use itertools::Itertools;

use crate::error::StrataResult;
use crate::expr::{gather, ScalarExpr};
use crate::operator::{check_columns, DisplayFields, OperatorTrait, ProviderKind, RowCount};
use crate::properties::OrderSpec;
use crate::provider::{Column, ColumnOrigin, Header, ProviderRef};

/// Name and type of a column declared by a leaf.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new<S: Into<String>>(name: S, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

fn stored_header(table: &str, columns: &[ColumnDef], order: OrderSpec) -> Header {
    let columns = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Column::new(
                i,
                c.name.clone(),
                c.data_type.clone(),
                ColumnOrigin::Stored {
                    table: table.to_string(),
                },
            )
        })
        .collect();
    Header::new(columns, order)
}

fn computed_header(columns: &[ColumnDef]) -> Header {
    let columns = columns
        .iter()
        .enumerate()
        .map(|(i, c)| Column::new(i, c.name.clone(), c.data_type.clone(), ColumnOrigin::Calculated))
        .collect();
    Header::new(columns, OrderSpec::empty())
}

/// Stored index: its table, the columns it covers and its key order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexInfo {
    pub name: String,
    pub table: String,
    pub columns: Vec<ColumnDef>,
    pub key_order: OrderSpec,
}

impl IndexInfo {
    pub fn new<N: Into<String>, T: Into<String>>(
        name: N,
        table: T,
        columns: Vec<ColumnDef>,
        key_order: OrderSpec,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns,
            key_order,
        }
    }

    fn check(&self, kind: ProviderKind) -> StrataResult<()> {
        if self.columns.is_empty() {
            malformed!(kind, "index {} has no columns", self.name);
        }
        check_columns(kind, self.key_order.columns().collect_vec().iter(), self.columns.len())
    }

    fn header(&self) -> Header {
        stored_header(&self.table, &self.columns, self.key_order.clone())
    }
}

/// Full scan of an index, in key order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexScan {
    index: IndexInfo,
}

impl IndexScan {
    pub fn new(index: IndexInfo) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &IndexInfo {
        &self.index
    }
}

impl OperatorTrait for IndexScan {
    fn arity(&self) -> usize {
        0
    }

    fn derive_header(&self, _sources: &[ProviderRef]) -> StrataResult<Header> {
        self.index.check(ProviderKind::Index)?;
        Ok(self.index.header())
    }
}

impl DisplayFields for IndexScan {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("index", &self.index.name)
            .field("table", &self.index.table)
            .finish()
    }
}

/// Range of an index whose leading key columns equal `key`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexSeek {
    index: IndexInfo,
    key: Vec<ScalarExpr>,
}

impl IndexSeek {
    pub fn new(index: IndexInfo, key: Vec<ScalarExpr>) -> Self {
        Self { index, key }
    }

    pub fn index(&self) -> &IndexInfo {
        &self.index
    }

    pub fn key(&self) -> &[ScalarExpr] {
        &self.key
    }

    pub fn with_key(&self, key: Vec<ScalarExpr>) -> Self {
        Self::new(self.index.clone(), key)
    }
}

impl OperatorTrait for IndexSeek {
    fn arity(&self) -> usize {
        0
    }

    fn derive_header(&self, _sources: &[ProviderRef]) -> StrataResult<Header> {
        self.index.check(ProviderKind::Seek)?;
        if self.key.is_empty() || self.key.len() > self.index.key_order.len() {
            malformed!(
                ProviderKind::Seek,
                "seek key has {} values, index {} has {} key columns",
                self.key.len(),
                self.index.name,
                self.index.key_order.len()
            );
        }
        if let Some(e) = self.key.iter().find(|e| !gather(e).is_empty()) {
            malformed!(ProviderKind::Seek, "seek key {} reads a tuple slot", e);
        }
        Ok(self.index.header())
    }

    fn expressions(&self) -> Vec<&ScalarExpr> {
        self.key.iter().collect()
    }
}

impl DisplayFields for IndexSeek {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("index", &self.index.name)
            .field("key", &format_args!("[{}]", self.key.iter().join(", ")))
            .finish()
    }
}

/// Inline tuples.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawValues {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<ScalarValue>>,
}

impl RawValues {
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<ScalarValue>] {
        &self.rows
    }
}

impl OperatorTrait for RawValues {
    fn arity(&self) -> usize {
        0
    }

    fn derive_header(&self, _sources: &[ProviderRef]) -> StrataResult<Header> {
        if self.columns.is_empty() {
            malformed!(ProviderKind::Raw, "raw values declare no columns");
        }
        if let Some(row) = self.rows.iter().find(|r| r.len() != self.columns.len()) {
            malformed!(
                ProviderKind::Raw,
                "row has {} values, expected {}",
                row.len(),
                self.columns.len()
            );
        }
        Ok(computed_header(&self.columns))
    }
}

impl DisplayFields for RawValues {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field(
                "columns",
                &format_args!("[{}]", self.columns.iter().map(|c| &c.name).join(", ")),
            )
            .field("rows", &self.rows.len())
            .finish()
    }
}

/// Typed relation with no rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Void {
    columns: Vec<ColumnDef>,
}

impl Void {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }
}

impl OperatorTrait for Void {
    fn arity(&self) -> usize {
        0
    }

    fn derive_header(&self, _sources: &[ProviderRef]) -> StrataResult<Header> {
        if self.columns.is_empty() {
            malformed!(ProviderKind::Void, "void relation declares no columns");
        }
        Ok(computed_header(&self.columns))
    }
}

impl DisplayFields for Void {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field(
                "columns",
                &format_args!("[{}]", self.columns.iter().map(|c| &c.name).join(", ")),
            )
            .finish()
    }
}

/// Name of the rank column produced by full-text searches.
pub const RANK_COLUMN: &str = "RANK";

/// Parameters shared by the two full-text search kinds.
///
/// Produces the key column of every matching row of `table` and its rank.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FullTextSearch {
    pub table: String,
    pub key: ColumnDef,
    /// Searched columns; empty means every full-text indexed column.
    pub columns: Vec<String>,
    pub criteria: ScalarExpr,
    pub top_n: Option<RowCount>,
}

impl FullTextSearch {
    pub fn new<T: Into<String>>(table: T, key: ColumnDef, criteria: ScalarExpr) -> Self {
        Self {
            table: table.into(),
            key,
            columns: vec![],
            criteria,
            top_n: None,
        }
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_top_n(mut self, top_n: RowCount) -> Self {
        self.top_n = Some(top_n);
        self
    }

    fn header(&self, kind: ProviderKind) -> StrataResult<Header> {
        if !gather(&self.criteria).is_empty() {
            malformed!(kind, "search criteria {} reads a tuple slot", self.criteria);
        }
        let columns = vec![
            Column::new(
                0,
                self.key.name.clone(),
                self.key.data_type.clone(),
                ColumnOrigin::Stored {
                    table: self.table.clone(),
                },
            ),
            Column::new(1, RANK_COLUMN, DataType::Float64, ColumnOrigin::Calculated),
        ];
        Ok(Header::new(columns, OrderSpec::empty()))
    }

    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("table", &self.table)
            .field("criteria", &format_args!("{}", self.criteria));
        if let Some(top_n) = &self.top_n {
            s.field("top_n", &format_args!("{}", top_n));
        }
        s.finish()
    }
}

/// Free-form full-text search, matching by meaning rather than exact words.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FreeText(pub FullTextSearch);

impl OperatorTrait for FreeText {
    fn arity(&self) -> usize {
        0
    }

    fn derive_header(&self, _sources: &[ProviderRef]) -> StrataResult<Header> {
        self.0.header(ProviderKind::FreeText)
    }

    fn expressions(&self) -> Vec<&ScalarExpr> {
        vec![&self.0.criteria]
    }
}

impl DisplayFields for FreeText {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        self.0.display(f)
    }
}

/// Full-text search with a boolean/proximity condition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainsTable(pub FullTextSearch);

impl OperatorTrait for ContainsTable {
    fn arity(&self) -> usize {
        0
    }

    fn derive_header(&self, _sources: &[ProviderRef]) -> StrataResult<Header> {
        self.0.header(ProviderKind::ContainsTable)
    }

    fn expressions(&self) -> Vec<&ScalarExpr> {
        vec![&self.0.criteria]
    }
}

impl DisplayFields for ContainsTable {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        self.0.display(f)
    }
}
