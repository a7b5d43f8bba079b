use arrow_schema::DataType;
use strata::properties::Direction;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// Values are generated by the database on insert.
    pub identity: bool,
}

impl ColumnDefinition {
    pub fn new<S: Into<String>>(name: S, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            identity: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.nullable = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
}

impl CreateTable {
    pub fn new<S: Into<String>>(name: S, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: vec![],
        }
    }

    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    BTree,
    Clustered,
    Spatial,
    FullText,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexColumn {
    pub name: String,
    pub direction: Direction,
}

impl IndexColumn {
    pub fn asc<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Asc,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CreateIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
    pub kind: IndexKind,
}

impl CreateIndex {
    pub fn new<N: Into<String>, T: Into<String>>(name: N, table: T, columns: Vec<IndexColumn>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns,
            unique: false,
            kind: IndexKind::BTree,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }
}
