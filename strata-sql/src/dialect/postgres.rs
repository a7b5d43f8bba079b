use arrow_schema::DataType;
use enumset::EnumSet;
use strata::expr::ScalarFunction;

use crate::ast::{
    CreateIndex, FullTextKind, IndexKind, SqlSelect, TableRef, FULL_TEXT_KEY, FULL_TEXT_RANK,
};
use crate::dialect::keywords::POSTGRES_RESERVED;
use crate::dialect::{
    ansi, is_plain_identifier, Dialect, DialectKind, Feature, FunctionSection, IndexSection,
    SelectSection, TableSection, TypeUsage,
};
use crate::error::{SqlError, SqlResult};
use crate::literal::{BinaryStyle, GuidStyle, LiteralStyle};
use crate::translator::Translator;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostgreSqlDialect {}

impl Dialect for PostgreSqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn features(&self) -> EnumSet<Feature> {
        EnumSet::all() - Feature::ClusteredIndex
    }

    fn is_reserved(&self, word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        super::keywords::ANSI_RESERVED.contains(upper.as_str())
            || POSTGRES_RESERVED.contains(upper.as_str())
    }

    /// Unquoted names fold to lower case, so any upper case letter needs quotes.
    fn quote_identifier(&self, name: &str) -> String {
        if is_plain_identifier(name)
            && !self.is_reserved(name)
            && !name.chars().any(|c| c.is_ascii_uppercase())
        {
            name.to_string()
        } else {
            format!("\"{}\"", name.replace('"', "\"\""))
        }
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn literal_style(&self) -> LiteralStyle {
        LiteralStyle {
            binary: BinaryStyle::Bytea,
            guid: GuidStyle::Cast,
            ..Default::default()
        }
    }

    fn type_name(&self, data_type: &DataType, usage: TypeUsage) -> SqlResult<String> {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 => Ok("TEXT".to_string()),
            DataType::Binary | DataType::LargeBinary => Ok("BYTEA".to_string()),
            DataType::FixedSizeBinary(16) => Ok("UUID".to_string()),
            _ => ansi::type_name(self.kind(), data_type, usage),
        }
    }

    fn select(
        &self,
        t: &mut Translator<'_>,
        section: SelectSection,
        select: &SqlSelect,
    ) -> SqlResult<()> {
        match (section, &select.limit) {
            (SelectSection::Limit, Some(limit)) => {
                if let Some(take) = &limit.take {
                    t.push(" LIMIT ");
                    t.expr(take)?;
                }
                if let Some(skip) = &limit.skip {
                    t.push(" OFFSET ");
                    t.expr(skip)?;
                }
                Ok(())
            }
            _ => ansi::select(t, section, select),
        }
    }

    fn function(
        &self,
        t: &mut Translator<'_>,
        section: FunctionSection,
        function: ScalarFunction,
    ) -> SqlResult<()> {
        match (section, function) {
            (FunctionSection::Entry, ScalarFunction::Length) => {
                t.push("LENGTH(");
                Ok(())
            }
            _ => ansi::function(t, section, function),
        }
    }

    fn full_text_table(&self, t: &mut Translator<'_>, table: &TableRef) -> SqlResult<()> {
        let (kind, name, key, columns, criteria, top_n) = match table {
            TableRef::FullText {
                kind,
                table,
                key,
                columns,
                criteria,
                top_n,
                ..
            } => (kind, table, key, columns, criteria, top_n),
            _ => return Err(SqlError::Malformed("expected a full-text search".to_string())),
        };
        if columns.is_empty() {
            return Err(t.unsupported("full-text search over every indexed column"));
        }
        let query = |t: &mut Translator<'_>| -> SqlResult<()> {
            t.push(match kind {
                FullTextKind::FreeText => "plainto_tsquery('simple', ",
                FullTextKind::Contains => "to_tsquery('simple', ",
            });
            t.expr(criteria)?;
            t.push(")");
            Ok(())
        };

        t.push("(SELECT ");
        t.identifier(key);
        t.push(" AS ");
        t.identifier(FULL_TEXT_KEY);
        t.push(", ts_rank(");
        document(t, columns);
        t.push(", ");
        query(t)?;
        t.push(") AS ");
        t.identifier(FULL_TEXT_RANK);
        t.push(" FROM ");
        t.identifier(name);
        t.push(" WHERE ");
        document(t, columns);
        t.push(" @@ ");
        query(t)?;
        if let Some(top_n) = top_n {
            t.push(" ORDER BY ");
            t.identifier(FULL_TEXT_RANK);
            t.push(" DESC LIMIT ");
            t.expr(top_n)?;
        }
        t.push(")");
        self.table(t, TableSection::Alias, table)
    }

    fn create_index(
        &self,
        t: &mut Translator<'_>,
        section: IndexSection,
        index: &CreateIndex,
    ) -> SqlResult<()> {
        match section {
            IndexSection::Entry => {
                t.push(if index.unique {
                    "CREATE UNIQUE INDEX "
                } else {
                    "CREATE INDEX "
                });
            }
            IndexSection::Using => match index.kind {
                IndexKind::Spatial => t.push(" USING GIST"),
                IndexKind::FullText => t.push(" USING GIN"),
                IndexKind::BTree | IndexKind::Clustered => {}
            },
            IndexSection::Columns if index.kind == IndexKind::FullText => {
                let columns: Vec<String> = index.columns.iter().map(|c| c.name.clone()).collect();
                t.push(" (");
                document(t, &columns);
                t.push(")");
            }
            _ => ansi::create_index(t, section, index)?,
        }
        Ok(())
    }
}

/// Text search document over `columns`, spelled the same way in searches and in the index
/// that serves them.
fn document(t: &mut Translator<'_>, columns: &[String]) {
    t.push("to_tsvector('simple', ");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            t.push(" || ' ' || ");
        }
        t.push("coalesce(");
        t.identifier(column);
        t.push(", '')");
    }
    t.push(")");
}
