use std::borrow::Cow;
use std::io::{BufWriter, Write};

use prettytable::{row, Table};
use ptree::print_config::UTF_CHARS;
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};

use crate::provider::{ColumnOrigin, Header, Provider, ProviderRef};

impl<'a> TreeItem for &'a Provider {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}", style.paint(&self.operator()))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.sources()
                .iter()
                .map(|s| &**s)
                .collect::<Vec<&'a Provider>>(),
        )
    }
}

pub fn explain<W: Write>(root: &ProviderRef, output: &mut W) -> std::io::Result<()> {
    let config = PrintConfig {
        indent: 3,
        characters: UTF_CHARS.into(),
        ..Default::default()
    };
    write_tree_with(&&**root, output, &config)
}

pub fn explain_to_string(root: &ProviderRef) -> std::io::Result<String> {
    let mut buf = BufWriter::new(Vec::new());
    explain(root, &mut buf)?;
    let bytes = buf.into_inner()?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Renders the columns of a header as a table, for debugging.
pub fn explain_header(header: &Header) -> String {
    let mut table = Table::new();
    table.add_row(row!["Index", "Name", "Type", "Origin"]);
    for c in header.columns() {
        let origin = match &c.origin {
            ColumnOrigin::Stored { table } => format!("stored {}", table),
            ColumnOrigin::PassThrough { source, index } => format!("source {} #{}", source, index),
            ColumnOrigin::Calculated => "calculated".to_string(),
            ColumnOrigin::Aggregate(f) => format!("aggregate {}", f.as_ref()),
        };
        table.add_row(row![c.index, c.name, c.data_type, origin]);
    }
    format!("{}order: {}\n", table, header.order())
}

#[cfg(test)]
mod tests {
    use crate::expr::{col, lit};
    use crate::operator::JoinType;
    use crate::properties::Ordering;
    use crate::provider::{explain_header, explain_to_string, ProviderBuilder};
    use crate::test_utils::{customers_index, orders};

    #[test]
    fn test_explain_tree() {
        let plan = ProviderBuilder::index(customers_index())
            .filter(col(2).eq(lit("Oslo")))
            .join(JoinType::Inner, vec![(0, 1)], orders())
            .sort(vec![Ordering::desc(6)])
            .take(10u64)
            .build()
            .unwrap();

        let expected = "\
Take { count: 10 }
└─ Sort { order: [#6 Desc] }
   └─ Join { join_type: Inner, equal_columns: [#0 = #1] }
      ├─ Filter { predicate: (#2 = Oslo) }
      │  └─ Index { index: \"customers_pk\", table: \"customers\" }
      └─ Index { index: \"orders_pk\", table: \"orders\" }
";
        assert_eq!(expected, explain_to_string(&plan).unwrap());
    }

    #[test]
    fn test_explain_header() {
        let text = explain_header(orders().header());
        assert!(text.contains("customer_id"));
        assert!(text.ends_with("order: [#0 Asc]\n"));
    }
}
