use indexmap::IndexMap;

use crate::value::Value;

/// Ordered mapping of column name to value.
pub type Row = IndexMap<String, Value>;

/// Ordered sequence of rows.
pub type Table = Vec<Row>;

/// Row as returned by a table provider. Kept as JSON so nested arrays and
/// objects can be detected before they reach a [`Row`].
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Row flowing through the select pipeline.
///
/// Rows produced by grouping carry the member rows of their group so that
/// aggregates can fold over them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingRow {
    pub columns: Row,
    pub children: Option<Vec<Row>>,
}

impl WorkingRow {
    pub fn new(columns: Row) -> Self {
        WorkingRow {
            columns,
            children: None,
        }
    }

    pub fn grouped(columns: Row, children: Vec<Row>) -> Self {
        WorkingRow {
            columns,
            children: Some(children),
        }
    }

    pub fn context(&self) -> RowContext<'_> {
        RowContext {
            columns: &self.columns,
            children: self.children.as_deref(),
        }
    }
}

/// Borrowed view of the row an expression is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub columns: &'a Row,
    pub children: Option<&'a [Row]>,
}

impl<'a> RowContext<'a> {
    /// Context for a plain row without group members.
    pub fn leaf(columns: &'a Row) -> Self {
        RowContext {
            columns,
            children: None,
        }
    }

    /// Look up a column, falling back to the first group member for grouped
    /// rows that don't carry the column themselves.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        if let Some(value) = self.columns.get(column) {
            return Some(value);
        }
        self.children
            .and_then(|children| children.first())
            .and_then(|first| first.get(column))
    }
}

/// Convert a provider row into a [`Row`], serializing nested values to JSON
/// text. Keys are kept as is.
pub fn row_from_raw(raw: RawRow) -> Row {
    raw.into_iter()
        .map(|(name, value)| (name, Value::from(value)))
        .collect()
}
