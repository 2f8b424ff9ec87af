use std::collections::{HashMap, HashSet};

use supersql_error::{Result, SuperSqlError};
use supersql_parser::ast::ObjectReference;

use crate::row::Row;

/// Per statement table alias bindings and the short name to qualified name
/// column index.
#[derive(Debug, Default)]
pub struct ColumnResolver {
    /// Every table name registered with the engine.
    known_tables: HashSet<String>,
    alias_to_table: HashMap<String, String>,
    table_to_alias: HashMap<String, String>,
    /// Prefixes used to qualify loaded columns in this statement.
    prefixes: HashSet<String>,
    /// Short column name -> qualified names present in the working table.
    index: HashMap<String, Vec<String>>,
}

impl ColumnResolver {
    pub fn new<S: Into<String>>(known_tables: impl IntoIterator<Item = S>) -> Self {
        ColumnResolver {
            known_tables: known_tables.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Record a `table AS alias` binding. A later binding for the same table
    /// replaces the reverse mapping.
    pub fn bind_alias(&mut self, table: &str, alias: &str) {
        self.alias_to_table
            .insert(alias.to_string(), table.to_string());
        self.table_to_alias
            .insert(table.to_string(), alias.to_string());
    }

    /// Record the prefix a table's columns were qualified with.
    pub fn register_prefix(&mut self, prefix: &str) {
        self.prefixes.insert(prefix.to_string());
    }

    pub fn is_prefix(&self, prefix: &str) -> bool {
        self.prefixes.contains(prefix)
    }

    /// Resolve the table part of a dotted column name to the prefix used in
    /// the working table.
    pub fn resolve_table_prefix(&self, prefix: &str) -> Result<String> {
        if self.alias_to_table.contains_key(prefix) {
            return Ok(prefix.to_string());
        }
        if self.known_tables.contains(prefix) || self.prefixes.contains(prefix) {
            return Ok(self
                .table_to_alias
                .get(prefix)
                .cloned()
                .unwrap_or_else(|| prefix.to_string()));
        }
        Err(SuperSqlError::UnknownTableOrAlias(prefix.to_string()))
    }

    /// Qualify a possibly dotted column name.
    pub fn qualify(&self, name: &str) -> Result<String> {
        if name == "*" {
            return Ok(name.to_string());
        }

        if let Some((prefix, column)) = name.split_once('.') {
            let prefix = self.resolve_table_prefix(prefix)?;
            return Ok(format!("{prefix}.{column}"));
        }

        match self.index.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(SuperSqlError::UnknownColumn(name.to_string())),
            Some([qualified]) => Ok(qualified.clone()),
            Some(_) => Err(SuperSqlError::AmbiguousColumn(name.to_string())),
        }
    }

    pub fn qualify_reference(&self, reference: &ObjectReference) -> Result<String> {
        self.qualify(&reference.to_string())
    }

    /// Rebuild the column index from a sample row of the working table. An
    /// empty table leaves the index untouched.
    pub fn rebuild_index(&mut self, sample: Option<&Row>) {
        let sample = match sample {
            Some(sample) => sample,
            None => return,
        };

        self.index.clear();
        for name in sample.keys() {
            let Some((prefix, column)) = name.split_once('.') else {
                continue;
            };
            if !self.prefixes.contains(prefix) {
                continue;
            }
            self.index
                .entry(column.to_lowercase())
                .or_default()
                .push(name.to_lowercase());
        }
    }

    /// Check if a short column name has at most one qualified variant.
    pub fn is_unique(&self, column: &str) -> bool {
        self.index.get(column).is_none_or(|names| names.len() < 2)
    }

    /// Drop the table prefix from every column whose short name is unique.
    pub fn strip_prefix_if_unique(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(name, value)| {
                let short = match name.split_once('.') {
                    Some((prefix, column)) if self.is_prefix(prefix) && self.is_unique(column) => {
                        Some(column.to_string())
                    }
                    _ => None,
                };
                (short.unwrap_or(name), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use supersql_error::ErrorKind;

    use super::*;
    use crate::value::Value;

    fn joined_resolver() -> ColumnResolver {
        let mut resolver = ColumnResolver::new(["user", "car"]);
        resolver.bind_alias("user", "u");
        resolver.register_prefix("u");
        resolver.register_prefix("car");

        let mut sample = Row::new();
        for name in ["u.id", "u.username", "car.id", "car.owner"] {
            sample.insert(name.to_string(), Value::Null);
        }
        resolver.rebuild_index(Some(&sample));
        resolver
    }

    #[test]
    fn qualifies_short_names() {
        let resolver = joined_resolver();
        assert_eq!("u.username", resolver.qualify("username").unwrap());
        assert_eq!("car.owner", resolver.qualify("owner").unwrap());
        assert_eq!("*", resolver.qualify("*").unwrap());
    }

    #[test]
    fn ambiguous_and_unknown_columns() {
        let resolver = joined_resolver();
        assert_eq!(
            ErrorKind::AmbiguousColumn,
            resolver.qualify("id").unwrap_err().kind()
        );
        assert_eq!(
            ErrorKind::UnknownColumn,
            resolver.qualify("colour").unwrap_err().kind()
        );
    }

    #[test]
    fn table_names_resolve_to_their_alias() {
        let resolver = joined_resolver();
        assert_eq!("u.id", resolver.qualify("user.id").unwrap());
        assert_eq!("u.id", resolver.qualify("u.id").unwrap());
        assert_eq!("car.id", resolver.qualify("car.id").unwrap());
        assert_eq!(
            ErrorKind::UnknownTableOrAlias,
            resolver.qualify("boat.id").unwrap_err().kind()
        );
    }

    #[test]
    fn empty_sample_keeps_index() {
        let mut resolver = joined_resolver();
        resolver.rebuild_index(None);
        assert_eq!("u.username", resolver.qualify("username").unwrap());
    }

    #[test]
    fn strips_only_unique_prefixes() {
        let resolver = joined_resolver();
        let mut row = Row::new();
        row.insert("u.id".to_string(), Value::from(1));
        row.insert("u.username".to_string(), Value::from("nam"));
        row.insert("car.id".to_string(), Value::from(2));
        row.insert("count(u.id)".to_string(), Value::from(1));

        let stripped = resolver.strip_prefix_if_unique(row);
        let names: Vec<_> = stripped.keys().cloned().collect();
        assert_eq!(vec!["u.id", "username", "car.id", "count(u.id)"], names);
    }
}
