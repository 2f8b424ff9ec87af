//! Tables backed by JSON files.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use supersql_core::row::row_from_raw;
use supersql_core::{EngineRegistry, RawRow, Result, Row, SuperSqlError};
use tracing::debug;

/// In memory copy of a JSON array of objects, written back to its file after
/// every change.
#[derive(Debug)]
pub struct JsonFileTable {
    path: PathBuf,
    rows: Mutex<Vec<RawRow>>,
}

impl JsonFileTable {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows: Vec<RawRow> = serde_json::from_slice(&fs::read(&path)?)?;
        debug!(path = %path.display(), rows = rows.len(), "opened json table");

        Ok(JsonFileTable {
            path,
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> Vec<RawRow> {
        self.rows.lock().clone()
    }

    pub fn insert(&self, row: &Row) -> Result<()> {
        let mut raw = RawRow::new();
        for (column, value) in row {
            raw.insert(column.clone(), serde_json::to_value(value)?);
        }

        let mut rows = self.rows.lock();
        rows.push(raw);
        self.persist(&rows)
    }

    /// Apply `updates` to the first row equal to `matched`.
    pub fn update(&self, updates: &Row, matched: &Row) -> Result<()> {
        let mut rows = self.rows.lock();
        let idx = find_row(&rows, matched)?;
        let row = &mut rows[idx];
        for (column, value) in updates {
            let key = existing_key(row, column).unwrap_or_else(|| column.clone());
            row.insert(key, serde_json::to_value(value)?);
        }
        self.persist(&rows)
    }

    /// Remove the first row equal to `matched`.
    pub fn delete(&self, matched: &Row) -> Result<()> {
        let mut rows = self.rows.lock();
        let idx = find_row(&rows, matched)?;
        rows.remove(idx);
        self.persist(&rows)
    }

    pub fn truncate(&self) -> Result<usize> {
        let mut rows = self.rows.lock();
        let removed = rows.len();
        rows.clear();
        self.persist(&rows)?;
        Ok(removed)
    }

    fn persist(&self, rows: &[RawRow]) -> Result<()> {
        fs::write(&self.path, serde_json::to_vec_pretty(rows)?)?;
        debug!(path = %self.path.display(), rows = rows.len(), "wrote json table");
        Ok(())
    }
}

/// Index of the first row whose columns, with lowercased names, equal
/// `matched`.
fn find_row(rows: &[RawRow], matched: &Row) -> Result<usize> {
    rows.iter()
        .position(|raw| {
            let row = row_from_raw(raw.clone());
            row.len() == matched.len()
                && row.iter().all(|(column, value)| {
                    matched.get(&column.to_lowercase()) == Some(value)
                })
        })
        .ok_or_else(|| SuperSqlError::callback("matched row no longer exists in table file"))
}

/// Key of `row` matching `column` case-insensitively.
fn existing_key(row: &RawRow, column: &str) -> Option<String> {
    row.keys().find(|key| key.eq_ignore_ascii_case(column)).cloned()
}

/// Register a JSON file table with its provider and every mutation sink.
pub fn register_json_table(
    registry: &mut EngineRegistry,
    name: &str,
    table: Arc<JsonFileTable>,
    ttl: Duration,
) {
    let provider = table.clone();
    registry.register_cached_table(name, ttl, move || Ok(provider.rows()));

    let sink = table.clone();
    registry.register_insert_sink(name, move |row| sink.insert(row));
    let sink = table.clone();
    registry.register_update_sink(name, move |updates, matched| sink.update(updates, matched));
    let sink = table.clone();
    registry.register_delete_sink(name, move |matched| sink.delete(matched));
    registry.register_truncate_sink(name, move || table.truncate());
}

#[cfg(test)]
mod tests {
    use supersql_core::Value;

    use super::*;

    fn table(json: &str) -> (tempfile::TempDir, JsonFileTable) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car.json");
        fs::write(&path, json).unwrap();
        let table = JsonFileTable::open(&path).unwrap();
        (dir, table)
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn on_disk(table: &JsonFileTable) -> serde_json::Value {
        serde_json::from_slice(&fs::read(table.path()).unwrap()).unwrap()
    }

    #[test]
    fn update_matches_whole_row_and_keeps_key_case() {
        let (_dir, table) = table(r#"[{"ID": 1, "Name": "a"}, {"ID": 2, "Name": "a"}]"#);

        let matched = row(&[("id", Value::from(2)), ("name", Value::from("a"))]);
        let updates = row(&[("name", Value::from("b")), ("color", Value::from("red"))]);
        table.update(&updates, &matched).unwrap();

        assert_eq!(
            serde_json::json!([
                {"ID": 1, "Name": "a"},
                {"ID": 2, "Name": "b", "color": "red"},
            ]),
            on_disk(&table)
        );
    }

    #[test]
    fn delete_and_truncate_persist() {
        let (_dir, table) = table(r#"[{"id": 1}, {"id": 1}, {"id": 2}]"#);

        table.delete(&row(&[("id", Value::from(1))])).unwrap();
        assert_eq!(serde_json::json!([{"id": 1}, {"id": 2}]), on_disk(&table));

        assert_eq!(2, table.truncate().unwrap());
        assert_eq!(serde_json::json!([]), on_disk(&table));
    }

    #[test]
    fn missing_rows_are_callback_errors() {
        let (_dir, table) = table(r#"[{"id": 1}]"#);
        let err = table.delete(&row(&[("id", Value::from(3))])).unwrap_err();
        assert_eq!(supersql_core::ErrorKind::Callback, err.kind());
    }

    #[test]
    fn inserted_values_keep_their_json_type() {
        let (_dir, table) = table("[]");
        table
            .insert(&row(&[("id", Value::from(7)), ("price", Value::from(1.5)), ("note", Value::Null)]))
            .unwrap();
        assert_eq!(
            serde_json::json!([{"id": 7, "price": 1.5, "note": null}]),
            on_disk(&table)
        );
    }
}
