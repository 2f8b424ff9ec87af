use supersql_error::Result;
use tracing::debug;

use crate::registry::EngineRegistry;
use crate::row::{Row, Table, row_from_raw};

/// Load a table through its registered provider.
///
/// Cached rows are used while fresh. Otherwise the load hook runs, then the
/// provider is looked up and called, and its response is cached if the table
/// has a TTL. The hook sees every uncached load, including loads of tables
/// that turn out to be undefined. Nested values become JSON text, augmenter
/// columns are merged in, and every column is renamed to
/// `prefix.lowercased_name`.
pub fn load_table(registry: &EngineRegistry, table: &str, prefix: &str) -> Result<Table> {
    let ttl = registry
        .table(table)
        .map(|registered| registered.cache_ttl)
        .unwrap_or_default();

    let raw = match registry.cache().read_fresh(table, ttl) {
        Some(rows) => rows,
        None => {
            registry.notify_will_load(table);
            let registered = registry.table(table)?;
            let rows = (registered.provider)()?;
            if !registered.cache_ttl.is_zero() {
                registry.cache().write(table, &rows)?;
            }
            rows
        }
    };

    let augmenters = registry.augmenters(table);
    let mut loaded = Vec::with_capacity(raw.len());
    for raw_row in raw {
        let mut row = row_from_raw(raw_row);
        if !augmenters.is_empty() {
            let mut extra = Row::new();
            for augment in augmenters {
                extra.extend(augment(&row)?);
            }
            row.extend(extra);
        }

        let qualified: Row = row
            .into_iter()
            .map(|(name, value)| (format!("{prefix}.{}", name.to_lowercase()), value))
            .collect();
        loaded.push(qualified);
    }

    debug!(%table, %prefix, rows = loaded.len(), "loaded table");

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::EngineConfig;
    use crate::row::RawRow;
    use crate::value::Value;

    fn raw(value: serde_json::Value) -> Vec<RawRow> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn qualifies_and_lowercases_columns() {
        let mut registry = EngineRegistry::new();
        registry.register_table("user", || Ok(raw(json!([{"ID": 1, "Name": "nam"}]))));

        let rows = load_table(&registry, "user", "u").unwrap();
        let names: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(vec!["u.id", "u.name"], names);
    }

    #[test]
    fn augmenters_merge_in_order() {
        let mut registry = EngineRegistry::new();
        registry.register_table("car", || Ok(raw(json!([{"id": 1, "tags": ["a"]}]))));
        registry.register_column_augmenter("car", |row| {
            let mut extra = Row::new();
            extra.insert("label".to_string(), Value::from("first"));
            extra.insert("tags_text".to_string(), row["tags"].clone());
            Ok(extra)
        });
        registry.register_column_augmenter("car", |_| {
            let mut extra = Row::new();
            extra.insert("label".to_string(), Value::from("second"));
            Ok(extra)
        });

        let rows = load_table(&registry, "car", "car").unwrap();
        assert_eq!(Value::from("second"), rows[0]["car.label"]);
        assert_eq!(Value::from(r#"["a"]"#), rows[0]["car.tags_text"]);
    }

    #[test]
    fn cached_tables_call_provider_once() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let hooks = Arc::new(AtomicUsize::new(0));

        let mut registry =
            EngineRegistry::with_config(EngineConfig::default().with_cache_dir(dir.path()));
        let provider_calls = calls.clone();
        registry.register_cached_table("user", Duration::from_secs(60), move || {
            provider_calls.fetch_add(1, Ordering::SeqCst);
            Ok(raw(json!([{"id": 1}])))
        });
        let hook_calls = hooks.clone();
        registry.on_will_load_table(move |_| {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        });

        let first = load_table(&registry, "user", "user").unwrap();
        let second = load_table(&registry, "user", "user").unwrap();
        assert_eq!(first, second);
        assert_eq!(1, calls.load(Ordering::SeqCst));
        assert_eq!(1, hooks.load(Ordering::SeqCst));
        assert!(dir.path().join("user.json").exists());
    }

    #[test]
    fn load_hook_runs_before_table_lookup() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut registry = EngineRegistry::new();
        let hook_seen = seen.clone();
        registry.on_will_load_table(move |table| hook_seen.lock().push(table.to_string()));

        let err = load_table(&registry, "boat", "boat").unwrap_err();
        assert_eq!(supersql_error::ErrorKind::UndefinedTable, err.kind());
        assert_eq!(vec!["boat".to_string()], *seen.lock());
    }

    #[test]
    fn provider_errors_propagate() {
        let mut registry = EngineRegistry::new();
        registry.register_table("user", || {
            Err(supersql_error::SuperSqlError::callback("backend down"))
        });
        let err = load_table(&registry, "user", "user").unwrap_err();
        assert_eq!("backend down", err.to_string());
    }
}
