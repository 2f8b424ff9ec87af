use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use supersql_error::{Operation, Result, SuperSqlError};

use crate::cache::TableCache;
use crate::config::EngineConfig;
use crate::engine::{self, QueryOutput};
use crate::row::{RawRow, Row};
use crate::value::Value;

pub type TableProvider = Box<dyn Fn() -> Result<Vec<RawRow>> + Send + Sync>;
/// Returns extra columns to merge into a loaded row.
pub type ColumnAugmenter = Box<dyn Fn(&Row) -> Result<Row> + Send + Sync>;
pub type InsertSink = Box<dyn Fn(&Row) -> Result<()> + Send + Sync>;
/// Called with the evaluated assignments and the matched row.
pub type UpdateSink = Box<dyn Fn(&Row, &Row) -> Result<()> + Send + Sync>;
pub type DeleteSink = Box<dyn Fn(&Row) -> Result<()> + Send + Sync>;
/// Returns the number of removed rows.
pub type TruncateSink = Box<dyn Fn() -> Result<usize> + Send + Sync>;
pub type LoadHook = Box<dyn Fn(&str) + Send + Sync>;

pub struct RegisteredTable {
    pub provider: TableProvider,
    /// Zero disables caching.
    pub cache_ttl: Duration,
}

/// Host registered tables, column augmenters, mutation sinks and hooks.
///
/// Constructed once by the host and passed by reference into every statement
/// execution. Table names are case-insensitive.
pub struct EngineRegistry {
    config: EngineConfig,
    cache: TableCache,
    tables: BTreeMap<String, RegisteredTable>,
    augmenters: HashMap<String, Vec<ColumnAugmenter>>,
    insert_sinks: HashMap<String, InsertSink>,
    update_sinks: HashMap<String, UpdateSink>,
    delete_sinks: HashMap<String, DeleteSink>,
    truncate_sinks: HashMap<String, TruncateSink>,
    load_hook: Option<LoadHook>,
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        EngineRegistry {
            cache: TableCache::new(&config.cache_dir),
            config,
            tables: BTreeMap::new(),
            augmenters: HashMap::new(),
            insert_sinks: HashMap::new(),
            update_sinks: HashMap::new(),
            delete_sinks: HashMap::new(),
            truncate_sinks: HashMap::new(),
            load_hook: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// Register an uncached table provider.
    pub fn register_table<F>(&mut self, name: &str, provider: F)
    where
        F: Fn() -> Result<Vec<RawRow>> + Send + Sync + 'static,
    {
        self.register_cached_table(name, Duration::ZERO, provider)
    }

    /// Register a table provider whose responses are cached on disk for
    /// `ttl`.
    pub fn register_cached_table<F>(&mut self, name: &str, ttl: Duration, provider: F)
    where
        F: Fn() -> Result<Vec<RawRow>> + Send + Sync + 'static,
    {
        self.tables.insert(
            normalize(name),
            RegisteredTable {
                provider: Box::new(provider),
                cache_ttl: ttl,
            },
        );
    }

    /// Register a callback adding columns to every row of a table. Multiple
    /// augmenters apply in registration order.
    pub fn register_column_augmenter<F>(&mut self, table: &str, augmenter: F)
    where
        F: Fn(&Row) -> Result<Row> + Send + Sync + 'static,
    {
        self.augmenters
            .entry(normalize(table))
            .or_default()
            .push(Box::new(augmenter));
    }

    pub fn register_insert_sink<F>(&mut self, table: &str, sink: F)
    where
        F: Fn(&Row) -> Result<()> + Send + Sync + 'static,
    {
        self.insert_sinks.insert(normalize(table), Box::new(sink));
    }

    pub fn register_update_sink<F>(&mut self, table: &str, sink: F)
    where
        F: Fn(&Row, &Row) -> Result<()> + Send + Sync + 'static,
    {
        self.update_sinks.insert(normalize(table), Box::new(sink));
    }

    pub fn register_delete_sink<F>(&mut self, table: &str, sink: F)
    where
        F: Fn(&Row) -> Result<()> + Send + Sync + 'static,
    {
        self.delete_sinks.insert(normalize(table), Box::new(sink));
    }

    pub fn register_truncate_sink<F>(&mut self, table: &str, sink: F)
    where
        F: Fn() -> Result<usize> + Send + Sync + 'static,
    {
        self.truncate_sinks.insert(normalize(table), Box::new(sink));
    }

    /// Set the hook invoked before any provider is called. Replaces a
    /// previously set hook.
    pub fn on_will_load_table<F>(&mut self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.load_hook = Some(Box::new(hook));
    }

    /// Registered table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&normalize(name))
    }

    pub fn table(&self, name: &str) -> Result<&RegisteredTable> {
        self.tables
            .get(&normalize(name))
            .ok_or_else(|| SuperSqlError::undefined_table(Operation::Select, name))
    }

    pub fn augmenters(&self, table: &str) -> &[ColumnAugmenter] {
        self.augmenters
            .get(&normalize(table))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn insert_sink(&self, table: &str) -> Result<&InsertSink> {
        self.insert_sinks
            .get(&normalize(table))
            .ok_or_else(|| SuperSqlError::undefined_table(Operation::Insert, table))
    }

    pub fn update_sink(&self, table: &str) -> Result<&UpdateSink> {
        self.update_sinks
            .get(&normalize(table))
            .ok_or_else(|| SuperSqlError::undefined_table(Operation::Update, table))
    }

    pub fn delete_sink(&self, table: &str) -> Result<&DeleteSink> {
        self.delete_sinks
            .get(&normalize(table))
            .ok_or_else(|| SuperSqlError::undefined_table(Operation::Delete, table))
    }

    pub fn truncate_sink(&self, table: &str) -> Result<&TruncateSink> {
        self.truncate_sinks
            .get(&normalize(table))
            .ok_or_else(|| SuperSqlError::undefined_table(Operation::Truncate, table))
    }

    pub(crate) fn notify_will_load(&self, table: &str) {
        if let Some(hook) = &self.load_hook {
            hook(table);
        }
    }

    /// Execute a single statement against this registry.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput> {
        engine::execute(self, sql, params)
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("config", &self.config)
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .field("insert_sinks", &self.insert_sinks.keys().collect::<Vec<_>>())
            .field("update_sinks", &self.update_sinks.keys().collect::<Vec<_>>())
            .field("delete_sinks", &self.delete_sinks.keys().collect::<Vec<_>>())
            .field("truncate_sinks", &self.truncate_sinks.keys().collect::<Vec<_>>())
            .field("load_hook", &self.load_hook.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use supersql_error::ErrorKind;

    use super::*;

    #[test]
    fn names_are_case_insensitive_and_sorted() {
        let mut registry = EngineRegistry::new();
        registry.register_table("User", || Ok(Vec::new()));
        registry.register_table("car", || Ok(Vec::new()));

        assert!(registry.has_table("USER"));
        assert!(registry.table("user").is_ok());
        let names: Vec<_> = registry.table_names().collect();
        assert_eq!(vec!["car", "user"], names);
    }

    #[test]
    fn missing_sinks_name_the_operation() {
        let registry = EngineRegistry::new();
        let err = registry.update_sink("car").err().unwrap();
        assert_eq!(ErrorKind::UndefinedTable, err.kind());
        assert_eq!("UPDATE is not defined for table 'car'", err.to_string());

        let err = registry.table("car").err().unwrap();
        assert_eq!("SELECT FROM is not defined for table 'car'", err.to_string());
    }

    #[test]
    fn augmenters_accumulate() {
        let mut registry = EngineRegistry::new();
        registry.register_column_augmenter("car", |_| Ok(Row::new()));
        registry.register_column_augmenter("CAR", |_| Ok(Row::new()));
        assert_eq!(2, registry.augmenters("car").len());
        assert!(registry.augmenters("user").is_empty());
    }
}
