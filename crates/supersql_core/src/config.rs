use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 100;

/// Configuration for an engine registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding cached provider responses, one file per table.
    pub cache_dir: PathBuf,
    /// Widest a column may be when rendering results as a text table.
    pub max_column_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

impl EngineConfig {
    pub fn with_cache_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cache_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the max rendered column width. Widths below 3 can't fit a
    /// truncation marker and are raised to 3.
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width.max(3);
        self
    }
}
