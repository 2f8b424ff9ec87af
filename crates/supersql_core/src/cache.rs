use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use supersql_error::Result;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::row::RawRow;

/// On-disk cache of provider responses.
///
/// Each table is stored as a JSON array of objects in its own file. The file
/// modification time is the load time, entries expire once it's older than
/// the table's TTL.
#[derive(Debug, Clone)]
pub struct TableCache {
    dir: PathBuf,
}

impl TableCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        TableCache {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }

    /// Read cached rows for a table if the cache file is younger than `ttl`.
    ///
    /// Missing, stale and unreadable files all return `None`.
    pub fn read_fresh(&self, table: &str, ttl: Duration) -> Option<Vec<RawRow>> {
        if ttl.is_zero() {
            return None;
        }

        let path = self.path_for(table);
        let modified = match fs::metadata(&path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%table, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(%table, path = %path.display(), %e, "ignoring unreadable cache file");
                return None;
            }
        };

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= ttl {
            debug!(%table, age_secs = age.as_secs(), "cache entry expired");
            return None;
        }

        match read_rows(&path) {
            Ok(rows) => {
                debug!(%table, rows = rows.len(), "cache hit");
                Some(rows)
            }
            Err(e) => {
                warn!(%table, path = %path.display(), %e, "ignoring unreadable cache file");
                None
            }
        }
    }

    /// Replace the cache entry for a table.
    ///
    /// Rows go to a temporary file in the cache directory which is then
    /// renamed over the entry, so readers never see a partial file.
    pub fn write(&self, table: &str, rows: &[RawRow]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut file, rows)?;
        file.flush()?;
        file.persist(self.path_for(table)).map_err(|e| e.error)?;
        debug!(%table, rows = rows.len(), "wrote cache entry");
        Ok(())
    }
}

fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
