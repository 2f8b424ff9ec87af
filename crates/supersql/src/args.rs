use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use logutil::LogFormat;
use supersql_core::EngineConfig;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Aligned text table.
    #[default]
    Table,
    /// One JSON array per result.
    Json,
    /// One JSON object per row.
    Ndjson,
}

/// A `NAME=PATH` table registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArg {
    pub name: String,
    pub path: PathBuf,
}

/// A `NAME=SECS` cache TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTtlArg {
    pub name: String,
    pub ttl: Duration,
}

#[derive(Debug, Parser)]
#[clap(name = "supersql")]
#[clap(version)]
#[clap(about = "Run SQL against JSON files as virtual tables", long_about = None)]
pub struct Cli {
    /// Register a table backed by a JSON file holding an array of objects.
    ///
    /// Mutating statements write the table back to its file.
    #[clap(short, long = "table", value_name = "NAME=PATH", value_parser = parse_table_arg)]
    pub tables: Vec<TableArg>,

    /// Cache a table's rows in the cache directory for the given number of
    /// seconds.
    #[clap(long = "cache-ttl", value_name = "NAME=SECS", value_parser = parse_cache_ttl_arg)]
    pub cache_ttls: Vec<CacheTtlArg>,

    /// Directory for cached table rows.
    #[clap(long, env = "SUPERSQL_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Read statements from a file. May be repeated.
    #[clap(short = 'f', long = "file", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Value for the next `%` placeholder. May be repeated.
    #[clap(short, long = "param", value_name = "VALUE")]
    pub params: Vec<String>,

    /// Display output mode.
    #[clap(long, value_enum, default_value_t = OutputMode::Table)]
    pub mode: OutputMode,

    /// Max width of a column in table mode.
    #[clap(long)]
    pub max_width: Option<usize>,

    /// Default log level. `RUST_LOG` takes precedence.
    #[clap(long, env = "SUPERSQL_LOG_LEVEL", default_value_t = Level::WARN)]
    pub log_level: Level,

    #[clap(long, value_enum, default_value_t = LogFormat::HumanReadable)]
    pub log_format: LogFormat,

    /// Statements to execute. Read from stdin if neither queries nor files
    /// are given.
    pub queries: Vec<String>,
}

impl Cli {
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(dir) = &self.cache_dir {
            config = config.with_cache_dir(dir);
        }
        if let Some(width) = self.max_width {
            config = config.with_max_column_width(width);
        }
        config
    }

    /// TTL for a table, zero when not cached.
    pub fn cache_ttl(&self, table: &str) -> Duration {
        self.cache_ttls
            .iter()
            .rev()
            .find(|arg| arg.name.eq_ignore_ascii_case(table))
            .map(|arg| arg.ttl)
            .unwrap_or(Duration::ZERO)
    }
}

fn split_pair<'a>(s: &'a str, what: &str) -> Result<(&'a str, &'a str), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => Ok((name, value)),
        _ => Err(format!("expected NAME={what}, got '{s}'")),
    }
}

fn parse_table_arg(s: &str) -> Result<TableArg, String> {
    let (name, path) = split_pair(s, "PATH")?;
    Ok(TableArg {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

fn parse_cache_ttl_arg(s: &str) -> Result<CacheTtlArg, String> {
    let (name, secs) = split_pair(s, "SECS")?;
    let secs: u64 = secs
        .parse()
        .map_err(|_| format!("invalid number of seconds '{secs}'"))?;
    Ok(CacheTtlArg {
        name: name.to_string(),
        ttl: Duration::from_secs(secs),
    })
}
