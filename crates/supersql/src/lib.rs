pub mod args;
pub mod output;
pub mod tables;

use std::fs;
use std::io::{Read, Write};
use std::sync::Arc;

use supersql_core::{EngineRegistry, Result, Value, execute_script};
use tracing::info;

use crate::args::Cli;
use crate::output::write_output;
use crate::tables::{JsonFileTable, register_json_table};

/// Build a registry holding every `--table` of the command line.
pub fn build_registry(cli: &Cli) -> Result<EngineRegistry> {
    let mut registry = EngineRegistry::with_config(cli.engine_config());
    for arg in &cli.tables {
        let table = Arc::new(JsonFileTable::open(&arg.path)?);
        register_json_table(&mut registry, &arg.name, table, cli.cache_ttl(&arg.name));
        info!(table = %arg.name, path = %arg.path.display(), "registered table");
    }
    Ok(registry)
}

/// Collect the scripts to run: positional queries, then files. Falls back to
/// `stdin` when neither is given.
pub fn scripts(cli: &Cli, stdin: &mut impl Read) -> Result<Vec<String>> {
    let mut scripts = cli.queries.clone();
    for path in &cli.files {
        scripts.push(fs::read_to_string(path)?);
    }

    if scripts.is_empty() {
        let mut buf = String::new();
        stdin.read_to_string(&mut buf)?;
        scripts.push(buf);
    }
    Ok(scripts)
}

/// Run every script, writing each statement's result to `out`. Stops at the
/// first failing statement.
pub fn run<W: Write>(cli: &Cli, stdin: &mut impl Read, out: &mut W) -> Result<()> {
    let registry = build_registry(cli)?;
    let params: Vec<Value> = cli.params.iter().map(|p| Value::from(p.as_str())).collect();
    let max_width = registry.config().max_column_width;

    for script in scripts(cli, stdin)? {
        if script.trim().is_empty() {
            continue;
        }
        for output in execute_script(&registry, &script, &params)? {
            write_output(out, &output, cli.mode, max_width)?;
        }
    }
    Ok(())
}
