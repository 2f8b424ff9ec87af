//! Statement dispatch.
pub mod mutation;
pub mod select;

use serde::Serialize;
use supersql_error::{Result, SuperSqlError};
use supersql_parser::ast::ShowNode;
use supersql_parser::statement::Statement;
use tracing::debug;

use crate::params::substitute;
use crate::registry::EngineRegistry;
use crate::row::{Row, Table};
use crate::value::Value;

/// Column name of `SHOW TABLES` rows.
pub const SHOW_TABLES_COLUMN: &str = "Tables_in_database";

/// Result of executing a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// Rows of a SELECT or SHOW.
    Rows(Table),
    /// Rows touched by INSERT, UPDATE, DELETE or TRUNCATE.
    Affected(usize),
}

impl QueryOutput {
    pub fn rows(&self) -> Option<&Table> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            QueryOutput::Affected(_) => None,
        }
    }

    pub fn affected(&self) -> Option<usize> {
        match self {
            QueryOutput::Rows(_) => None,
            QueryOutput::Affected(n) => Some(*n),
        }
    }

    pub fn into_rows(self) -> Option<Table> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            QueryOutput::Affected(_) => None,
        }
    }
}

/// Substitute parameters, then lowercase the statement text.
fn prepare_sql(sql: &str, params: &[Value]) -> Result<String> {
    let sql = if params.is_empty() {
        sql.to_string()
    } else {
        substitute(sql, params)?
    };
    Ok(sql.to_lowercase())
}

/// Execute exactly one statement.
pub fn execute(registry: &EngineRegistry, sql: &str, params: &[Value]) -> Result<QueryOutput> {
    let sql = prepare_sql(sql, params)?;
    let statement = supersql_parser::parse_one(&sql)?;
    execute_statement(registry, &statement)
}

/// Execute every `;` separated statement of a script in order, stopping at the
/// first error.
pub fn execute_script(
    registry: &EngineRegistry,
    sql: &str,
    params: &[Value],
) -> Result<Vec<QueryOutput>> {
    let sql = prepare_sql(sql, params)?;
    supersql_parser::parse(&sql)?
        .iter()
        .map(|statement| execute_statement(registry, statement))
        .collect()
}

/// Execute a parsed statement.
///
/// Identifiers are expected to already be lowercase.
pub fn execute_statement(registry: &EngineRegistry, statement: &Statement) -> Result<QueryOutput> {
    debug!(kind = statement.kind(), "executing statement");

    Ok(match statement {
        Statement::Select(node) => QueryOutput::Rows(select::execute_subquery(registry, node)?),
        Statement::Insert(node) => QueryOutput::Affected(mutation::insert(registry, node)?),
        Statement::Update(node) => QueryOutput::Affected(mutation::update(registry, node)?),
        Statement::Delete(node) => QueryOutput::Affected(mutation::delete(registry, node)?),
        Statement::Truncate(node) => QueryOutput::Affected(mutation::truncate(registry, node)?),
        Statement::Show(node) => QueryOutput::Rows(show(registry, node)?),
    })
}

fn show(registry: &EngineRegistry, node: &ShowNode) -> Result<Table> {
    if !node.target.value.eq_ignore_ascii_case("tables") {
        return Err(SuperSqlError::unsupported(format!("SHOW {}", node.target)));
    }

    Ok(registry
        .table_names()
        .map(|name| {
            let mut row = Row::new();
            row.insert(SHOW_TABLES_COLUMN.to_string(), Value::from(name));
            row
        })
        .collect())
}
