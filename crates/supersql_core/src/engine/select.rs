use supersql_error::Result;
use supersql_parser::ast::{Expr, FromItem, OrderByNode, SelectItem, SelectNode};
use tracing::debug;

use crate::expr::{ColumnAliases, ExpressionEvaluator, SubqueryCache};
use crate::group::{flatten, partition};
use crate::join::{cross_join, merge_rows};
use crate::registry::EngineRegistry;
use crate::resolver::ColumnResolver;
use crate::row::{Row, RowContext, Table, WorkingRow};
use crate::sort::sort_by_keys;
use crate::source::load_table;
use crate::value::Value;

/// Run a SELECT on its own resolver state and return the final rows.
pub fn execute_subquery(registry: &EngineRegistry, node: &SelectNode) -> Result<Table> {
    SelectExecutor::new(registry, &node.projections).run(node)
}

/// State for executing one SELECT.
///
/// Owns the alias bindings and column index for the statement. Subqueries get
/// their own executor.
pub(crate) struct SelectExecutor<'a> {
    registry: &'a EngineRegistry,
    resolver: ColumnResolver,
    aliases: ColumnAliases,
    subqueries: SubqueryCache,
}

impl<'a> SelectExecutor<'a> {
    pub(crate) fn new(registry: &'a EngineRegistry, projections: &[SelectItem]) -> Self {
        SelectExecutor {
            registry,
            resolver: ColumnResolver::new(registry.table_names()),
            aliases: ColumnAliases::from_projection(projections),
            subqueries: SubqueryCache::default(),
        }
    }

    pub(crate) fn evaluator(&self) -> ExpressionEvaluator<'_> {
        ExpressionEvaluator::new(self.registry, &self.resolver, &self.aliases, &self.subqueries)
    }

    /// Run the full pipeline, stripping table prefixes from the result where
    /// the short name is unique.
    pub(crate) fn run(mut self, node: &SelectNode) -> Result<Table> {
        let rows = self.run_qualified(node)?;
        Ok(rows
            .into_iter()
            .map(|row| self.resolver.strip_prefix_if_unique(row))
            .collect())
    }

    /// Run the full pipeline, keeping qualified column names.
    pub(crate) fn run_qualified(&mut self, node: &SelectNode) -> Result<Table> {
        let table = self.from(&node.from)?;
        debug!(rows = table.len(), "from");

        let table = self.filter(table, node.where_expr.as_ref())?;
        debug!(rows = table.len(), "where");

        let rows = if !node.group_by.is_empty() {
            let rows = self.group(table, &node.group_by)?;
            debug!(groups = rows.len(), "group by");
            rows
        } else if is_aggregate_only(&node.projections) {
            if table.is_empty() && node.projections.len() == 1 {
                return Ok(vec![self.empty_aggregate(&node.projections[0])]);
            }
            // The whole table is one group.
            vec![WorkingRow::grouped(Row::new(), table)]
        } else {
            table.into_iter().map(WorkingRow::new).collect()
        };

        let rows = self.having(rows, node.having.as_ref())?;
        let rows = self.order(rows, &node.order_by)?;
        let rows = match node.limit {
            Some(limit) => rows
                .into_iter()
                .skip(limit.offset)
                .take(limit.count)
                .collect(),
            None => rows,
        };

        let projected = self.project(&node.projections, rows)?;
        debug!(rows = projected.len(), "select");

        Ok(projected)
    }

    pub(crate) fn strip_row(&self, row: Row) -> Row {
        self.resolver.strip_prefix_if_unique(row)
    }

    /// Load and join every table in the FROM clause.
    ///
    /// Stops early once the working table is empty since later joins can't
    /// add rows to it. A SELECT without FROM works on a single empty row.
    fn from(&mut self, from: &[FromItem]) -> Result<Table> {
        if from.is_empty() {
            return Ok(vec![Row::new()]);
        }

        let mut working: Option<Table> = None;
        for item in from {
            let table = item.table.value.as_str();
            if let Some(alias) = &item.alias {
                self.resolver.bind_alias(table, &alias.value);
            }

            if working.as_ref().is_some_and(|rows| rows.is_empty()) {
                break;
            }

            let prefix = item.reference_name().to_string();
            self.resolver.register_prefix(&prefix);
            let loaded = load_table(self.registry, table, &prefix)?;

            let joined = match working.take() {
                None => loaded,
                Some(accumulator) => self.join(accumulator, loaded, item.constraint.as_ref())?,
            };
            self.resolver.rebuild_index(joined.first());
            working = Some(joined);
        }

        Ok(working.unwrap_or_default())
    }

    fn join(&mut self, accumulator: Table, right: Table, constraint: Option<&Expr>) -> Result<Table> {
        let Some(constraint) = constraint else {
            return cross_join(accumulator, &right, |_| Ok(true));
        };

        // The condition may use short names from either side.
        if let (Some(left), Some(first)) = (accumulator.first(), right.first()) {
            self.resolver.rebuild_index(Some(&merge_rows(left, first)));
        }

        let evaluator = self.evaluator();
        cross_join(accumulator, &right, |row| {
            evaluator.matches(constraint, RowContext::leaf(row))
        })
    }

    fn filter(&self, table: Table, predicate: Option<&Expr>) -> Result<Table> {
        let Some(predicate) = predicate else {
            return Ok(table);
        };

        let evaluator = self.evaluator();
        let mut kept = Vec::with_capacity(table.len());
        for row in table {
            if evaluator.matches(predicate, RowContext::leaf(&row))? {
                kept.push(row);
            }
        }
        Ok(kept)
    }

    fn group(&self, table: Table, keys: &[Expr]) -> Result<Vec<WorkingRow>> {
        let names: Vec<String> = keys.iter().map(|key| self.key_name(key)).collect();
        let evaluator = self.evaluator();
        let tree = partition(table, &names, &mut |idx, row| {
            evaluator.evaluate(&keys[idx], RowContext::leaf(row))
        })?;
        Ok(flatten(tree))
    }

    /// Column name holding the value of a GROUP BY key in grouped rows.
    fn key_name(&self, key: &Expr) -> String {
        match key {
            Expr::Column(reference) => {
                let name = reference.to_string();
                if reference.0.len() == 1 && self.aliases.is_computed(&name) {
                    return name;
                }
                self.resolver.qualify(&name).unwrap_or(name)
            }
            other => other.to_string(),
        }
    }

    fn having(&self, rows: Vec<WorkingRow>, predicate: Option<&Expr>) -> Result<Vec<WorkingRow>> {
        let Some(predicate) = predicate else {
            return Ok(rows);
        };

        let evaluator = self.evaluator();
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if evaluator.matches(predicate, row.context())? {
                kept.push(row);
            }
        }
        Ok(kept)
    }

    fn order(&self, rows: Vec<WorkingRow>, order_by: &[OrderByNode]) -> Result<Vec<WorkingRow>> {
        if order_by.is_empty() {
            return Ok(rows);
        }

        let directions: Vec<_> = order_by.iter().map(|node| node.direction).collect();
        let evaluator = self.evaluator();
        sort_by_keys(rows, &directions, |row| {
            order_by
                .iter()
                .map(|node| evaluator.evaluate(&node.expr, row.context()))
                .collect()
        })
    }

    fn project(&mut self, items: &[SelectItem], rows: Vec<WorkingRow>) -> Result<Table> {
        let evaluator = self.evaluator();
        let mut projected = Vec::with_capacity(rows.len());

        for row in &rows {
            let mut out = Row::new();
            for item in items {
                match item {
                    SelectItem::Wildcard => {
                        out.extend(row.columns.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    SelectItem::QualifiedWildcard(table) => {
                        let prefix = format!("{}.", self.resolver.resolve_table_prefix(&table.value)?);
                        out.extend(
                            row.columns
                                .iter()
                                .filter(|(name, _)| name.starts_with(&prefix))
                                .map(|(k, v)| (k.clone(), v.clone())),
                        );
                    }
                    SelectItem::Expr { expr, alias, text } => {
                        let alias = alias.as_ref().map(|alias| alias.value.as_str());
                        let value = evaluator.evaluate_projection(alias, expr, row.context())?;
                        out.insert(self.output_name(expr, alias, text), value);
                    }
                }
            }
            projected.push(out);
        }

        self.resolver.rebuild_index(projected.first());
        Ok(projected)
    }

    /// Name of a projected expression column. Plain column references are
    /// qualified so their prefix can be stripped like any loaded column.
    fn output_name(&self, expr: &Expr, alias: Option<&str>, text: &str) -> String {
        if let Some(alias) = alias {
            return alias.to_string();
        }
        match expr {
            Expr::Column(reference) => self
                .resolver
                .qualify_reference(reference)
                .unwrap_or_else(|_| text.to_string()),
            _ => text.to_string(),
        }
    }

    /// Result of a lone aggregate over an empty table.
    fn empty_aggregate(&self, item: &SelectItem) -> Row {
        let mut row = Row::new();
        if let SelectItem::Expr { expr, alias, text } = item {
            let alias = alias.as_ref().map(|alias| alias.value.as_str());
            row.insert(self.output_name(expr, alias, text), Value::from(0));
        }
        row
    }
}

/// Check if every projected item is an aggregate expression.
fn is_aggregate_only(items: &[SelectItem]) -> bool {
    !items.is_empty()
        && items.iter().all(|item| match item {
            SelectItem::Expr { expr, .. } => expr.contains_aggregate(),
            _ => false,
        })
}
