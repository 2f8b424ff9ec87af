//! INSERT, UPDATE, DELETE and TRUNCATE.
//!
//! Every statement looks up its sink before touching any data, so a missing
//! sink fails without side effects.
use supersql_error::{Result, SuperSqlError};
use supersql_parser::ast::{
    DeleteNode, Expr, FromItem, Ident, InsertNode, InsertSource, JoinKind, ObjectReference,
    SelectItem, SelectNode, TruncateNode, UpdateNode,
};
use tracing::debug;

use super::select::{SelectExecutor, execute_subquery};
use crate::registry::EngineRegistry;
use crate::row::{Row, RowContext, Table};

pub fn insert(registry: &EngineRegistry, node: &InsertNode) -> Result<usize> {
    let table = node.table.value.as_str();
    let sink = registry.insert_sink(table)?;
    let columns = column_names(&node.columns)?;

    let rows = match &node.source {
        InsertSource::Values(lists) => {
            if columns.is_empty() {
                return Err(SuperSqlError::unsupported(
                    "INSERT INTO ... VALUES requires a column list",
                ));
            }

            let executor = SelectExecutor::new(registry, &[]);
            let evaluator = executor.evaluator();
            let empty = Row::new();

            let mut rows = Vec::with_capacity(lists.len());
            for values in lists {
                if values.len() != columns.len() {
                    return Err(SuperSqlError::ArityMismatch {
                        columns: columns.len(),
                        values: values.len(),
                    });
                }
                let mut row = Row::new();
                for (column, expr) in columns.iter().zip(values) {
                    row.insert(column.clone(), evaluator.evaluate(expr, RowContext::leaf(&empty))?);
                }
                rows.push(row);
            }
            rows
        }
        InsertSource::Select(select) => {
            let selected = execute_subquery(registry, select)?;
            if columns.is_empty() {
                selected
            } else {
                selected
                    .into_iter()
                    .map(|row| {
                        if row.len() != columns.len() {
                            return Err(SuperSqlError::ArityMismatch {
                                columns: columns.len(),
                                values: row.len(),
                            });
                        }
                        Ok(columns.iter().cloned().zip(row.into_values()).collect())
                    })
                    .collect::<Result<Table>>()?
            }
        }
    };

    for row in &rows {
        sink(row)?;
    }
    debug!(%table, rows = rows.len(), "inserted");

    Ok(rows.len())
}

pub fn update(registry: &EngineRegistry, node: &UpdateNode) -> Result<usize> {
    let table = node.table.value.as_str();
    let sink = registry.update_sink(table)?;
    let columns = node
        .assignments
        .iter()
        .map(|assignment| Ok(assignment.column.base()?.value.clone()))
        .collect::<Result<Vec<_>>>()?;

    let select = matching_rows(&node.table, node.where_expr.clone());
    let mut executor = SelectExecutor::new(registry, &select.projections);
    let rows = executor.run_qualified(&select)?;

    let evaluator = executor.evaluator();
    for row in &rows {
        let mut updates = Row::new();
        for (column, assignment) in columns.iter().zip(&node.assignments) {
            updates.insert(
                column.clone(),
                evaluator.evaluate(&assignment.value, RowContext::leaf(row))?,
            );
        }
        sink(&updates, &executor.strip_row(row.clone()))?;
    }
    debug!(%table, rows = rows.len(), "updated");

    Ok(rows.len())
}

pub fn delete(registry: &EngineRegistry, node: &DeleteNode) -> Result<usize> {
    let table = node.table.value.as_str();
    let sink = registry.delete_sink(table)?;

    let select = matching_rows(&node.table, node.where_expr.clone());
    let mut executor = SelectExecutor::new(registry, &select.projections);
    let rows = executor.run_qualified(&select)?;

    for row in &rows {
        sink(&executor.strip_row(row.clone()))?;
    }
    debug!(%table, rows = rows.len(), "deleted");

    Ok(rows.len())
}

pub fn truncate(registry: &EngineRegistry, node: &TruncateNode) -> Result<usize> {
    let sink = registry.truncate_sink(&node.table.value)?;
    let removed = sink()?;
    debug!(table = %node.table, rows = removed, "truncated");
    Ok(removed)
}

/// `SELECT * FROM <table> [WHERE <expr>]`
fn matching_rows(table: &Ident, where_expr: Option<Expr>) -> SelectNode {
    SelectNode {
        projections: vec![SelectItem::Wildcard],
        from: vec![FromItem {
            table: table.clone(),
            alias: None,
            join: JoinKind::Base,
            constraint: None,
        }],
        where_expr,
        group_by: Vec::new(),
        having: None,
        order_by: Vec::new(),
        limit: None,
    }
}

/// Unqualified names of an INSERT column list.
fn column_names(columns: &[ObjectReference]) -> Result<Vec<String>> {
    columns
        .iter()
        .map(|column| Ok(column.base()?.value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;
    use supersql_error::ErrorKind;
    use supersql_parser::statement::Statement;

    use super::*;
    use crate::row::RawRow;
    use crate::value::Value;

    type Calls = Arc<Mutex<Vec<(Row, Row)>>>;

    fn registry() -> (EngineRegistry, Calls) {
        let calls: Calls = Arc::default();
        let mut registry = EngineRegistry::new();
        registry.register_table("car", || {
            Ok(serde_json::from_value::<Vec<RawRow>>(json!([
                {"id": 1, "name": "toyota innova", "owner": 1},
                {"id": 2, "name": "kia morning", "owner": 1},
                {"id": 4, "name": "honda civic", "owner": 2},
            ]))?)
        });

        let sink_calls = calls.clone();
        registry.register_insert_sink("car", move |row| {
            sink_calls.lock().push((row.clone(), Row::new()));
            Ok(())
        });
        let sink_calls = calls.clone();
        registry.register_update_sink("car", move |updates, row| {
            sink_calls.lock().push((updates.clone(), row.clone()));
            Ok(())
        });
        let sink_calls = calls.clone();
        registry.register_delete_sink("car", move |row| {
            sink_calls.lock().push((Row::new(), row.clone()));
            Ok(())
        });
        registry.register_truncate_sink("car", || Ok(3));

        (registry, calls)
    }

    fn parse(sql: &str) -> Statement {
        supersql_parser::parse_one(sql).unwrap()
    }

    #[test]
    fn insert_values_calls_sink_per_list() {
        let (registry, calls) = registry();
        let Statement::Insert(node) = parse("insert into car (id, car.name) values (5, 'mazda'), (6, concat('b', 'mw'))") else {
            unreachable!()
        };

        assert_eq!(2, insert(&registry, &node).unwrap());
        let calls = calls.lock();
        assert_eq!(Value::from(5), calls[0].0["id"]);
        assert_eq!(Value::from("mazda"), calls[0].0["name"]);
        assert_eq!(Value::from("bmw"), calls[1].0["name"]);
    }

    #[test]
    fn insert_arity_is_checked_before_any_sink_call() {
        let (registry, calls) = registry();
        let Statement::Insert(node) = parse("insert into car (id, name) values (5, 'a'), (6)") else {
            unreachable!()
        };

        let err = insert(&registry, &node).unwrap_err();
        assert_eq!(ErrorKind::ArityMismatch, err.kind());
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn insert_select_maps_columns_by_position() {
        let (registry, calls) = registry();
        let Statement::Insert(node) =
            parse("insert into car (id, name) select id + 10, name from car where owner = 1")
        else {
            unreachable!()
        };

        assert_eq!(2, insert(&registry, &node).unwrap());
        let calls = calls.lock();
        assert_eq!(Value::from(11), calls[0].0["id"]);
        assert_eq!(Value::from("kia morning"), calls[1].0["name"]);
    }

    #[test]
    fn update_passes_assignments_and_unprefixed_row() {
        let (registry, calls) = registry();
        let Statement::Update(node) = parse("update car set name = concat(name, '!'), owner = 3 where owner = 1") else {
            unreachable!()
        };

        assert_eq!(2, update(&registry, &node).unwrap());
        let calls = calls.lock();
        assert_eq!(Value::from("toyota innova!"), calls[0].0["name"]);
        assert_eq!(Value::from(3), calls[0].0["owner"]);
        assert_eq!(Value::from(1), calls[0].1["id"]);
        assert_eq!(Value::from(2), calls[1].1["id"]);
    }

    #[test]
    fn delete_calls_sink_per_matched_row() {
        let (registry, calls) = registry();
        let Statement::Delete(node) = parse("delete from car where id in (1, 4)") else {
            unreachable!()
        };

        assert_eq!(2, delete(&registry, &node).unwrap());
        let ids: Vec<_> = calls.lock().iter().map(|(_, row)| row["id"].clone()).collect();
        assert_eq!(vec![Value::from(1), Value::from(4)], ids);
    }

    #[test]
    fn truncate_returns_sink_result() {
        let (registry, _) = registry();
        let Statement::Truncate(node) = parse("truncate table car") else {
            unreachable!()
        };
        assert_eq!(3, truncate(&registry, &node).unwrap());
    }

    #[test]
    fn missing_sinks_fail_before_loading() {
        let mut registry = EngineRegistry::new();
        registry.register_table("car", || panic!("provider must not be called"));

        let Statement::Delete(node) = parse("delete from car") else {
            unreachable!()
        };
        let err = delete(&registry, &node).unwrap_err();
        assert_eq!("DELETE FROM is not defined for table 'car'", err.to_string());
    }
}
