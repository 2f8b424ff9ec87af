use indexmap::IndexMap;
use supersql_error::Result;

use crate::row::{Row, Table, WorkingRow};
use crate::value::Value;

/// One bucket of a GROUP BY partition.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    /// Key columns of this level.
    pub key: Row,
    pub children: GroupChildren,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupChildren {
    /// Member rows, at the last grouping level.
    Rows(Table),
    /// Sub groups for the next key.
    Groups(Vec<GroupNode>),
}

/// Partition rows by successive keys into a tree.
///
/// `key_names[i]` names the column holding the value of key `i`, and
/// `evaluate(i, row)` computes it. Buckets are ordered by first appearance of
/// their key value, and values are bucketed by their text.
pub fn partition<F>(rows: Table, key_names: &[String], evaluate: &mut F) -> Result<Vec<GroupNode>>
where
    F: FnMut(usize, &Row) -> Result<Value>,
{
    partition_level(rows, key_names, 0, evaluate)
}

fn partition_level<F>(
    rows: Table,
    key_names: &[String],
    depth: usize,
    evaluate: &mut F,
) -> Result<Vec<GroupNode>>
where
    F: FnMut(usize, &Row) -> Result<Value>,
{
    let mut buckets: IndexMap<String, (Value, Table)> = IndexMap::new();
    for row in rows {
        let value = evaluate(depth, &row)?;
        buckets
            .entry(value.as_text().into_owned())
            .or_insert_with(|| (value, Vec::new()))
            .1
            .push(row);
    }

    let mut nodes = Vec::with_capacity(buckets.len());
    for (_, (value, members)) in buckets {
        let mut key = Row::new();
        key.insert(key_names[depth].clone(), value);

        let children = if depth + 1 < key_names.len() {
            GroupChildren::Groups(partition_level(members, key_names, depth + 1, evaluate)?)
        } else {
            GroupChildren::Rows(members)
        };
        nodes.push(GroupNode { key, children });
    }

    Ok(nodes)
}

/// Flatten a partition tree into one grouped row per leaf bucket.
///
/// Each output row carries the key columns of every level above it, outer
/// keys first, and the members of its bucket as children.
pub fn flatten(nodes: Vec<GroupNode>) -> Vec<WorkingRow> {
    let mut out = Vec::new();
    for node in nodes {
        match node.children {
            GroupChildren::Rows(members) => out.push(WorkingRow::grouped(node.key, members)),
            GroupChildren::Groups(groups) => {
                let descendants = flatten(groups);
                if descendants.is_empty() {
                    out.push(WorkingRow::grouped(node.key, Vec::new()));
                    continue;
                }
                for descendant in descendants {
                    let mut columns = node.key.clone();
                    for (name, value) in descendant.columns {
                        columns.entry(name).or_insert(value);
                    }
                    out.push(WorkingRow {
                        columns,
                        children: descendant.children,
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Table {
        [("a", 1), ("b", 1), ("a", 2), ("a", 1), ("c", 2)]
            .into_iter()
            .enumerate()
            .map(|(idx, (brand, owner))| {
                let mut row = Row::new();
                row.insert("t.id".to_string(), Value::from(idx));
                row.insert("t.brand".to_string(), Value::from(brand));
                row.insert("t.owner".to_string(), Value::from(owner));
                row
            })
            .collect()
    }

    fn by_columns(columns: &[&str]) -> impl FnMut(usize, &Row) -> Result<Value> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        move |idx, row| Ok(row[columns[idx].as_str()].clone())
    }

    #[test]
    fn single_key_groups_in_first_seen_order() {
        let names = vec!["t.brand".to_string()];
        let tree = partition(rows(), &names, &mut by_columns(&["t.brand"])).unwrap();
        let flat = flatten(tree);

        let keys: Vec<_> = flat.iter().map(|r| r.columns["t.brand"].to_string()).collect();
        assert_eq!(vec!["a", "b", "c"], keys);
        let sizes: Vec<_> = flat
            .iter()
            .map(|r| r.children.as_ref().unwrap().len())
            .collect();
        assert_eq!(vec![3, 1, 1], sizes);
    }

    #[test]
    fn nested_keys_cover_every_row_once() {
        let names = vec!["t.owner".to_string(), "t.brand".to_string()];
        let tree =
            partition(rows(), &names, &mut by_columns(&["t.owner", "t.brand"])).unwrap();
        let flat = flatten(tree);

        let keys: Vec<_> = flat
            .iter()
            .map(|r| {
                (
                    r.columns["t.owner"].to_string(),
                    r.columns["t.brand"].to_string(),
                )
            })
            .collect();
        assert_eq!(
            vec![
                ("1".to_string(), "a".to_string()),
                ("1".to_string(), "b".to_string()),
                ("2".to_string(), "a".to_string()),
                ("2".to_string(), "c".to_string()),
            ],
            keys
        );

        let mut ids: Vec<_> = flat
            .iter()
            .flat_map(|r| r.children.as_ref().unwrap())
            .map(|row| row["t.id"].to_number() as i64)
            .collect();
        ids.sort();
        assert_eq!(vec![0, 1, 2, 3, 4], ids);
    }

    #[test]
    fn empty_input_has_no_groups() {
        let names = vec!["t.brand".to_string()];
        let tree = partition(Vec::new(), &names, &mut by_columns(&["t.brand"])).unwrap();
        assert!(flatten(tree).is_empty());
    }

    #[test]
    fn empty_subtree_keeps_its_key() {
        let mut key = Row::new();
        key.insert("t.owner".to_string(), Value::from(1));
        let tree = vec![GroupNode {
            key: key.clone(),
            children: GroupChildren::Groups(Vec::new()),
        }];
        assert_eq!(vec![WorkingRow::grouped(key, Vec::new())], flatten(tree));
    }
}
