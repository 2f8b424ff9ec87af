use supersql_error::Result;

use crate::row::{Row, Table};

/// Merge two rows. Columns of `right` overwrite same named columns of `left`,
/// which qualification rules out for rows of different tables.
pub fn merge_rows(left: &Row, right: &Row) -> Row {
    let mut merged = Row::with_capacity(left.len() + right.len());
    merged.extend(left.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.extend(right.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Join a freshly loaded table onto the accumulated working table.
///
/// An empty `right` leaves the accumulator as is. Otherwise every pair of
/// rows is merged, left major, and kept if `keep` accepts the merged row.
pub fn cross_join<F>(accumulator: Table, right: &[Row], mut keep: F) -> Result<Table>
where
    F: FnMut(&Row) -> Result<bool>,
{
    if right.is_empty() {
        return Ok(accumulator);
    }

    let mut joined = Vec::new();
    for left in &accumulator {
        for row in right {
            let merged = merge_rows(left, row);
            if keep(&merged)? {
                joined.push(merged);
            }
        }
    }

    Ok(joined)
}
