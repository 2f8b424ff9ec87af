//! Plain text rendering of result rows.
use crate::row::Row;
use crate::value::Value;

/// Render rows as an aligned text table.
///
/// Columns are taken from the first row. Widths are measured in characters
/// and capped at `max_width`; longer values are cut and end in "..".
pub fn pretty_table(rows: &[Row], max_width: usize) -> String {
    let Some(first) = rows.first() else {
        return "Empty result".to_string();
    };
    let max_width = max_width.max(3);

    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| cell_text(row.get(*col)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            cells
                .iter()
                .map(|row| char_len(&row[idx]))
                .chain(std::iter::once(char_len(col)))
                .max()
                .unwrap_or(0)
                .min(max_width)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 4);
    lines.push(render_line(columns.iter().copied(), &widths));
    let separator_len = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
    lines.push("-".repeat(separator_len));
    for row in &cells {
        lines.push(render_line(row.iter().map(String::as_str), &widths));
    }
    lines.push(String::new());
    lines.push(format!("Total: {} rows", rows.len()));

    lines.join("\n")
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.as_text().replace(['\r', '\n'], " "),
        None => String::new(),
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let rendered: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let cell = if char_len(cell) > *width {
                let mut cut: String = cell.chars().take(width - 2).collect();
                cut.push_str("..");
                cut
            } else {
                cell.to_string()
            };
            format!("{cell:<width$}")
        })
        .collect();
    rendered.join(" | ").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_result() {
        assert_eq!("Empty result", pretty_table(&[], 100));
    }

    #[test]
    fn aligned_table() {
        let rows = vec![
            row(&[("id", Value::from(1)), ("username", Value::from("nam"))]),
            row(&[("id", Value::from(20)), ("username", Value::Null)]),
        ];
        let expected = [
            "id | username",
            "-------------",
            "1  | nam",
            "20 |",
            "",
            "Total: 2 rows",
        ]
        .join("\n");
        assert_eq!(expected, pretty_table(&rows, 100));
    }

    #[test]
    fn long_values_are_truncated() {
        let rows = vec![row(&[
            ("note", Value::from("héllo wörld\nagain")),
            ("n", Value::from(1)),
        ])];
        let out = pretty_table(&rows, 8);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!("note     | n", lines[0]);
        assert_eq!("héllo .. | 1", lines[2]);
    }
}
