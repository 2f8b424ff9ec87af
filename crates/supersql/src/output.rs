use std::io::Write;

use supersql_core::format::pretty_table;
use supersql_core::{QueryOutput, Result};

use crate::args::OutputMode;

/// Write the result of one statement.
pub fn write_output<W: Write>(
    out: &mut W,
    output: &QueryOutput,
    mode: OutputMode,
    max_width: usize,
) -> Result<()> {
    match output {
        QueryOutput::Affected(n) => writeln!(out, "Affected rows: {n}")?,
        QueryOutput::Rows(rows) => match mode {
            OutputMode::Table => writeln!(out, "{}", pretty_table(rows, max_width))?,
            OutputMode::Json => {
                serde_json::to_writer(&mut *out, rows)?;
                writeln!(out)?;
            }
            OutputMode::Ndjson => {
                for row in rows {
                    serde_json::to_writer(&mut *out, row)?;
                    writeln!(out)?;
                }
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use supersql_core::{Row, Value};

    use super::*;

    fn render(output: &QueryOutput, mode: OutputMode) -> String {
        let mut buf = Vec::new();
        write_output(&mut buf, output, mode, 100).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn rows() -> QueryOutput {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from(1));
        row.insert("name".to_string(), Value::from("nam"));
        QueryOutput::Rows(vec![row.clone(), row])
    }

    #[test]
    fn json_modes() {
        assert_eq!(
            "[{\"id\":1,\"name\":\"nam\"},{\"id\":1,\"name\":\"nam\"}]\n",
            render(&rows(), OutputMode::Json)
        );
        assert_eq!(
            "{\"id\":1,\"name\":\"nam\"}\n{\"id\":1,\"name\":\"nam\"}\n",
            render(&rows(), OutputMode::Ndjson)
        );
    }

    #[test]
    fn affected_rows_ignore_mode() {
        for mode in [OutputMode::Table, OutputMode::Json, OutputMode::Ndjson] {
            assert_eq!("Affected rows: 3\n", render(&QueryOutput::Affected(3), mode));
        }
    }

    #[test]
    fn empty_table() {
        assert_eq!(
            "Empty result\n",
            render(&QueryOutput::Rows(Vec::new()), OutputMode::Table)
        );
    }
}
