//! printf style placeholder substitution for statement parameters.
use std::fmt::Write as _;

use supersql_error::{Result, SuperSqlError};

use crate::value::Value;

/// Substitute `%s`, `%d`, `%f` and `%%` placeholders, and their positional
/// `%N$s` forms, with `params`.
///
/// Values are inserted as is, so string parameters need to be quoted in the
/// statement text, e.g. `WHERE name = '%s'`.
pub fn substitute(sql: &str, params: &[Value]) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut next_param = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        // Optional `N$` argument position.
        let mut digits = String::new();
        while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            digits.push(*d);
            chars.next();
        }
        let position = if digits.is_empty() {
            None
        } else if chars.next_if_eq(&'$').is_some() {
            let n: usize = digits
                .parse()
                .map_err(|_| SuperSqlError::ParameterMismatch(format!("bad position %{digits}$")))?;
            if n == 0 {
                return Err(SuperSqlError::ParameterMismatch(
                    "argument positions start at 1".to_string(),
                ));
            }
            Some(n - 1)
        } else {
            return Err(SuperSqlError::ParameterMismatch(format!(
                "unsupported placeholder %{digits}"
            )));
        };

        let conversion = chars.next().ok_or_else(|| {
            SuperSqlError::ParameterMismatch("statement ends with an unfinished placeholder".to_string())
        })?;
        if !matches!(conversion, 's' | 'd' | 'f') {
            return Err(SuperSqlError::ParameterMismatch(format!(
                "unsupported placeholder %{conversion}"
            )));
        }

        let idx = match position {
            Some(idx) => idx,
            None => {
                next_param += 1;
                next_param - 1
            }
        };
        let value = params.get(idx).ok_or_else(|| {
            SuperSqlError::ParameterMismatch(format!(
                "placeholder {} has no parameter, {} given",
                idx + 1,
                params.len()
            ))
        })?;

        // Writing to a String can't fail.
        let _ = match conversion {
            's' => write!(out, "{}", value.as_text()),
            'd' => write!(out, "{}", value.to_number().trunc() as i64),
            _ => write!(out, "{:.6}", value.to_number()),
        };
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use supersql_error::ErrorKind;

    use super::*;

    #[test]
    fn sequential_placeholders() {
        let sql = substitute(
            "select * from car where name = '%s' and owner = %d and price > %f",
            &[Value::from("Kia"), Value::from("2.9"), Value::from(1.5)],
        )
        .unwrap();
        assert_eq!(
            "select * from car where name = 'Kia' and owner = 2 and price > 1.500000",
            sql
        );
    }

    #[test]
    fn positional_and_escaped() {
        let sql = substitute(
            "select '%2$s', '%1$s', '%2$s', 100%%",
            &[Value::from("a"), Value::from("b")],
        )
        .unwrap();
        assert_eq!("select 'b', 'a', 'b', 100%", sql);
    }

    #[test]
    fn missing_and_unknown_placeholders() {
        let err = substitute("select %s, %s", &[Value::from(1)]).unwrap_err();
        assert_eq!(ErrorKind::ParameterMismatch, err.kind());

        let err = substitute("select %x", &[Value::from(1)]).unwrap_err();
        assert_eq!(ErrorKind::ParameterMismatch, err.kind());

        let err = substitute("select 1 %", &[Value::from(1)]).unwrap_err();
        assert_eq!(ErrorKind::ParameterMismatch, err.kind());
    }
}
