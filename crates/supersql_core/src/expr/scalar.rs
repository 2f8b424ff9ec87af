//! Builtin scalar functions.
//!
//! Functions are eagerly evaluated over already computed argument values.
use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{Local, TimeZone, Utc};
use regex::{NoExpand, RegexBuilder};
use supersql_error::{Result, SuperSqlError};

use super::datetime::{DATETIME_FORMAT, ISO_FORMAT, parse_datetime};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive range.
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == *n,
            Arity::Between(min, max) => (*min..=*max).contains(&count),
            Arity::AtLeast(min) => count >= *min,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScalarFunctionSet {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub arity: Arity,
    pub function: fn(&[Value]) -> Result<Value>,
}

impl ScalarFunctionSet {
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        if !self.arity.accepts(args.len()) {
            return Err(SuperSqlError::unsupported(format!(
                "{} does not accept {} arguments",
                self.name.to_uppercase(),
                args.len()
            )));
        }
        (self.function)(args)
    }
}

pub const BUILTIN_SCALAR_FUNCTIONS: &[ScalarFunctionSet] = &[
    FUNCTION_SET_NOW,
    FUNCTION_SET_ROUND,
    FUNCTION_SET_SUBSTR,
    FUNCTION_SET_CONCAT,
    FUNCTION_SET_ABS,
    FUNCTION_SET_DATE,
    FUNCTION_SET_TIME,
    FUNCTION_SET_REPLACE,
    FUNCTION_SET_FROM_UNIXTIME,
    FUNCTION_SET_FLOOR,
    FUNCTION_SET_UNIX_TIMESTAMP,
    FUNCTION_SET_IF,
    FUNCTION_SET_YEAR,
    FUNCTION_SET_MONTH,
    FUNCTION_SET_LOWER,
    FUNCTION_SET_UPPER,
    FUNCTION_SET_LENGTH,
    FUNCTION_SET_COALESCE,
];

static FUNCTIONS_BY_NAME: LazyLock<HashMap<&'static str, &'static ScalarFunctionSet>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        for set in BUILTIN_SCALAR_FUNCTIONS {
            for name in std::iter::once(&set.name).chain(set.aliases) {
                if map.insert(*name, set).is_some() {
                    panic!("Duplicate function name: {name}");
                }
            }
        }
        map
    });

/// Find a function by name, ignoring case.
pub fn lookup(name: &str) -> Result<&'static ScalarFunctionSet> {
    FUNCTIONS_BY_NAME
        .get(name.to_ascii_lowercase().as_str())
        .copied()
        .ok_or_else(|| SuperSqlError::UnknownFunction(name.to_string()))
}

pub const FUNCTION_SET_NOW: ScalarFunctionSet = ScalarFunctionSet {
    name: "now",
    aliases: &["current_timestamp"],
    description: "Current local time as 'YYYY-MM-DD HH:MM:SS'.",
    arity: Arity::Exact(0),
    function: now,
};

fn now(_: &[Value]) -> Result<Value> {
    Ok(Value::String(Local::now().format(DATETIME_FORMAT).to_string()))
}

pub const FUNCTION_SET_ROUND: ScalarFunctionSet = ScalarFunctionSet {
    name: "round",
    aliases: &[],
    description: "Round half away from zero to the given number of decimals.",
    arity: Arity::Between(1, 2),
    function: round,
};

fn round(args: &[Value]) -> Result<Value> {
    let value = args[0].to_number();
    let decimals = args.get(1).map(|d| d.to_number() as i32).unwrap_or(0);
    let scale = 10f64.powi(decimals.clamp(-15, 15));
    Ok(Value::Number((value * scale).round() / scale))
}

pub const FUNCTION_SET_SUBSTR: ScalarFunctionSet = ScalarFunctionSet {
    name: "substr",
    aliases: &[],
    description: "Substring from a zero based start, negative positions count from the end.",
    arity: Arity::Between(2, 3),
    function: substr,
};

fn substr(args: &[Value]) -> Result<Value> {
    let chars: Vec<char> = args[0].as_text().chars().collect();
    let len = chars.len() as i64;
    let start = args[1].to_number() as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    if start > len {
        return Ok(Value::String(String::new()));
    }

    let end = match args.get(2) {
        None => len,
        Some(count) => {
            let count = (count.to_number() as i64).clamp(-len, len);
            if count < 0 {
                len + count
            } else {
                start.saturating_add(count).min(len)
            }
        }
    };
    if end <= start {
        return Ok(Value::String(String::new()));
    }

    Ok(Value::String(
        chars[start as usize..end as usize].iter().collect(),
    ))
}

pub const FUNCTION_SET_CONCAT: ScalarFunctionSet = ScalarFunctionSet {
    name: "concat",
    aliases: &[],
    description: "Concatenate the text of every argument.",
    arity: Arity::AtLeast(1),
    function: concat,
};

fn concat(args: &[Value]) -> Result<Value> {
    Ok(Value::String(args.iter().map(|v| v.as_text()).collect()))
}

pub const FUNCTION_SET_ABS: ScalarFunctionSet = ScalarFunctionSet {
    name: "abs",
    aliases: &[],
    description: "Absolute value.",
    arity: Arity::Exact(1),
    function: abs,
};

fn abs(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(args[0].to_number().abs()))
}

pub const FUNCTION_SET_DATE: ScalarFunctionSet = ScalarFunctionSet {
    name: "date",
    aliases: &[],
    description: "Date part of a date-time string as 'YYYY-MM-DD'.",
    arity: Arity::Exact(1),
    function: date,
};

/// Reformat a parsed date-time, NULL if the input doesn't parse.
fn format_datetime(value: &Value, format: &str) -> Value {
    match parse_datetime(&value.as_text()) {
        Some(dt) => Value::String(dt.format(format).to_string()),
        None => Value::Null,
    }
}

fn date(args: &[Value]) -> Result<Value> {
    Ok(format_datetime(&args[0], "%Y-%m-%d"))
}

pub const FUNCTION_SET_TIME: ScalarFunctionSet = ScalarFunctionSet {
    name: "time",
    aliases: &[],
    description: "Time part of a date-time string as 'HH:MM:SS'.",
    arity: Arity::Exact(1),
    function: time,
};

fn time(args: &[Value]) -> Result<Value> {
    Ok(format_datetime(&args[0], "%H:%M:%S"))
}

pub const FUNCTION_SET_REPLACE: ScalarFunctionSet = ScalarFunctionSet {
    name: "replace",
    aliases: &[],
    description: "Replace every case-insensitive occurrence of a search string.",
    arity: Arity::Exact(3),
    function: replace,
};

fn replace(args: &[Value]) -> Result<Value> {
    let subject = args[0].as_text();
    let search = args[1].as_text();
    if search.is_empty() {
        return Ok(Value::String(subject.into_owned()));
    }

    let pattern = RegexBuilder::new(&regex::escape(&search))
        .case_insensitive(true)
        .build()
        .map_err(|e| SuperSqlError::unsupported(format!("REPLACE pattern: {e}")))?;
    let replacement = args[2].as_text();

    Ok(Value::String(
        pattern
            .replace_all(&subject, NoExpand(&replacement))
            .into_owned(),
    ))
}

pub const FUNCTION_SET_FROM_UNIXTIME: ScalarFunctionSet = ScalarFunctionSet {
    name: "from_unixtime",
    aliases: &[],
    description: "Local ISO 8601 date-time for a unix timestamp.",
    arity: Arity::Exact(1),
    function: from_unixtime,
};

fn from_unixtime(args: &[Value]) -> Result<Value> {
    let secs = args[0].to_number() as i64;
    Ok(match Local.timestamp_opt(secs, 0).single() {
        Some(dt) => Value::String(dt.format(ISO_FORMAT).to_string()),
        None => Value::Null,
    })
}

pub const FUNCTION_SET_FLOOR: ScalarFunctionSet = ScalarFunctionSet {
    name: "floor",
    aliases: &[],
    description: "Largest integer not greater than the argument.",
    arity: Arity::Exact(1),
    function: floor,
};

fn floor(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(args[0].to_number().floor()))
}

pub const FUNCTION_SET_UNIX_TIMESTAMP: ScalarFunctionSet = ScalarFunctionSet {
    name: "unix_timestamp",
    aliases: &[],
    description: "Seconds since the epoch, for now or for a date-time string.",
    arity: Arity::Between(0, 1),
    function: unix_timestamp,
};

fn unix_timestamp(args: &[Value]) -> Result<Value> {
    Ok(match args.first() {
        None => Value::Number(Utc::now().timestamp() as f64),
        Some(value) => match parse_datetime(&value.as_text()) {
            Some(dt) => Value::Number(dt.timestamp() as f64),
            None => Value::Null,
        },
    })
}

pub const FUNCTION_SET_IF: ScalarFunctionSet = ScalarFunctionSet {
    name: "if",
    aliases: &[],
    description: "Second argument if the first is true, else the third.",
    arity: Arity::Exact(3),
    function: if_then_else,
};

fn if_then_else(args: &[Value]) -> Result<Value> {
    Ok(if args[0].is_truthy() {
        args[1].clone()
    } else {
        args[2].clone()
    })
}

pub const FUNCTION_SET_YEAR: ScalarFunctionSet = ScalarFunctionSet {
    name: "year",
    aliases: &[],
    description: "Four digit year of a date-time string.",
    arity: Arity::Exact(1),
    function: year,
};

fn year(args: &[Value]) -> Result<Value> {
    Ok(format_datetime(&args[0], "%Y"))
}

pub const FUNCTION_SET_MONTH: ScalarFunctionSet = ScalarFunctionSet {
    name: "month",
    aliases: &[],
    description: "Two digit month of a date-time string.",
    arity: Arity::Exact(1),
    function: month,
};

fn month(args: &[Value]) -> Result<Value> {
    Ok(format_datetime(&args[0], "%m"))
}

pub const FUNCTION_SET_LOWER: ScalarFunctionSet = ScalarFunctionSet {
    name: "lower",
    aliases: &["lcase"],
    description: "Lowercase text.",
    arity: Arity::Exact(1),
    function: lower,
};

fn lower(args: &[Value]) -> Result<Value> {
    Ok(Value::String(args[0].as_text().to_lowercase()))
}

pub const FUNCTION_SET_UPPER: ScalarFunctionSet = ScalarFunctionSet {
    name: "upper",
    aliases: &["ucase"],
    description: "Uppercase text.",
    arity: Arity::Exact(1),
    function: upper,
};

fn upper(args: &[Value]) -> Result<Value> {
    Ok(Value::String(args[0].as_text().to_uppercase()))
}

pub const FUNCTION_SET_LENGTH: ScalarFunctionSet = ScalarFunctionSet {
    name: "length",
    aliases: &["char_length"],
    description: "Number of characters in the text.",
    arity: Arity::Exact(1),
    function: length,
};

fn length(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(args[0].as_text().chars().count() as f64))
}

pub const FUNCTION_SET_COALESCE: ScalarFunctionSet = ScalarFunctionSet {
    name: "coalesce",
    aliases: &["ifnull"],
    description: "First argument that isn't NULL.",
    arity: Arity::AtLeast(1),
    function: coalesce,
};

fn coalesce(args: &[Value]) -> Result<Value> {
    Ok(args
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use supersql_error::ErrorKind;

    use super::*;

    fn call(name: &str, args: &[Value]) -> Value {
        lookup(name).unwrap().invoke(args).unwrap()
    }

    #[test]
    fn lookup_is_case_insensitive_and_covers_aliases() {
        assert_eq!("now", lookup("NOW").unwrap().name);
        assert_eq!("now", lookup("current_timestamp").unwrap().name);
        assert_eq!(
            ErrorKind::UnknownFunction,
            lookup("frobnicate").unwrap_err().kind()
        );
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let err = lookup("abs").unwrap().invoke(&[]).unwrap_err();
        assert_eq!(ErrorKind::UnsupportedExpression, err.kind());
    }

    #[test]
    fn round_and_floor() {
        assert_eq!(Value::from(3.14), call("round", &[3.14159.into(), 2.into()]));
        assert_eq!(Value::from(3), call("round", &[2.5.into()]));
        assert_eq!(Value::from(-3), call("round", &[(-2.5).into()]));
        assert_eq!(Value::from(2), call("floor", &["2.9".into()]));
        assert_eq!(Value::from(4), call("abs", &[(-4).into()]));
    }

    #[test]
    fn substr_follows_zero_based_positions() {
        assert_eq!(Value::from("ota"), call("substr", &["toyota".into(), 3.into()]));
        assert_eq!(
            Value::from("oy"),
            call("substr", &["toyota".into(), 1.into(), 2.into()])
        );
        assert_eq!(Value::from("ta"), call("substr", &["toyota".into(), (-2).into()]));
        assert_eq!(
            Value::from("toyo"),
            call("substr", &["toyota".into(), 0.into(), (-2).into()])
        );
        assert_eq!(Value::from(""), call("substr", &["toyota".into(), 10.into()]));
    }

    #[test]
    fn substr_clamps_huge_counts_and_positions() {
        let s = || Value::from("toyota");
        assert_eq!(Value::from("oyota"), call("substr", &[s(), 1.into(), 1e30.into()]));
        assert_eq!(Value::from(""), call("substr", &[s(), 1.into(), (-1e30).into()]));
        assert_eq!(Value::from("toyota"), call("substr", &[s(), (-1e30).into(), 1e30.into()]));
        assert_eq!(Value::from(""), call("substr", &[s(), 1e30.into(), 1e30.into()]));
        assert_eq!(
            Value::from("ota"),
            call("substr", &[s(), 3.into(), (i64::MAX as f64).into()])
        );
    }

    #[test]
    fn replace_ignores_case() {
        assert_eq!(
            Value::from("honda civic, honda jazz"),
            call(
                "replace",
                &["Toyota civic, TOYOTA jazz".into(), "toyota".into(), "honda".into()]
            )
        );
        // Replacement text is literal.
        assert_eq!(
            Value::from("$1b"),
            call("replace", &["ab".into(), "a".into(), "$1".into()])
        );
    }

    #[test]
    fn concat_if_coalesce() {
        assert_eq!(
            Value::from("a1"),
            call("concat", &["a".into(), 1.into()])
        );
        assert_eq!(
            Value::from("yes"),
            call("if", &[1.into(), "yes".into(), "no".into()])
        );
        assert_eq!(
            Value::from("no"),
            call("if", &["0".into(), "yes".into(), "no".into()])
        );
        assert_eq!(
            Value::from(2),
            call("coalesce", &[Value::Null, 2.into()])
        );
    }

    #[test]
    fn date_parts() {
        let dt: Value = "2024-03-05 10:11:12".into();
        assert_eq!(Value::from("2024-03-05"), call("date", &[dt.clone()]));
        assert_eq!(Value::from("10:11:12"), call("time", &[dt.clone()]));
        assert_eq!(Value::from("2024"), call("year", &[dt.clone()]));
        assert_eq!(Value::from("03"), call("month", &[dt]));
        assert_eq!(Value::Null, call("year", &["not a date".into()]));
    }

    #[test]
    fn unix_time_round_trips() {
        assert_eq!(
            Value::from(0),
            call("unix_timestamp", &["1970-01-01T00:00:00Z".into()])
        );
        let text = call("from_unixtime", &[86400.into()]);
        assert_eq!(Value::from(86400), call("unix_timestamp", &[text]));
        assert!(call("unix_timestamp", &[]).to_number() > 0.0);
    }

    #[test]
    fn now_has_datetime_shape() {
        let now = call("now", &[]);
        assert!(crate::expr::datetime::parse_datetime(&now.as_text()).is_some());
        assert_eq!(19, now.as_text().len());
    }
}
