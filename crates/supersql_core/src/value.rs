use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// Largest magnitude for which a whole number is written without a fraction.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A dynamically typed scalar.
///
/// All arithmetic happens on floating point numbers. Comparisons are loose:
/// strings compare case-insensitively, and a numeric string compared against a
/// number (or another numeric string) compares by numeric value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by WHERE, HAVING, ON and logical operators.
    ///
    /// Empty strings and "0" are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !(s.is_empty() || s == "0"),
        }
    }

    /// Numeric coercion. Strings use their longest numeric prefix, so "12abc"
    /// is 12 and "abc" is 0.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => parse_number_prefix(s),
        }
    }

    /// Textual coercion. Null and false are empty, true is "1".
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Boolean(true) => Cow::Borrowed("1"),
            Value::Boolean(false) => Cow::Borrowed(""),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::String(s) => Cow::Borrowed(s),
        }
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        self.loose_cmp(other) == Ordering::Equal
    }

    pub fn loose_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(_), _) | (_, Value::Boolean(_)) => {
                self.is_truthy().cmp(&other.is_truthy())
            }
            (Value::Null, Value::String(s)) => compare_text("", s),
            (Value::String(s), Value::Null) => compare_text(s, ""),
            (Value::Null, _) | (_, Value::Null) => self.is_truthy().cmp(&other.is_truthy()),
            (Value::Number(a), Value::Number(b)) => compare_f64(*a, *b),
            (Value::Number(a), Value::String(s)) => match parse_numeric(s) {
                Some(b) => compare_f64(*a, b),
                None => compare_text(&format_number(*a), s),
            },
            (Value::String(s), Value::Number(b)) => match parse_numeric(s) {
                Some(a) => compare_f64(a, *b),
                None => compare_text(s, &format_number(*b)),
            },
            (Value::String(a), Value::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
                (Some(a), Some(b)) => compare_f64(a, b),
                _ => compare_text(a, b),
            },
        }
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Format a number, writing whole numbers without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e18 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Length in bytes of the numeric prefix of `s`, zero if there is none.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut idx = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        idx += 1;
    }

    let int_start = idx;
    while bytes.get(idx).is_some_and(u8::is_ascii_digit) {
        idx += 1;
    }
    let mut digits = idx - int_start;

    if bytes.get(idx) == Some(&b'.') {
        let frac_start = idx + 1;
        let mut end = frac_start;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        if digits > 0 || end > frac_start {
            digits += end - frac_start;
            idx = end;
        }
    }

    if digits == 0 {
        return 0;
    }

    if matches!(bytes.get(idx), Some(b'e' | b'E')) {
        let mut end = idx + 1;
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let exp_start = end;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        if end > exp_start {
            idx = end;
        }
    }

    idx
}

fn parse_number_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    match numeric_prefix_len(s) {
        0 => 0.0,
        n => s[..n].parse().unwrap_or(0.0),
    }
}

/// Parse a string that is entirely numeric, ignoring surrounding whitespace.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    let len = numeric_prefix_len(s);
    if len == 0 || len != s.len() {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<serde_json::Value> for Value {
    /// Arrays and objects are stored as their JSON text.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::String(nested.to_string())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}
