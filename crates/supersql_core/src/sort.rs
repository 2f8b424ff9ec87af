use std::cmp::Ordering;

use supersql_error::Result;
use supersql_parser::ast::OrderByDirection;

use crate::value::{Value, parse_numeric};

/// Totally ordered form of a value used for ORDER BY.
///
/// Nulls sort first, then numbers (including booleans and numeric strings),
/// then the remaining text compared case-insensitively.
#[derive(Debug, Clone)]
pub enum SortKey {
    Null,
    Number(f64),
    Text(String),
}

impl SortKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => SortKey::Null,
            Value::Boolean(b) => SortKey::Number(f64::from(u8::from(*b))),
            Value::Number(n) => SortKey::number(*n),
            Value::String(s) => match parse_numeric(s) {
                Some(n) => SortKey::number(n),
                None => SortKey::Text(s.to_lowercase()),
            },
        }
    }

    fn number(n: f64) -> Self {
        // Folds -0.0 into 0.0.
        SortKey::Number(n + 0.0)
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Compare two precomputed sort keys lexicographically, honoring each key's
/// direction.
pub fn compare_keys(a: &[SortKey], b: &[SortKey], directions: &[OrderByDirection]) -> Ordering {
    for ((a, b), direction) in a.iter().zip(b).zip(directions) {
        let ord = match direction {
            OrderByDirection::Asc => a.cmp(b),
            OrderByDirection::Desc => b.cmp(a),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Stable multi key sort.
///
/// `key_fn` computes one value per direction for every item, once per item.
pub fn sort_by_keys<T, F>(items: Vec<T>, directions: &[OrderByDirection], mut key_fn: F) -> Result<Vec<T>>
where
    F: FnMut(&T) -> Result<Vec<Value>>,
{
    let mut keyed = items
        .into_iter()
        .map(|item| {
            let keys: Vec<SortKey> = key_fn(&item)?.iter().map(SortKey::from_value).collect();
            Ok((keys, item))
        })
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, directions));

    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}
