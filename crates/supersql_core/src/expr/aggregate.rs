use supersql_parser::ast::AggregateFunction;

use crate::value::Value;

/// Starting point for MAX, returned as is for an empty group.
pub const MAX_SENTINEL: f64 = i64::MIN as f64;
/// Starting point for MIN, returned as is for an empty group.
pub const MIN_SENTINEL: f64 = i64::MAX as f64;

/// Fold the per-member values of a group.
///
/// Values are coerced to numbers for everything but COUNT.
pub fn fold(func: AggregateFunction, values: impl IntoIterator<Item = Value>) -> Value {
    let mut count = 0usize;
    let mut acc = match func {
        AggregateFunction::Max => MAX_SENTINEL,
        AggregateFunction::Min => MIN_SENTINEL,
        _ => 0.0,
    };

    for value in values {
        count += 1;
        let n = value.to_number();
        match func {
            AggregateFunction::Count => (),
            AggregateFunction::Sum | AggregateFunction::Avg => acc += n,
            AggregateFunction::Max => {
                if n > acc {
                    acc = n
                }
            }
            AggregateFunction::Min => {
                if n < acc {
                    acc = n
                }
            }
        }
    }

    let result = match func {
        AggregateFunction::Count => count as f64,
        AggregateFunction::Avg if count == 0 => 0.0,
        AggregateFunction::Avg => acc / count as f64,
        _ => acc,
    };

    Value::Number(result)
}
