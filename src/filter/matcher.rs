//! In-process evaluation of the where-language.
//!
//! Mirrors the SQL rendering in [`super::filter_where`]: implicit equality,
//! `null` meaning absent, empty `$in` matching nothing, and array operators
//! over list-valued fields. Comparisons against an absent field are false,
//! as they are in SQL.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::{is_identifier, FilterError};
use super::filter_order::FilterOrder;
use super::types::{FilterData, FilterOp, FilterOrderInfo, SortDirection};

/// Whether `record` satisfies `where_data`
pub fn matches(where_data: &Value, record: &Map<String, Value>) -> Result<bool, FilterError> {
    match where_data {
        Value::Null => Ok(true),
        Value::Object(obj) => {
            for (key, value) in obj {
                let ok = if key.starts_with('$') {
                    match_logical(key, value, record)?
                } else {
                    match_field(key, value, record)?
                };
                if !ok {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
    }
}

fn match_logical(op: &str, value: &Value, record: &Map<String, Value>) -> Result<bool, FilterError> {
    match op {
        "$and" | "$or" => {
            let arr = value
                .as_array()
                .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
            let mut results = Vec::with_capacity(arr.len());
            for clause in arr {
                results.push(matches(clause, record)?);
            }
            Ok(if op == "$and" { results.iter().all(|r| *r) } else { results.iter().any(|r| *r) })
        }
        "$not" => Ok(!matches(value, record)?),
        _ => Err(FilterError::UnsupportedOperator(op.to_string())),
    }
}

fn match_field(field: &str, condition: &Value, record: &Map<String, Value>) -> Result<bool, FilterError> {
    if !is_identifier(field) {
        return Err(FilterError::InvalidColumn(field.to_string()));
    }
    let actual = record.get(field).unwrap_or(&Value::Null);

    match condition {
        Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
            for (op_key, expected) in obj {
                let op = FilterOp::parse(op_key)
                    .ok_or_else(|| FilterError::UnsupportedOperator(op_key.to_string()))?;
                if !apply(op, actual, expected)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        expected => apply(FilterOp::Eq, actual, expected),
    }
}

fn apply(op: FilterOp, actual: &Value, expected: &Value) -> Result<bool, FilterError> {
    Ok(match op {
        FilterOp::Eq if expected.is_null() => actual.is_null(),
        FilterOp::Ne if expected.is_null() => !actual.is_null(),
        _ if actual.is_null() && !matches!(op, FilterOp::Size) => false,
        FilterOp::Eq => values_equal(actual, expected),
        FilterOp::Ne => !values_equal(actual, expected),
        FilterOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(actual, expected) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::Like => like(actual, expected, false),
        FilterOp::ILike => like(actual, expected, true),
        FilterOp::In => match expected {
            Value::Array(values) => values.iter().any(|v| values_equal(actual, v)),
            other => values_equal(actual, other),
        },
        FilterOp::NIn => match expected {
            Value::Array(values) => !values.iter().any(|v| values_equal(actual, v)),
            other => !values_equal(actual, other),
        },
        FilterOp::Any => {
            let have = actual.as_array().map(Vec::as_slice).unwrap_or_default();
            match expected {
                Value::Array(values) => values.iter().any(|v| have.iter().any(|h| values_equal(h, v))),
                other => have.iter().any(|h| values_equal(h, other)),
            }
        }
        FilterOp::All => {
            let have = actual.as_array().map(Vec::as_slice).unwrap_or_default();
            match expected {
                Value::Array(values) => values.iter().all(|v| have.iter().any(|h| values_equal(h, v))),
                other => have.iter().any(|h| values_equal(h, other)),
            }
        }
        FilterOp::Size => {
            let size = expected
                .as_u64()
                .ok_or_else(|| FilterError::InvalidOperatorData("$size requires a non-negative integer".to_string()))?;
            let len = actual.as_array().map(Vec::len).unwrap_or(0) as u64;
            len == size
        }
        FilterOp::Between => match expected {
            Value::Array(bounds) if bounds.len() == 2 => {
                matches!(compare(actual, &bounds[0]), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(actual, &bounds[1]), Some(Ordering::Less | Ordering::Equal))
            }
            _ => return Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
        },
        FilterOp::Raw => return Err(FilterError::UnsupportedOperator("raw".to_string())),
    })
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// SQL `LIKE` with `%` and `_` wildcards
fn like(actual: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    let (Some(text), Some(pattern)) = (actual.as_str(), pattern.as_str()) else {
        return false;
    };
    let (text, pattern): (Vec<char>, Vec<char>) = if case_insensitive {
        (text.to_lowercase().chars().collect(), pattern.to_lowercase().chars().collect())
    } else {
        (text.chars().collect(), pattern.chars().collect())
    };
    like_at(&text, &pattern)
}

fn like_at(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|i| like_at(&text[i..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_at(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_at(&text[1..], rest),
    }
}

/// Order in place; absent values sort last ascending and first descending
pub fn sort(records: &mut [Map<String, Value>], order: &[FilterOrderInfo]) {
    if order.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        for info in order {
            let left = a.get(&info.column).unwrap_or(&Value::Null);
            let right = b.get(&info.column).unwrap_or(&Value::Null);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
            };
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Apply a full [`FilterData`] to an in-memory row set.
///
/// Returns the requested page and the number of rows matching before
/// pagination.
pub fn apply_filter(
    rows: impl IntoIterator<Item = Map<String, Value>>,
    filter: &FilterData,
    max_limit: usize,
) -> Result<(Vec<Map<String, Value>>, usize), FilterError> {
    let where_data = filter.where_clause.clone().unwrap_or(Value::Null);

    let mut matched = Vec::new();
    for row in rows {
        if matches(&where_data, &row)? {
            matched.push(row);
        }
    }

    if let Some(order) = &filter.order {
        sort(&mut matched, &FilterOrder::validate_and_parse(order)?);
    }

    let total = matched.len();
    let offset = match filter.offset {
        Some(o) if o < 0 => return Err(FilterError::NegativePage { field: "offset", value: o }),
        Some(o) => o as usize,
        None => 0,
    };
    let limit = match filter.limit {
        Some(l) if l < 0 => return Err(FilterError::NegativePage { field: "limit", value: l }),
        Some(l) => (l as usize).min(max_limit),
        None => usize::MAX,
    };

    let page = matched.into_iter().skip(offset).take(limit).collect();
    Ok((page, total))
}
