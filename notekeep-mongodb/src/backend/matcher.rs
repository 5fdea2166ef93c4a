//! Evaluation of MongoDB-style filters against in-memory documents.
//!
//! Supports the subset of the query language that note filters produce:
//! top-level `$and`/`$or`/`$nor`, field equality, and the field operators
//! `$eq $ne $gt $gte $lt $lte $in $nin $exists $regex $options`. Anything
//! else is rejected up front, so a malformed filter fails even against an
//! empty collection.

use std::cmp::Ordering;

use bson::{Bson, Document};
use regex_lite::Regex;

use super::{BackendError, BackendResult};

/// A compiled filter.
#[derive(Debug)]
pub(crate) enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Nor(Vec<Predicate>),
    Field { key: String, conditions: Vec<Condition> },
}

#[derive(Debug)]
pub(crate) enum Condition {
    Eq(Bson),
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Exists(bool),
    Regex(Regex),
}

impl Predicate {
    /// Compile a filter document.
    pub(crate) fn compile(filter: &Document) -> BackendResult<Self> {
        let mut clauses = Vec::with_capacity(filter.len());
        for (key, value) in filter {
            clauses.push(Self::compile_entry(key, value)?);
        }
        Ok(Self::And(clauses))
    }

    fn compile_entry(key: &str, value: &Bson) -> BackendResult<Self> {
        match key {
            "$and" => Ok(Self::And(Self::compile_list(key, value)?)),
            "$or" => Ok(Self::Or(Self::compile_list(key, value)?)),
            "$nor" => Ok(Self::Nor(Self::compile_list(key, value)?)),
            _ if key.starts_with('$') => Err(BackendError::invalid_filter(format!(
                "unknown top level operator: {}",
                key
            ))),
            _ => Ok(Self::Field {
                key: key.to_string(),
                conditions: compile_conditions(key, value)?,
            }),
        }
    }

    fn compile_list(operator: &str, value: &Bson) -> BackendResult<Vec<Self>> {
        let items = match value {
            Bson::Array(items) if !items.is_empty() => items,
            _ => {
                return Err(BackendError::invalid_filter(format!(
                    "{} must be a nonempty array",
                    operator
                )));
            }
        };

        items
            .iter()
            .map(|item| match item {
                Bson::Document(doc) => Self::compile(doc),
                _ => Err(BackendError::invalid_filter(format!(
                    "{} entries must be documents",
                    operator
                ))),
            })
            .collect()
    }

    /// Check whether `doc` satisfies the filter.
    pub(crate) fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Self::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Self::Nor(clauses) => !clauses.iter().any(|c| c.matches(doc)),
            Self::Field { key, conditions } => {
                let value = doc.get(key);
                conditions.iter().all(|c| c.matches(value))
            }
        }
    }
}

fn compile_conditions(key: &str, value: &Bson) -> BackendResult<Vec<Condition>> {
    let operators = match value {
        Bson::Document(doc) if doc.keys().any(|k| k.starts_with('$')) => doc,
        Bson::RegularExpression(regex) => {
            return Ok(vec![Condition::Regex(compile_regex(&regex.pattern, &regex.options)?)]);
        }
        other => return Ok(vec![Condition::Eq(other.clone())]),
    };

    if operators.keys().any(|k| !k.starts_with('$')) {
        return Err(BackendError::invalid_filter(format!(
            "cannot mix operators and fields in the condition on '{}'",
            key
        )));
    }

    let mut conditions = Vec::with_capacity(operators.len());
    for (operator, operand) in operators {
        let condition = match operator.as_str() {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$gt" => Condition::Gt(operand.clone()),
            "$gte" => Condition::Gte(operand.clone()),
            "$lt" => Condition::Lt(operand.clone()),
            "$lte" => Condition::Lte(operand.clone()),
            "$in" => Condition::In(expect_array(operator, operand)?),
            "$nin" => Condition::Nin(expect_array(operator, operand)?),
            "$exists" => Condition::Exists(truthy(operand)),
            "$regex" => {
                let options = match operators.get("$options") {
                    None => "",
                    Some(Bson::String(options)) => options.as_str(),
                    Some(_) => {
                        return Err(BackendError::invalid_filter("$options must be a string"));
                    }
                };
                match operand {
                    Bson::String(pattern) => Condition::Regex(compile_regex(pattern, options)?),
                    Bson::RegularExpression(regex) => {
                        Condition::Regex(compile_regex(&regex.pattern, &regex.options)?)
                    }
                    _ => return Err(BackendError::invalid_filter("$regex has to be a string")),
                }
            }
            "$options" => {
                if !operators.contains_key("$regex") {
                    return Err(BackendError::invalid_filter("$options needs a $regex"));
                }
                continue;
            }
            unknown => {
                return Err(BackendError::invalid_filter(format!(
                    "unknown operator: {}",
                    unknown
                )));
            }
        };
        conditions.push(condition);
    }

    Ok(conditions)
}

fn expect_array(operator: &str, operand: &Bson) -> BackendResult<Vec<Bson>> {
    match operand {
        Bson::Array(values) => Ok(values.clone()),
        _ => Err(BackendError::invalid_filter(format!(
            "{} needs an array",
            operator
        ))),
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null => false,
        other => as_f64(other).is_none_or(|n| n != 0.0),
    }
}

fn compile_regex(pattern: &str, options: &str) -> BackendResult<Regex> {
    let mut flags = String::new();
    for option in options.chars() {
        match option {
            'i' | 'm' | 's' | 'x' => flags.push(option),
            other => {
                return Err(BackendError::invalid_filter(format!(
                    "invalid regex option: {}",
                    other
                )));
            }
        }
    }

    let source = if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", flags, pattern)
    };

    Regex::new(&source)
        .map_err(|e| BackendError::invalid_filter(format!("invalid regex '{}': {}", pattern, e)))
}

impl Condition {
    fn matches(&self, value: Option<&Bson>) -> bool {
        // A missing field compares equal to null.
        let or_null = value.unwrap_or(&Bson::Null);
        match self {
            Self::Eq(expected) => values_equal(or_null, expected),
            Self::Ne(expected) => !values_equal(or_null, expected),
            Self::In(options) => options.iter().any(|o| values_equal(or_null, o)),
            Self::Nin(options) => !options.iter().any(|o| values_equal(or_null, o)),
            Self::Exists(expected) => value.is_some() == *expected,
            Self::Gt(bound) => compare_present(value, bound, |o| o == Ordering::Greater),
            Self::Gte(bound) => compare_present(value, bound, |o| o != Ordering::Less),
            Self::Lt(bound) => compare_present(value, bound, |o| o == Ordering::Less),
            Self::Lte(bound) => compare_present(value, bound, |o| o != Ordering::Greater),
            Self::Regex(regex) => match value {
                Some(Bson::String(s)) => regex.is_match(s),
                _ => false,
            },
        }
    }
}

fn compare_present(value: Option<&Bson>, bound: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    value
        .and_then(|v| compare(v, bound))
        .is_some_and(accept)
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Order two values of the same BSON type; mixed types never compare.
fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
