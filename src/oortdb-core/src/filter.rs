//! Metadata and document-content filters.
//!
//! Filters use the service's operator syntax: a bare `{key: value}` object
//! is equality shorthand, `$`-prefixed keys are operators, and `$and`/`$or`
//! combine sub-filters. The structures serialize straight onto the wire;
//! the server is the authority on filter semantics. Local evaluation exists
//! so filter shape can be validated before a call and so an in-process
//! backend can honor the same contract in tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Metadata, ValidationError};

const COMPARISON_OPS: &[&str] = &["$eq", "$ne", "$gt", "$gte", "$lt", "$lte", "$in", "$nin"];

/// Metadata filter (`where` clause of a find call)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Where(Value);

impl Where {
    /// Equality shorthand: `{key: value}`
    pub fn eq(key: &str, value: impl Into<Value>) -> Self {
        Self(object([(key, value.into())]))
    }

    pub fn ne(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$ne", value.into())
    }

    pub fn gt(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$gt", value.into())
    }

    pub fn gte(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$gte", value.into())
    }

    pub fn lt(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$lt", value.into())
    }

    pub fn lte(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$lte", value.into())
    }

    pub fn is_in(key: &str, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::op(key, "$in", Value::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in(key: &str, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::op(key, "$nin", Value::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn and(clauses: impl IntoIterator<Item = Where>) -> Self {
        Self(object([(
            "$and",
            Value::Array(clauses.into_iter().map(|clause| clause.0).collect()),
        )]))
    }

    pub fn or(clauses: impl IntoIterator<Item = Where>) -> Self {
        Self(object([(
            "$or",
            Value::Array(clauses.into_iter().map(|clause| clause.0).collect()),
        )]))
    }

    /// Escape hatch for operator combinations the constructors don't cover
    pub fn raw(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_where(&self.0)
    }

    /// Whether the given metadata satisfies this filter
    pub fn matches(&self, metadata: &Metadata) -> bool {
        eval_where(&self.0, metadata)
    }
}

/// Document-content filter (`where_document` clause of a find call)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhereDocument(Value);

impl WhereDocument {
    pub fn contains(text: impl Into<String>) -> Self {
        Self(object([("$contains", Value::String(text.into()))]))
    }

    pub fn not_contains(text: impl Into<String>) -> Self {
        Self(object([("$not_contains", Value::String(text.into()))]))
    }

    pub fn and(clauses: impl IntoIterator<Item = WhereDocument>) -> Self {
        Self(object([(
            "$and",
            Value::Array(clauses.into_iter().map(|clause| clause.0).collect()),
        )]))
    }

    pub fn or(clauses: impl IntoIterator<Item = WhereDocument>) -> Self {
        Self(object([(
            "$or",
            Value::Array(clauses.into_iter().map(|clause| clause.0).collect()),
        )]))
    }

    pub fn raw(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_where_document(&self.0)
    }

    /// Whether the given document text satisfies this filter
    pub fn matches(&self, document: &str) -> bool {
        eval_where_document(&self.0, document)
    }
}

impl Where {
    fn op(key: &str, operator: &str, value: Value) -> Self {
        Self(object([(key, object([(operator, value)]))]))
    }
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let mut map = serde_json::Map::new();
    for (key, value) in entries {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

fn eval_where(filter: &Value, metadata: &Metadata) -> bool {
    let Value::Object(clauses) = filter else {
        return false;
    };

    clauses.iter().all(|(key, expected)| match key.as_str() {
        "$and" => expected
            .as_array()
            .is_some_and(|subs| subs.iter().all(|sub| eval_where(sub, metadata))),
        "$or" => expected
            .as_array()
            .is_some_and(|subs| subs.iter().any(|sub| eval_where(sub, metadata))),
        _ => eval_field(metadata.get(key), expected),
    })
}

fn eval_field(actual: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Object(ops) => ops
            .iter()
            .all(|(op, operand)| eval_comparison(actual, op, operand)),
        _ => actual == Some(expected),
    }
}

fn eval_comparison(actual: Option<&Value>, op: &str, operand: &Value) -> bool {
    match op {
        "$eq" => actual == Some(operand),
        "$ne" => actual != Some(operand),
        "$gt" => ordered(actual, operand).is_some_and(|(a, b)| a > b),
        "$gte" => ordered(actual, operand).is_some_and(|(a, b)| a >= b),
        "$lt" => ordered(actual, operand).is_some_and(|(a, b)| a < b),
        "$lte" => ordered(actual, operand).is_some_and(|(a, b)| a <= b),
        "$in" => operand
            .as_array()
            .is_some_and(|allowed| actual.is_some_and(|value| allowed.contains(value))),
        "$nin" => operand
            .as_array()
            .is_some_and(|denied| actual.is_none_or(|value| !denied.contains(value))),
        _ => false,
    }
}

/// Ordered comparisons are numeric only; anything else never matches
fn ordered(actual: Option<&Value>, operand: &Value) -> Option<(f64, f64)> {
    Some((actual?.as_f64()?, operand.as_f64()?))
}

fn eval_where_document(filter: &Value, document: &str) -> bool {
    let Value::Object(clauses) = filter else {
        return false;
    };

    clauses.iter().all(|(op, operand)| match op.as_str() {
        "$contains" => operand
            .as_str()
            .is_some_and(|needle| document.contains(needle)),
        "$not_contains" => operand
            .as_str()
            .is_some_and(|needle| !document.contains(needle)),
        "$and" => operand
            .as_array()
            .is_some_and(|subs| subs.iter().all(|sub| eval_where_document(sub, document))),
        "$or" => operand
            .as_array()
            .is_some_and(|subs| subs.iter().any(|sub| eval_where_document(sub, document))),
        _ => false,
    })
}

fn validate_where(filter: &Value) -> Result<(), ValidationError> {
    let Value::Object(clauses) = filter else {
        return Err(ValidationError::Filter(
            "filter root must be an object".to_string(),
        ));
    };
    if clauses.is_empty() {
        return Err(ValidationError::Filter("filter is empty".to_string()));
    }

    for (key, expected) in clauses {
        match key.as_str() {
            "$and" | "$or" => validate_subfilters(key, expected, validate_where)?,
            key if key.starts_with('$') => {
                return Err(ValidationError::Filter(format!("unknown operator {}", key)));
            }
            _ => validate_field(key, expected)?,
        }
    }
    Ok(())
}

fn validate_field(key: &str, expected: &Value) -> Result<(), ValidationError> {
    let Value::Object(ops) = expected else {
        // equality shorthand
        return Ok(());
    };
    for (op, operand) in ops {
        if !COMPARISON_OPS.contains(&op.as_str()) {
            return Err(ValidationError::Filter(format!(
                "unknown operator {} for field {}",
                op, key
            )));
        }
        if matches!(op.as_str(), "$in" | "$nin") && !operand.is_array() {
            return Err(ValidationError::Filter(format!(
                "{} for field {} requires an array",
                op, key
            )));
        }
    }
    Ok(())
}

fn validate_where_document(filter: &Value) -> Result<(), ValidationError> {
    let Value::Object(clauses) = filter else {
        return Err(ValidationError::Filter(
            "document filter root must be an object".to_string(),
        ));
    };
    if clauses.is_empty() {
        return Err(ValidationError::Filter(
            "document filter is empty".to_string(),
        ));
    }

    for (op, operand) in clauses {
        match op.as_str() {
            "$contains" | "$not_contains" => {
                if !operand.is_string() {
                    return Err(ValidationError::Filter(format!(
                        "{} requires a string operand",
                        op
                    )));
                }
            }
            "$and" | "$or" => validate_subfilters(op, operand, validate_where_document)?,
            other => {
                return Err(ValidationError::Filter(format!(
                    "unknown document operator {}",
                    other
                )));
            }
        }
    }
    Ok(())
}

fn validate_subfilters(
    op: &str,
    operand: &Value,
    validate: fn(&Value) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    let subs = operand
        .as_array()
        .ok_or_else(|| ValidationError::Filter(format!("{} requires an array", op)))?;
    if subs.is_empty() {
        return Err(ValidationError::Filter(format!("{} must not be empty", op)));
    }
    subs.iter().try_for_each(validate)
}
