//! Query predicates understood by the document store.

use serde_json::{json, Value};

/// One predicate, ordering or pagination clause of a list call.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Value),
    GreaterThanEqual(String, Value),
    LessThan(String, Value),
    OrderAsc(String),
    OrderDesc(String),
    Limit(u32),
    Offset(u32),
}

impl Query {
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Query::Equal(field.to_string(), value.into())
    }

    pub fn greater_than_equal(field: &str, value: impl Into<Value>) -> Self {
        Query::GreaterThanEqual(field.to_string(), value.into())
    }

    pub fn less_than(field: &str, value: impl Into<Value>) -> Self {
        Query::LessThan(field.to_string(), value.into())
    }

    pub fn order_asc(field: &str) -> Self {
        Query::OrderAsc(field.to_string())
    }

    pub fn order_desc(field: &str) -> Self {
        Query::OrderDesc(field.to_string())
    }

    pub fn limit(n: u32) -> Self {
        Query::Limit(n)
    }

    pub fn offset(n: u32) -> Self {
        Query::Offset(n)
    }

    /// Serialize to the backend's JSON query syntax.
    pub fn to_json_string(&self) -> String {
        let value = match self {
            Query::Equal(field, v) => {
                json!({ "method": "equal", "attribute": field, "values": as_values(v) })
            }
            Query::GreaterThanEqual(field, v) => {
                json!({ "method": "greaterThanEqual", "attribute": field, "values": as_values(v) })
            }
            Query::LessThan(field, v) => {
                json!({ "method": "lessThan", "attribute": field, "values": as_values(v) })
            }
            Query::OrderAsc(field) => json!({ "method": "orderAsc", "attribute": field }),
            Query::OrderDesc(field) => json!({ "method": "orderDesc", "attribute": field }),
            Query::Limit(n) => json!({ "method": "limit", "values": [n] }),
            Query::Offset(n) => json!({ "method": "offset", "values": [n] }),
        };
        value.to_string()
    }
}

fn as_values(value: &Value) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        other => Value::Array(vec![other.clone()]),
    }
}
