//! Attribute values and their TypeQL literal rendering.

use crate::error::QueryError;
use serde_json::Value;

/// Type tags whose values are written as bare numbers.
pub const NUMERIC_TYPES: [&str; 3] = ["double", "long", "int"];

/// Type tag used by `has` when none is given.
pub const DEFAULT_TYPE: &str = "string";

/// A single attribute value.
///
/// The rendering style is fixed when the value is created: numeric values are
/// emitted bare, everything else is emitted inside double quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Quoted literal (`string` and any non-numeric type tag).
    Text(String),
    /// Bare literal (`double`, `long`, `int`).
    Numeric(String),
}

impl AttributeValue {
    /// Create a quoted text value.
    pub fn text(value: impl Into<String>) -> Self {
        AttributeValue::Text(value.into())
    }

    /// Create a bare numeric value.
    pub fn numeric(value: impl ToString) -> Self {
        AttributeValue::Numeric(value.to_string())
    }

    /// Create a value from its textual form and a type tag.
    pub fn typed(value: impl ToString, value_type: &str) -> Self {
        if is_numeric_type(value_type) {
            AttributeValue::Numeric(value.to_string())
        } else {
            AttributeValue::Text(value.to_string())
        }
    }

    /// The raw value without quoting.
    pub fn as_str(&self) -> &str {
        match self {
            AttributeValue::Text(s) | AttributeValue::Numeric(s) => s,
        }
    }

    /// Render the value as a TypeQL literal.
    ///
    /// Text is wrapped in double quotes as-is. Embedded quotes are not
    /// escaped, so callers must not pass untrusted text.
    pub fn to_literal(&self) -> String {
        match self {
            AttributeValue::Text(s) => format!("\"{s}\""),
            AttributeValue::Numeric(s) => s.clone(),
        }
    }

    /// Parse one `{"value": ..., "type": ...}` entry of a `has_many` map.
    pub(crate) fn from_json(attribute: &str, entry: &Value) -> Result<Self, QueryError> {
        let object = entry.as_object().ok_or_else(|| {
            QueryError::Validation(format!(
                "values of attribute '{attribute}' must be objects with a 'value' key"
            ))
        })?;

        let raw = match object.get("value") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => {
                return Err(QueryError::Validation(format!(
                    "attribute '{attribute}' has unsupported value {other}"
                )))
            }
            None => {
                return Err(QueryError::Validation(format!(
                    "attribute '{attribute}' has an entry without 'value'"
                )))
            }
        };

        let value_type = match object.get("type") {
            None | Some(Value::Null) => DEFAULT_TYPE,
            Some(Value::String(t)) => t.as_str(),
            Some(other) => {
                return Err(QueryError::Validation(format!(
                    "attribute '{attribute}' has non-text type tag {other}"
                )))
            }
        };

        Ok(AttributeValue::typed(raw, value_type))
    }
}

/// Whether a type tag renders as a bare number.
pub fn is_numeric_type(value_type: &str) -> bool {
    NUMERIC_TYPES.contains(&value_type)
}
