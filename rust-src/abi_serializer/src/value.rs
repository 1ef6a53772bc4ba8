//! Input values for packing. JSON is parsed once into an [AbiValue], keeping
//! numbers as their literal text and remembering whether a scalar was quoted,
//! so that each primitive decides which JSON forms it accepts.
use crate::error::*;
use serde_json::Value;

/// Text of a JSON scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarText {
    pub text:   String,
    /// Whether the scalar was a JSON string.
    pub quoted: bool,
}

impl ScalarText {
    pub fn quoted(text: impl Into<String>) -> Self {
        ScalarText {
            text:   text.into(),
            quoted: true,
        }
    }

    pub fn bare(text: impl Into<String>) -> Self {
        ScalarText {
            text:   text.into(),
            quoted: false,
        }
    }

    /// The text regardless of how it was written.
    pub fn literal(&self) -> &str { &self.text }

    /// The text, which must have been a JSON string.
    pub fn string(&self, ty: &str) -> ParseResult<&str> {
        if !self.quoted {
            return Err(AbiError::format(ty, self.text.as_str(), "expected a JSON string"));
        }
        Ok(&self.text)
    }
}

/// Tree of values to pack. Object fields keep their input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Scalar(ScalarText),
    Object(Vec<(String, AbiValue)>),
    Array(Vec<AbiValue>),
}

impl AbiValue {
    /// Parse JSON text. Any JSON is accepted here; the shape is checked
    /// against the schema while packing.
    pub fn from_json_slice(bytes: &[u8]) -> ParseResult<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(AbiError::MalformedArguments)?;
        Ok(AbiValue::from(value))
    }

    pub fn get(&self, field: &str) -> Option<&AbiValue> {
        match self {
            AbiValue::Object(fields) => {
                fields.iter().find(|(name, _)| name == field).map(|(_, value)| value)
            }
            _ => None,
        }
    }

    /// Short rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            AbiValue::Scalar(s) if s.quoted => format!("\"{}\"", s.text),
            AbiValue::Scalar(s) => s.text.clone(),
            AbiValue::Object(_) => "a JSON object".into(),
            AbiValue::Array(_) => "a JSON array".into(),
        }
    }
}

/// Objects parsed by serde_json have unique keys; with duplicate keys in the
/// input the last occurrence wins.
impl From<Value> for AbiValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AbiValue::Scalar(ScalarText::bare("null")),
            Value::Bool(b) => AbiValue::Scalar(ScalarText::bare(b.to_string())),
            Value::Number(n) => AbiValue::Scalar(ScalarText::bare(n.to_string())),
            Value::String(s) => AbiValue::Scalar(ScalarText::quoted(s)),
            Value::Array(items) => AbiValue::Array(items.into_iter().map(AbiValue::from).collect()),
            Value::Object(fields) => AbiValue::Object(
                fields.into_iter().map(|(name, value)| (name, AbiValue::from(value))).collect(),
            ),
        }
    }
}

impl From<&str> for AbiValue {
    fn from(s: &str) -> Self { AbiValue::Scalar(ScalarText::quoted(s)) }
}
