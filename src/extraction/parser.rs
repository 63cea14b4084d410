// src/extraction/parser.rs
use serde_json::Value;

use crate::errors::ParseError;
use crate::types::JobPosting;

/// Strictly parses the model's text as a JSON object.
///
/// No cleanup is attempted: prose around the JSON or markdown fences make the
/// whole response invalid, and the raw text travels with the error.
pub fn parse(raw: &str) -> Result<JobPosting, ParseError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(JobPosting::from_map(map)),
        Ok(other) => Err(ParseError {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
            raw: raw.to_string(),
        }),
        Err(e) => Err(ParseError {
            message: e.to_string(),
            raw: raw.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
