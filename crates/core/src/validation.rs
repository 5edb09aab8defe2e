//! Client-side form schemas.
//!
//! Create and update payloads are checked here before the console issues any
//! network call. A failed check never reaches the backend.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// A single constraint on a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Field must be present, non-null and not blank.
    Required,
    /// Field must be a number or a string that parses as one.
    Numeric,
    /// Field must be JSON: an object/array, or a string holding valid JSON.
    Json,
    /// String field must not exceed this many characters.
    MaxLength(usize),
}

/// Rules attached to one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

/// Whether the payload is a full form or a partial patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// All rules apply; missing required fields fail.
    Create,
    /// Only fields present in the payload are checked.
    Patch,
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every violation found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Single-field error, used for checks outside a schema.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Check a payload against a schema.
///
/// # Errors
///
/// Returns every violated rule, in schema order.
pub fn validate(
    schema: &[FieldRule],
    payload: &Map<String, Value>,
    mode: ValidationMode,
) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for field_rule in schema {
        let value = payload.get(field_rule.field);
        if mode == ValidationMode::Patch && value.is_none() {
            continue;
        }

        for rule in field_rule.rules {
            if let Some(message) = check(*rule, value) {
                errors.push(FieldError {
                    field: field_rule.field.to_string(),
                    message,
                });
                // First failure per field is enough for a form hint.
                break;
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn check(rule: Rule, value: Option<&Value>) -> Option<String> {
    if rule == Rule::Required {
        return is_blank(value).then(|| "is required".to_string());
    }
    // Optional fields that are absent satisfy every other rule.
    if is_blank(value) {
        return None;
    }

    match (rule, value?) {
        (Rule::Numeric, Value::Number(_)) | (Rule::Json, Value::Object(_) | Value::Array(_)) => {
            None
        }
        (Rule::Numeric, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .is_err()
            .then(|| "must be a number".to_string()),
        (Rule::Numeric, _) => Some("must be a number".to_string()),
        (Rule::Json, Value::String(s)) => serde_json::from_str::<Value>(s)
            .is_err()
            .then(|| "must be valid JSON".to_string()),
        (Rule::Json, _) => Some("must be valid JSON".to_string()),
        (Rule::MaxLength(max), Value::String(s)) => (s.chars().count() > max)
            .then(|| format!("must be at most {max} characters")),
        (Rule::MaxLength(_) | Rule::Required, _) => None,
    }
}
