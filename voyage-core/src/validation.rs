//! Field-level checks shared by the recorder and the gateway.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Returns the trimmed value or a validation error naming the missing field.
pub fn required_str(value: Option<&str>, field: &str) -> CoreResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::Validation(format!("'{}' is required", field))),
    }
}

/// Three ASCII letters, upper-cased on the way out.
pub fn normalize_currency(value: &str) -> CoreResult<String> {
    let code = value.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::Validation(format!(
            "'currency' must be a 3-letter code, got '{}'",
            value
        )));
    }
    Ok(code.to_ascii_uppercase())
}

pub fn non_negative_amount(value: f64, field: &str) -> CoreResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "'{}' must be a non-negative number",
            field
        )));
    }
    Ok(value)
}

pub fn positive_amount(value: f64, field: &str) -> CoreResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CoreError::Validation(format!(
            "'{}' must be greater than zero",
            field
        )));
    }
    Ok(value)
}

/// Opaque client blobs: absent or null becomes `{}`, a string holding JSON is
/// parsed, anything else is kept as sent.
pub fn opaque_json(value: Option<Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
            _ => Value::String(s),
        },
        Some(other) => other,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

/// Accepts `12500`, `12500.0` or `"12500"`. Unparseable strings become NaN so
/// the amount checks above reject them with a field-specific message.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => None,
        Some(NumberOrString::String(s)) => Some(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
    })
}
