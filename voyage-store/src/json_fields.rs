use serde::Deserialize;
use serde_json::Value;

/// How opaque JSON attributes (`trip_plan`, `metadata`, `contact_info`,
/// `details`) are laid out in a document.
///
/// `Serialized` writes them as JSON strings, which is what the existing
/// collections hold, and reads either layout. `Native` writes values as-is
/// and returns them untouched, so a string stays a string.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JsonFieldMode {
    #[default]
    Serialized,
    Native,
}

impl JsonFieldMode {
    pub fn encode(&self, value: &Value) -> Value {
        match self {
            JsonFieldMode::Serialized => Value::String(value.to_string()),
            JsonFieldMode::Native => value.clone(),
        }
    }

    pub fn decode(&self, stored: Value) -> Value {
        match (self, stored) {
            // Anything we wrote is valid JSON; a bare string is a legacy row.
            (JsonFieldMode::Serialized, Value::String(s)) => {
                serde_json::from_str(&s).unwrap_or(Value::String(s))
            }
            (_, other) => other,
        }
    }
}
