use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

pub(crate) fn client(timeout: Duration) -> ProviderResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Body of a successful response as JSON; anything else becomes `Upstream`.
pub(crate) async fn read_json(service: &'static str, response: Response) -> ProviderResult<Value> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<Value>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Upstream {
        service,
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pulls a human message out of the usual `{"error": ...}` shapes.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return body.chars().take(200).collect(),
    };
    let candidates = [
        &parsed["error"]["message"],
        &parsed["error"],
        &parsed["detail"]["message"],
        &parsed["detail"],
        &parsed["message"],
    ];
    candidates
        .iter()
        .find_map(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

pub(crate) fn str_of(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
