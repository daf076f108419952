use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use voyage_core::providers::{ChatAssistant, ChatReply, ChatRequest, ChatRole, Translation, Translator};
use voyage_core::CoreResult;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{client, read_json};

const SERVICE: &str = "gemini";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const CHAT_PROMPT: &str = "You are Voyage, a friendly travel planning assistant. \
Help the traveller choose destinations, flights, hotels and day-by-day activities. \
Keep answers short and practical, quote prices in the traveller's currency when known, \
and never invent bookings or confirmation numbers. \
When the traveller asks for an itinerary, finish your answer with a fenced ```json block \
holding one object with the keys \"destination\", \"start_date\", \"end_date\", \
\"budget\" ({\"amount\", \"currency\"}) and \"days\" (a list of {\"day\", \"title\", \"activities\"}). \
Omit the block otherwise.";

/// Google Gemini `generateContent` client, used for chat and translation.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: &str, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: client(timeout)?,
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn generate(&self, system: &str, contents: Vec<Value>, json_output: bool) -> ProviderResult<String> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured(SERVICE))?;

        let mut body = json!({
            "systemInstruction": {"parts": [{"text": system}]},
            "contents": contents,
            "generationConfig": {"temperature": 0.7, "maxOutputTokens": 2048},
        });
        if json_output {
            body["generationConfig"]["responseMimeType"] = json!("application/json");
            body["generationConfig"]["temperature"] = json!(0.1);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http
            .post(url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;
        let value = read_json(SERVICE, response).await?;
        candidate_text(&value)
    }
}

#[async_trait]
impl ChatAssistant for GeminiClient {
    async fn reply(&self, request: &ChatRequest) -> CoreResult<ChatReply> {
        let mut system = CHAT_PROMPT.to_string();
        if let Some(language) = request.language.as_deref().filter(|l| !l.is_empty()) {
            system.push_str(&format!(" Reply in the language with code '{}'.", language));
        }

        let text = self.generate(&system, chat_contents(request), false).await?;
        let (reply, trip_plan) = extract_trip_plan(&text);
        debug!(
            history = request.history.len(),
            has_plan = trip_plan.is_some(),
            "Gemini chat reply"
        );
        Ok(ChatReply { reply, trip_plan })
    }
}

#[derive(Deserialize)]
struct TranslationBody {
    translated_text: String,
    source_language: Option<String>,
    confidence: Option<f64>,
}

#[async_trait]
impl Translator for GeminiClient {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> CoreResult<Translation> {
        let source_hint = match source_language {
            Some(source) => format!("The text is written in the language with code '{}'.", source),
            None => "Detect the language of the text first.".to_string(),
        };
        let system = format!(
            "You are a translation engine. {} Translate the user's text into the language with code '{}'. \
             Respond with a JSON object with the keys \"translated_text\", \"source_language\" \
             (an ISO 639-1 code) and \"confidence\" (0 to 1, how sure you are of the source language).",
            source_hint, target_language
        );
        let contents = vec![json!({"role": "user", "parts": [{"text": text}]})];

        let raw = self.generate(&system, contents, true).await?;
        Ok(parse_translation(&raw, target_language, source_language)?)
    }
}

/// Gemini contents for a chat turn: prior history, then the new message.
pub fn chat_contents(request: &ChatRequest) -> Vec<Value> {
    request
        .history
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| {
            let role = match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            json!({"role": role, "parts": [{"text": m.content}]})
        })
        .chain(std::iter::once(
            json!({"role": "user", "parts": [{"text": request.message}]}),
        ))
        .collect()
}

fn candidate_text(value: &Value) -> ProviderResult<String> {
    let candidate = value["candidates"]
        .get(0)
        .ok_or_else(|| match value["promptFeedback"]["blockReason"].as_str() {
            Some(reason) => ProviderError::decode(SERVICE, format!("prompt blocked: {}", reason)),
            None => ProviderError::decode(SERVICE, "no candidates"),
        })?;

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = candidate["finishReason"].as_str().unwrap_or("empty");
        return Err(ProviderError::decode(SERVICE, format!("empty candidate ({})", reason)));
    }
    Ok(text)
}

/// Splits the first fenced ```json block that holds an object out of `text`.
/// Returns the remaining reply and the parsed plan.
pub fn extract_trip_plan(text: &str) -> (String, Option<Value>) {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find("```") {
        let open = search_from + offset;
        let after_fence = open + 3;
        let Some(newline) = text[after_fence..].find('\n') else {
            break;
        };
        let info = text[after_fence..after_fence + newline].trim();
        let body_start = after_fence + newline + 1;
        let Some(close_offset) = text[body_start..].find("```") else {
            break;
        };
        let body_end = body_start + close_offset;
        let block_end = body_end + 3;

        if info.eq_ignore_ascii_case("json") {
            match serde_json::from_str::<Value>(text[body_start..body_end].trim()) {
                Ok(plan @ Value::Object(_)) => {
                    let reply = format!("{}{}", text[..open].trim_end(), text[block_end..].trim_end());
                    return (reply.trim().to_string(), Some(plan));
                }
                Ok(_) => {}
                Err(e) => warn!("Ignoring unparsable json block: {}", e),
            }
        }
        search_from = block_end;
    }
    (text.trim().to_string(), None)
}

fn parse_translation(
    raw: &str,
    target_language: &str,
    source_language: Option<&str>,
) -> ProviderResult<Translation> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let body: TranslationBody =
        serde_json::from_str(cleaned).map_err(|e| ProviderError::decode(SERVICE, e.to_string()))?;

    let detected = body
        .source_language
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let (source, confidence) = match source_language {
        Some(given) => (given.to_string(), 1.0),
        None => (detected, body.confidence.unwrap_or(0.0).clamp(0.0, 1.0)),
    };

    Ok(Translation {
        translated_text: body.translated_text,
        source_language: source,
        target_language: target_language.to_string(),
        confidence,
    })
}
