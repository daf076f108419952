use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use voyage_core::providers::SpeechSynthesizer;
use voyage_core::CoreResult;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{client, error_message};

const SERVICE: &str = "elevenlabs";
pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";

/// Longest text sent in one synthesis request, in characters.
pub const MAX_TTS_CHARS: usize = 5000;

const TTS_MODEL: &str = "eleven_multilingual_v2";

/// ElevenLabs text-to-speech client. Produces `audio/mpeg`.
#[derive(Clone)]
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    default_voice_id: String,
    base_url: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: Option<String>, default_voice_id: &str, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: client(timeout)?,
            api_key: api_key.filter(|k| !k.is_empty()),
            default_voice_id: default_voice_id.to_string(),
            base_url: ELEVENLABS_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn request_audio(&self, text: &str, voice_id: &str) -> ProviderResult<Vec<u8>> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured(SERVICE))?;

        let response = self
            .http
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, voice_id))
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": TTS_MODEL,
                "voice_settings": {"stability": 0.5, "similarity_boost": 0.75},
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> CoreResult<Vec<u8>> {
        let text = prepare_text(text)?;
        let voice_id = voice_id
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(self.default_voice_id.as_str());

        let audio = self.request_audio(&text, voice_id).await?;
        debug!(voice_id, chars = text.chars().count(), bytes = audio.len(), "Synthesized speech");
        Ok(audio)
    }
}

/// Trims and caps the text; empty input is rejected.
pub fn prepare_text(text: &str) -> ProviderResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::InvalidInput("'text' is required".to_string()));
    }
    if text.chars().count() > MAX_TTS_CHARS {
        warn!("Truncating {} characters of speech text to {}", text.chars().count(), MAX_TTS_CHARS);
        return Ok(text.chars().take(MAX_TTS_CHARS).collect());
    }
    Ok(text.to_string())
}
