use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use voyage_core::providers::{ChatMessage, Transcription, Translation};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/text-to-speech", post(text_to_speech))
        .route("/api/speech-to-text", post(speech_to_text))
        .route("/api/translate", post(translate))
}

/// Fields of an audio upload form.
#[derive(Debug, Default)]
pub(crate) struct AudioForm {
    pub audio: Vec<u8>,
    pub language: Option<String>,
    pub history: Vec<ChatMessage>,
    pub speak: bool,
}

pub(crate) async fn read_audio_form(mut multipart: Multipart) -> Result<AudioForm, AppError> {
    let mut form = AudioForm::default();
    let mut has_audio = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                form.audio = field.bytes().await?.to_vec();
                has_audio = true;
            }
            "language" => {
                let language = field.text().await?.trim().to_string();
                form.language = Some(language).filter(|l| !l.is_empty());
            }
            "history" => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    form.history = serde_json::from_str(&raw)
                        .map_err(|e| AppError::ValidationError(format!("'history' is not valid JSON: {}", e)))?;
                }
            }
            "speak" => {
                let value = field.text().await?;
                form.speak = matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");
            }
            _ => {}
        }
    }

    if !has_audio {
        return Err(AppError::ValidationError("'audio' file is required".to_string()));
    }
    Ok(form)
}

#[derive(Debug, Deserialize)]
struct SpeechRequest {
    text: Option<String>,
    voice_id: Option<String>,
}

async fn text_to_speech(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SpeechRequest>,
) -> Result<impl IntoResponse, AppError> {
    let text = req.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AppError::ValidationError("'text' is required".to_string()));
    }
    let audio = state
        .providers
        .speech
        .synthesize(&text, req.voice_id.as_deref())
        .await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}

async fn speech_to_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Transcription>, AppError> {
    let form = read_audio_form(multipart).await?;
    let transcription = state
        .providers
        .transcriber
        .transcribe(&form.audio, form.language.as_deref())
        .await?;

    info!(
        "Transcribed {} bytes ({} segments)",
        form.audio.len(),
        transcription.metadata.segments
    );
    Ok(Json(transcription))
}

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    text: Option<String>,
    #[serde(alias = "target")]
    target_language: Option<String>,
    #[serde(alias = "source")]
    source_language: Option<String>,
}

async fn translate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TranslateRequest>,
) -> Result<Json<Translation>, AppError> {
    let text = req.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AppError::ValidationError("'text' is required".to_string()));
    }
    let target = req
        .target_language
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::ValidationError("'target_language' is required".to_string()))?;
    let source = req
        .source_language
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "auto");

    let translation = state
        .providers
        .translator
        .translate(&text, &target, source.as_deref())
        .await?;
    Ok(Json(translation))
}
