use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use voyage_core::providers::{ChatMessage, ChatRequest, TranscriptionMetadata};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::speech::read_audio_form;
use crate::state::AppState;

const DEFAULT_LANGUAGE: &str = "en";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat-text", post(chat_text))
        .route("/api/chat-voice", post(chat_voice))
}

#[derive(Debug, Deserialize)]
struct ChatTextRequest {
    message: Option<String>,
    #[serde(default)]
    history: Vec<ChatMessage>,
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTextResponse {
    reply: String,
    trip_plan: Option<Value>,
    language: String,
}

async fn chat_text(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChatTextRequest>,
) -> Result<Json<ChatTextResponse>, AppError> {
    let message = req.message.unwrap_or_default().trim().to_string();
    if message.is_empty() {
        return Err(AppError::ValidationError("'message' is required".to_string()));
    }
    let language = req
        .language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let reply = state
        .providers
        .chat
        .reply(&ChatRequest {
            message,
            history: req.history,
            language: Some(language.clone()),
        })
        .await?;

    Ok(Json(ChatTextResponse {
        reply: reply.reply,
        trip_plan: reply.trip_plan,
        language,
    }))
}

#[derive(Debug, Serialize)]
struct ChatVoiceResponse {
    transcript: String,
    reply: String,
    trip_plan: Option<Value>,
    transcription: TranscriptionMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_base64: Option<String>,
}

/// Transcribe, answer, and optionally speak the answer back.
async fn chat_voice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ChatVoiceResponse>, AppError> {
    let form = read_audio_form(multipart).await?;

    let transcription = state
        .providers
        .transcriber
        .transcribe(&form.audio, form.language.as_deref())
        .await?;
    let transcript = transcription.text.trim().to_string();
    if transcript.is_empty() {
        return Err(AppError::ValidationError("No speech detected in audio".to_string()));
    }

    let language = form
        .language
        .clone()
        .unwrap_or_else(|| transcription.metadata.language.clone());
    let reply = state
        .providers
        .chat
        .reply(&ChatRequest {
            message: transcript.clone(),
            history: form.history,
            language: Some(language),
        })
        .await?;

    // A failed synthesis still returns the text reply.
    let audio_base64 = if form.speak {
        match state.providers.speech.synthesize(&reply.reply, None).await {
            Ok(audio) => Some(STANDARD.encode(audio)),
            Err(e) => {
                warn!("Skipping spoken reply: {}", e);
                None
            }
        }
    } else {
        None
    };

    info!(
        "Voice chat: {} chars in, {} chars out, spoken={}",
        transcript.len(),
        reply.reply.len(),
        audio_base64.is_some()
    );
    Ok(Json(ChatVoiceResponse {
        transcript,
        reply: reply.reply,
        trip_plan: reply.trip_plan,
        transcription: transcription.metadata,
        audio_base64,
    }))
}
