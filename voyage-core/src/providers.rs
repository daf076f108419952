//! Seams to the external services the gateway proxies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::search::{
    Coordinates, FlightOffer, FlightQuery, HotelDetails, HotelDetailsQuery, HotelOffer, HotelQuery,
};
use crate::CoreResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model", alias = "bot")]
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Language code the reply should be written in.
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub trip_plan: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionMetadata {
    pub language: String,
    /// Seconds, end of the last segment.
    pub duration: f64,
    pub segments: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    pub metadata: TranscriptionMetadata,
}

#[async_trait]
pub trait ChatAssistant: Send + Sync {
    async fn reply(&self, request: &ChatRequest) -> CoreResult<ChatReply>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`; detects the source language when none is given.
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> CoreResult<Translation>;
}

#[async_trait]
pub trait FlightSearch: Send + Sync {
    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Vec<FlightOffer>>;
}

#[async_trait]
pub trait HotelSearch: Send + Sync {
    async fn search_hotels(&self, query: &HotelQuery) -> CoreResult<Vec<HotelOffer>>;

    async fn hotel_details(&self, query: &HotelDetailsQuery) -> CoreResult<HotelDetails>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> CoreResult<Option<Coordinates>>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns `audio/mpeg` bytes.
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> CoreResult<Vec<u8>>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], language: Option<&str>) -> CoreResult<Transcription>;
}
