//! Clients for the third-party services behind the travel assistant:
//! Gemini (chat and translation), SerpApi (flights and hotels), Google Maps
//! geocoding, ElevenLabs speech synthesis and whisper.cpp transcription.

pub mod elevenlabs;
pub mod error;
pub mod gemini;
mod http;
pub mod maps;
pub mod serpapi;
pub mod whisper;

pub use elevenlabs::ElevenLabsClient;
pub use error::{ProviderError, ProviderResult};
pub use gemini::GeminiClient;
pub use maps::MapsGeocoder;
pub use serpapi::SerpApiClient;
pub use whisper::WhisperTranscriber;
