use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use voyage_core::providers::{Transcriber, Transcription, TranscriptionMetadata};
use voyage_core::CoreResult;

use crate::error::{ProviderError, ProviderResult};

const SERVICE: &str = "whisper";

/// Maximum audio upload accepted for transcription (10 MiB).
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(120);

/// Speech-to-text through a local whisper.cpp binary.
///
/// Browser uploads arrive as webm, which whisper.cpp cannot read, so each
/// upload is first converted to 16 kHz mono wav with ffmpeg.
///
/// The model file is located on first use and remembered; a missing model
/// fails that request and is looked up again on the next one.
#[derive(Debug)]
pub struct WhisperTranscriber {
    binary: PathBuf,
    ffmpeg: PathBuf,
    model: String,
    models_dir: PathBuf,
    model_path: OnceCell<PathBuf>,
}

impl WhisperTranscriber {
    pub fn new(binary: impl Into<PathBuf>, model: &str, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ffmpeg: PathBuf::from("ffmpeg"),
            model: model.to_string(),
            models_dir: models_dir.into(),
            model_path: OnceCell::new(),
        }
    }

    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    async fn model_path(&self) -> ProviderResult<&Path> {
        let path = self
            .model_path
            .get_or_try_init(|| async {
                for candidate in model_candidates(&self.model, &self.models_dir) {
                    if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                        info!("Using whisper model {}", candidate.display());
                        return Ok(candidate);
                    }
                }
                Err(ProviderError::Process(format!(
                    "whisper model '{}' not found in {}",
                    self.model,
                    self.models_dir.display()
                )))
            })
            .await?;
        Ok(path.as_path())
    }

    async fn run(&self, audio: &[u8], language: Option<&str>) -> ProviderResult<Transcription> {
        check_audio(audio)?;
        let model = self.model_path().await?;

        // Removed with everything in it when `workdir` drops.
        let workdir = tempfile::tempdir()?;
        let upload = workdir.path().join("upload.webm");
        let wav = workdir.path().join("upload.wav");
        let output_prefix = workdir.path().join("transcript");
        tokio::fs::write(&upload, audio).await?;

        let mut convert = Command::new(&self.ffmpeg);
        convert
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&upload)
            .args(["-ar", "16000", "-ac", "1", "-f", "wav"])
            .arg(&wav);
        run_tool("ffmpeg", &self.ffmpeg, convert).await?;

        let mut transcribe = Command::new(&self.binary);
        transcribe
            .arg("-m")
            .arg(model)
            .arg("-f")
            .arg(&wav)
            .arg("-l")
            .arg(language.filter(|l| !l.is_empty()).unwrap_or("auto"))
            .arg("-oj")
            .arg("-of")
            .arg(&output_prefix)
            .arg("-np");
        run_tool("whisper", &self.binary, transcribe).await?;

        let raw = tokio::fs::read_to_string(output_prefix.with_extension("json")).await?;
        parse_output(&raw)
    }
}

/// Runs one external step under the shared timeout; the child is killed if it overruns.
async fn run_tool(name: &str, binary: &Path, mut command: Command) -> ProviderResult<()> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(TRANSCRIBE_TIMEOUT, command.output())
        .await
        .map_err(|_| {
            ProviderError::Process(format!(
                "{} timed out after {} seconds",
                name,
                TRANSCRIBE_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| ProviderError::Process(format!("Failed to spawn {}: {}", binary.display(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProviderError::Process(format!("{} failed: {}", name, stderr.trim())));
    }
    Ok(())
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8], language: Option<&str>) -> CoreResult<Transcription> {
        let transcription = self.run(audio, language).await?;
        debug!(
            bytes = audio.len(),
            language = %transcription.metadata.language,
            segments = transcription.metadata.segments,
            "Transcribed audio"
        );
        Ok(transcription)
    }
}

pub fn check_audio(audio: &[u8]) -> ProviderResult<()> {
    if audio.is_empty() {
        return Err(ProviderError::InvalidInput("'audio' is empty".to_string()));
    }
    if audio.len() > MAX_AUDIO_BYTES {
        return Err(ProviderError::InvalidInput(format!(
            "audio exceeds maximum size: {} bytes (limit: {} bytes)",
            audio.len(),
            MAX_AUDIO_BYTES
        )));
    }
    Ok(())
}

/// `model` is either a path to a model file or a size name such as `tiny`.
pub fn model_candidates(model: &str, models_dir: &Path) -> Vec<PathBuf> {
    if model.ends_with(".bin") || model.contains(std::path::MAIN_SEPARATOR) {
        return vec![PathBuf::from(model)];
    }
    vec![
        models_dir.join(format!("ggml-{}.bin", model)),
        models_dir.join(format!("{}.bin", model)),
    ]
}

struct Segment {
    text: String,
    end_seconds: f64,
    no_speech_prob: Option<f64>,
}

/// Mean of `1 - no_speech_prob` over the segments that report it.
pub fn confidence(no_speech_probs: &[Option<f64>]) -> f64 {
    let known: Vec<f64> = no_speech_probs.iter().flatten().map(|p| 1.0 - p).collect();
    if known.is_empty() {
        return 0.0;
    }
    known.iter().sum::<f64>() / known.len() as f64
}

/// Parses whisper JSON output. Accepts whisper.cpp's `-oj` layout
/// (`transcription[]` with millisecond offsets) and the reference CLI's
/// layout (`segments[]` with second timestamps).
pub fn parse_output(raw: &str) -> ProviderResult<Transcription> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ProviderError::decode(SERVICE, e.to_string()))?;

    let (segments, language, full_text) = if let Some(items) = value["transcription"].as_array() {
        let segments = items
            .iter()
            .map(|s| Segment {
                text: s["text"].as_str().unwrap_or_default().to_string(),
                end_seconds: s["offsets"]["to"].as_f64().unwrap_or(0.0) / 1000.0,
                no_speech_prob: s["no_speech_prob"].as_f64(),
            })
            .collect::<Vec<_>>();
        (segments, value["result"]["language"].as_str(), None)
    } else if let Some(items) = value["segments"].as_array() {
        let segments = items
            .iter()
            .map(|s| Segment {
                text: s["text"].as_str().unwrap_or_default().to_string(),
                end_seconds: s["end"].as_f64().unwrap_or(0.0),
                no_speech_prob: s["no_speech_prob"].as_f64(),
            })
            .collect::<Vec<_>>();
        (segments, value["language"].as_str(), value["text"].as_str())
    } else {
        return Err(ProviderError::decode(SERVICE, "no segments in output"));
    };

    let text = match full_text {
        Some(text) => text.trim().to_string(),
        None => segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    };
    let probs: Vec<Option<f64>> = segments.iter().map(|s| s.no_speech_prob).collect();

    Ok(Transcription {
        text,
        metadata: TranscriptionMetadata {
            language: language.unwrap_or("unknown").to_string(),
            duration: segments.last().map_or(0.0, |s| s.end_seconds),
            segments: segments.len(),
            confidence: confidence(&probs),
        },
    })
}
