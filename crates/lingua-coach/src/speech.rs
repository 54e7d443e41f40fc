//! Text-to-speech collaborator.
//!
//! Replies are voiced after they are final. Synthesis is best effort: callers
//! turn any [`SpeechError`] into a missing audio reference.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::SpeechError;
use crate::language;
use crate::utils::TextUtils;

/// URL prefix under which the audio directory is served.
pub const AUDIO_ROUTE: &str = "/audio";

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` and returns its public reference, e.g. `/audio/response-<id>.mp3`.
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String, SpeechError>;
}

/// Voices a reply, logging and swallowing failures.
pub async fn voice_reply(speech: &dyn SpeechSynthesizer, text: &str, language_code: &str) -> Option<String> {
    match speech.synthesize(text, language_code).await {
        Ok(reference) => Some(reference),
        Err(SpeechError::Disabled) => None,
        Err(e) => {
            warn!("Speech synthesis failed: {}", e);
            None
        }
    }
}

/// Used when speech output is switched off.
pub struct DisabledSpeech;

#[async_trait]
impl SpeechSynthesizer for DisabledSpeech {
    async fn synthesize(&self, _text: &str, _language_code: &str) -> Result<String, SpeechError> {
        Err(SpeechError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Posts to an OpenAI-compatible `/v1/audio/speech` endpoint and stores the
/// returned mp3 in the audio directory.
pub struct HttpSpeechSynthesizer {
    base_url: String,
    api_key: Option<String>,
    model: String,
    voice: String,
    audio_dir: PathBuf,
    http_client: reqwest::Client,
}

impl HttpSpeechSynthesizer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        audio_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Speech synthesis enabled with backend: {}", base_url);
        Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            voice: voice.into(),
            audio_dir: audio_dir.into(),
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String, SpeechError> {
        let input = TextUtils::clean_for_speech(text);
        debug!(
            "Synthesizing {} chars of {}",
            input.chars().count(),
            language::language_name(language_code)
        );

        let body = SpeechRequest {
            model: &self.model,
            input: &input,
            voice: &self.voice,
            response_format: "mp3",
        };
        let mut builder = self
            .http_client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status { status, body });
        }

        let audio = response.bytes().await?;
        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let file_name = format!("response-{}.mp3", uuid::Uuid::new_v4());
        tokio::fs::write(self.audio_dir.join(&file_name), &audio).await?;

        Ok(format!("{}/{}", AUDIO_ROUTE, file_name))
    }
}
