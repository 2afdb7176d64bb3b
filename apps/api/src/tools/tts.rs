//! Text-to-speech forwarder (ElevenLabs).

use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";
pub const DEFAULT_VOICE_ID: &str = "8Ln42OXYupYsag45MAUy";
const MODEL_ID: &str = "eleven_multilingual_v2";

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("ELEVENLABS_API_KEY environment variable is not defined")]
    NotConfigured,

    #[error("text is required")]
    EmptyText,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ElevenLabs API error ({status}): {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
}

#[derive(Clone)]
pub struct SpeechClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    default_voice: String,
}

impl SpeechClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        default_voice: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            default_voice: default_voice.into(),
        }
    }

    /// Synthesises `text` and returns the raw audio bytes.
    pub async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Bytes, SpeechError> {
        let api_key = self.api_key.as_deref().ok_or(SpeechError::NotConfigured)?;
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let voice = voice_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_voice);
        debug!("Synthesising {} characters with voice {voice}", text.len());

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{voice}", self.base_url))
            .header("xi-api-key", api_key)
            .json(&SpeechRequest {
                text,
                model_id: MODEL_ID,
                voice_settings: VoiceSettings {
                    stability: 0.5,
                    similarity_boost: 0.75,
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("ElevenLabs returned {status}");
            return Err(SpeechError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?)
    }
}
