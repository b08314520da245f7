//! ElevenLabsSynthesizer -- direct [`SpeechSynthesizer`] against the
//! ElevenLabs text-to-speech API.

use inkstand_core::generate::audio::{AUDIO_MIME, SpeechSynthesizer};
use inkstand_types::config::ElevenLabsConfig;
use inkstand_types::error::GenerationError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::http::error_body;

pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    voice_id: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

impl ElevenLabsSynthesizer {
    pub fn from_config(client: reqwest::Client, config: &ElevenLabsConfig) -> Self {
        Self {
            client,
            api_key: config
                .api_key
                .as_ref()
                .filter(|k| !k.is_blank())
                .map(|k| SecretString::from(k.expose().to_string())),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            voice_settings: VoiceSettings {
                stability: config.stability,
                similarity_boost: config.similarity_boost,
            },
        }
    }
}

impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            GenerationError::Configuration("ElevenLabs API key not found".into())
        })?;

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key.expose_secret())
            .header("Accept", AUDIO_MIME)
            .json(&SpeechRequest {
                text,
                model_id: &self.model_id,
                voice_settings: self.voice_settings,
            })
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::error!(%status, body = %body, "ElevenLabs request failed");
            return Err(GenerationError::Provider(format!("ElevenLabs HTTP {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        tracing::debug!(bytes = bytes.len(), voice = %self.voice_id, "speech synthesized");
        Ok(bytes.to_vec())
    }
}
