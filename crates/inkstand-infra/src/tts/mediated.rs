//! MediatedSynthesizer -- [`SpeechSynthesizer`] that posts text to the
//! text-to-speech function and decodes its base64 audio.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use inkstand_core::generate::audio::SpeechSynthesizer;
use inkstand_types::error::GenerationError;
use serde::Deserialize;
use serde_json::json;

use crate::http::error_body;

pub struct MediatedSynthesizer {
    client: reqwest::Client,
    function_url: String,
}

#[derive(Deserialize)]
struct FunctionResponse {
    #[serde(default)]
    message: Option<String>,
    audio: Option<String>,
}

impl MediatedSynthesizer {
    pub fn new(client: reqwest::Client, function_url: String) -> Self {
        Self {
            client,
            function_url,
        }
    }
}

impl SpeechSynthesizer for MediatedSynthesizer {
    fn name(&self) -> &str {
        "mediated"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GenerationError> {
        let response = self
            .client
            .post(&self.function_url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(GenerationError::Provider(format!(
                "text-to-speech function HTTP {status}: {body}"
            )));
        }

        let body: FunctionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let audio = body.audio.filter(|a| !a.is_empty()).ok_or_else(|| {
            GenerationError::Provider(
                body.message
                    .unwrap_or_else(|| "text-to-speech function returned no audio".into()),
            )
        })?;

        STANDARD
            .decode(audio.as_bytes())
            .map_err(|e| GenerationError::Parse(format!("invalid base64 audio: {e}")))
    }
}
