//! Studio configuration types.
//!
//! `StudioConfig` represents `config.toml` in the data directory. Every
//! section and field has a default so an empty or missing file still yields
//! a usable config; credentials are usually supplied through environment
//! overrides applied by the loader in inkstand-infra.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::rate_limit::DEFAULT_MAX_REQUESTS_PER_HOUR;
use crate::secret::Redacted;

/// Top-level configuration for the studio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub cms: CmsConfig,
    pub mistral: MistralConfig,
    pub fal: FalConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub audio: AudioConfig,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
    pub http: HttpConfig,
}

/// Storyblok space and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub space_id: Option<String>,
    /// Write-capable management token.
    pub management_token: Option<Redacted>,
    /// Read-only delivery token, used for listing published stories.
    pub delivery_token: Option<Redacted>,
    pub management_base_url: String,
    pub delivery_base_url: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            space_id: None,
            management_token: None,
            delivery_token: None,
            management_base_url: "https://mapi.storyblok.com/v1".to_string(),
            delivery_base_url: "https://api.storyblok.com/v2".to_string(),
        }
    }
}

impl CmsConfig {
    /// Settings handed to the publish protocol.
    pub fn settings(&self) -> CmsSettings {
        CmsSettings {
            space_id: self
                .space_id
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            has_management_token: self
                .management_token
                .as_ref()
                .is_some_and(|t| !t.is_blank()),
        }
    }
}

/// What the publish protocol needs to know about its configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmsSettings {
    pub space_id: Option<String>,
    pub has_management_token: bool,
}

/// Text generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MistralConfig {
    pub api_key: Option<Redacted>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.mistral.ai/v1".to_string(),
            model: "mistral-large-latest".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

/// Image generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FalConfig {
    pub api_key: Option<Redacted>,
    pub endpoint: String,
    pub aspect_ratio: String,
}

impl Default for FalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://fal.run/fal-ai/imagen4/preview/fast".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// Text-to-speech provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    pub api_key: Option<Redacted>,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f64,
    pub similarity_boost: f64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.elevenlabs.io".to_string(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_turbo_v2".to_string(),
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

/// How narration audio is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStrategy {
    /// Call the text-to-speech function endpoint; fall back to direct.
    Mediated,
    /// Call the TTS provider directly.
    Direct,
}

impl Default for AudioStrategy {
    fn default() -> Self {
        AudioStrategy::Direct
    }
}

impl fmt::Display for AudioStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioStrategy::Mediated => write!(f, "mediated"),
            AudioStrategy::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for AudioStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mediated" => Ok(AudioStrategy::Mediated),
            "direct" => Ok(AudioStrategy::Direct),
            other => Err(format!("invalid audio strategy: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub strategy: AudioStrategy,
    /// Full URL of the text-to-speech function used by the mediated strategy.
    pub function_url: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            strategy: AudioStrategy::default(),
            function_url: "http://127.0.0.1:8888/.netlify/functions/text-to-speech".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_hour: DEFAULT_MAX_REQUESTS_PER_HOUR,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Admin password checked by `inkstand login`.
    pub admin_password: Option<Redacted>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for every outbound client.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}
