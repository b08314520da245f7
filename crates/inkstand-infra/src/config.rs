//! Studio configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.inkstand/` by default)
//! into [`StudioConfig`], then layers environment variables on top. A
//! missing or malformed file falls back to defaults.

use std::path::{Path, PathBuf};

use inkstand_types::config::{AudioStrategy, StudioConfig};
use inkstand_types::secret::{Redacted, SecretSource};

pub const CONFIG_FILE: &str = "config.toml";

/// Where a credential came from, for `inkstand status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub name: &'static str,
    pub source: SecretSource,
    /// Masked value, e.g. `****3xyz`.
    pub masked: Option<String>,
}

/// Config after environment overrides, plus credential provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: StudioConfig,
    pub credentials: Vec<CredentialStatus>,
}

/// Resolve the data directory: `INKSTAND_DATA_DIR`, else `~/.inkstand`.
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(|name| std::env::var(name).ok())
}

fn data_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    match non_blank(lookup("INKSTAND_DATA_DIR")) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".inkstand"),
    }
}

/// Load `{data_dir}/config.toml` without environment overrides.
pub async fn load_studio_config(data_dir: &Path) -> StudioConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return StudioConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return StudioConfig::default();
        }
    };

    match toml::from_str::<StudioConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            StudioConfig::default()
        }
    }
}

/// Load the config file and apply the process environment on top.
pub async fn resolve_studio_config(data_dir: &Path) -> ResolvedConfig {
    let config = load_studio_config(data_dir).await;
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Blank values are treated as unset. Unparseable numeric or enum values
/// are logged and ignored.
pub fn apply_env_overrides(
    mut config: StudioConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let var = |name: &str| non_blank(lookup(name));
    let mut credentials = Vec::new();

    if let Some(space_id) = var("STORYBLOK_SPACE_ID") {
        config.cms.space_id = Some(space_id);
    }

    credentials.push(override_secret(
        "STORYBLOK_MANAGEMENT_TOKEN",
        &mut config.cms.management_token,
        var("STORYBLOK_MANAGEMENT_TOKEN"),
    ));
    credentials.push(override_secret(
        "STORYBLOK_TOKEN",
        &mut config.cms.delivery_token,
        var("STORYBLOK_TOKEN"),
    ));
    credentials.push(override_secret(
        "MISTRAL_API_KEY",
        &mut config.mistral.api_key,
        var("MISTRAL_API_KEY"),
    ));
    credentials.push(override_secret(
        "FAL_API_KEY",
        &mut config.fal.api_key,
        var("FAL_API_KEY"),
    ));
    credentials.push(override_secret(
        "ELEVENLABS_API_KEY",
        &mut config.elevenlabs.api_key,
        var("ELEVENLABS_API_KEY"),
    ));
    credentials.push(override_secret(
        "ADMIN_PASSWORD",
        &mut config.auth.admin_password,
        var("ADMIN_PASSWORD"),
    ));

    if let Some(raw) = var("MAX_REQUESTS_PER_HOUR") {
        match raw.parse::<u32>() {
            Ok(max) => config.rate_limit.max_requests_per_hour = max,
            Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring invalid MAX_REQUESTS_PER_HOUR"),
        }
    }

    if let Some(raw) = var("INKSTAND_AUDIO_STRATEGY") {
        match raw.parse::<AudioStrategy>() {
            Ok(strategy) => config.audio.strategy = strategy,
            Err(e) => tracing::warn!(error = %e, "ignoring INKSTAND_AUDIO_STRATEGY"),
        }
    }

    if let Some(url) = var("INKSTAND_FUNCTION_URL") {
        config.audio.function_url = url;
    }

    ResolvedConfig {
        config,
        credentials,
    }
}

fn override_secret(
    name: &'static str,
    slot: &mut Option<Redacted>,
    env_value: Option<String>,
) -> CredentialStatus {
    let source = match env_value {
        Some(value) => {
            *slot = Some(Redacted::new(value));
            SecretSource::Environment
        }
        None if slot.as_ref().is_some_and(|s| !s.is_blank()) => SecretSource::Config,
        None => {
            *slot = None;
            SecretSource::Missing
        }
    };

    CredentialStatus {
        name,
        source,
        masked: slot.as_ref().map(Redacted::masked),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
