//! Blog content generation.
//!
//! The LLM is asked for a bare JSON object. Its answer goes through two
//! parsing stages: a strict JSON parse, then a heuristic that salvages a
//! title, excerpt and body from free-form markdown. [`ParseSource`] records
//! which stage produced the result.

use std::future::Future;
use std::sync::LazyLock;

use inkstand_types::config::MistralConfig;
use inkstand_types::error::GenerationError;
use inkstand_types::llm::{CompletionRequest, CompletionResponse, LlmError, Message};
use inkstand_types::post::{GenerationRequest, Tone};
use regex::Regex;
use serde::Deserialize;

use super::truncate_chars;

/// Message surfaced to the user when the text provider fails.
pub const CONTENT_FAILURE_MESSAGE: &str =
    "Failed to generate content. Please check your Mistral API key and try again.";

const MAX_TITLE_CHARS: usize = 60;
const MAX_EXCERPT_CHARS: usize = 160;
const FALLBACK_TITLE: &str = "Generated Blog Post";

/// Trait for chat-completion backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in inkstand-infra (e.g., `MistralProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "mistral").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send;
}

/// Which parsing stage produced a [`GeneratedContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseSource {
    Json,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub source: ParseSource,
}

/// Model parameters sent with every completion.
#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl From<&MistralConfig> for ContentSettings {
    fn from(config: &MistralConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self::from(&MistralConfig::default())
    }
}

pub struct ContentGenerator<P: LlmProvider> {
    provider: P,
    settings: ContentSettings,
}

impl<P: LlmProvider> ContentGenerator<P> {
    pub fn new(provider: P, settings: ContentSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn completion_request(&self, request: &GenerationRequest) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(build_prompt(request))],
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        }
    }

    /// Generate a post. Only provider failures are errors; unparseable
    /// output is recovered by the heuristic stage.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, GenerationError> {
        let completion = self.completion_request(request);
        tracing::info!(
            provider = self.provider.name(),
            theme = %request.theme,
            tone = %request.tone,
            length = %request.length,
            "generating content"
        );

        let response = self.provider.complete(&completion).await.map_err(|e| {
            tracing::error!(provider = self.provider.name(), error = %e, "content generation failed");
            GenerationError::Provider(CONTENT_FAILURE_MESSAGE.to_string())
        })?;

        let parsed = parse_completion(&response.content);
        tracing::debug!(source = ?parsed.source, title = %parsed.title, "parsed generated content");
        Ok(parsed)
    }
}

fn tone_instruction(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => {
            "Use a professional, authoritative tone with industry insights and data-driven content."
        }
        Tone::Casual => {
            "Write in a conversational, friendly tone that feels like talking to a knowledgeable friend."
        }
        Tone::Humorous => {
            "Include humor, wit, and entertaining examples while maintaining informative content."
        }
    }
}

/// Prompt for one generation request.
pub fn build_prompt(request: &GenerationRequest) -> String {
    format!(
        r#"Write a comprehensive blog post about "{theme}".

Requirements:
- Length: {words} words
- Tone: {tone}
- Include engaging headlines and subheadings
- Add practical examples and actionable insights
- Format with proper markdown structure

IMPORTANT: Respond with ONLY a valid JSON object in this exact format:
{{
  "title": "Your compelling title here (max 60 characters)",
  "excerpt": "Your brief excerpt here (max 160 characters)",
  "content": "Your full blog post content in markdown format"
}}

Do not include any other text, explanations, or formatting outside of this JSON structure."#,
        theme = request.theme,
        words = request.length.word_range(),
        tone = tone_instruction(request.tone),
    )
}

/// Parse raw LLM output, strict stage first.
pub fn parse_completion(raw: &str) -> GeneratedContent {
    let raw = raw.trim();
    match parse_strict(raw) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(error = %e, "strict parse failed, using heuristic");
            parse_heuristic(raw)
        }
    }
}

#[derive(Deserialize)]
struct RawContent {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
}

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json)?\s*").expect("valid regex"));
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));
static TITLE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title":\s*"([^"]+)""#).expect("valid regex"));

/// Strict stage: strip code fences, take the outermost `{...}`, and require
/// non-empty title, content and excerpt.
pub fn parse_strict(raw: &str) -> Result<GeneratedContent, GenerationError> {
    let mut cleaned = raw.to_string();
    if cleaned.starts_with("```") {
        cleaned = FENCE_OPEN.replace(&cleaned, "").into_owned();
        cleaned = FENCE_CLOSE.replace(&cleaned, "").into_owned();
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            cleaned = cleaned[start..=end].to_string();
        }
    }

    let parsed: RawContent =
        serde_json::from_str(&cleaned).map_err(|e| GenerationError::Parse(e.to_string()))?;

    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    match (
        non_empty(parsed.title),
        non_empty(parsed.content),
        non_empty(parsed.excerpt),
    ) {
        (Some(title), Some(content), Some(excerpt)) => Ok(GeneratedContent {
            title: truncate_chars(&title, MAX_TITLE_CHARS),
            content,
            excerpt: truncate_chars(&excerpt, MAX_EXCERPT_CHARS),
            source: ParseSource::Json,
        }),
        _ => Err(GenerationError::Parse(
            "missing title, content or excerpt".to_string(),
        )),
    }
}

/// Heuristic stage: first `# ` heading (or a `"title": "..."` line) as the
/// title, the first non-heading paragraph as the excerpt, everything as body.
pub fn parse_heuristic(raw: &str) -> GeneratedContent {
    let mut title = FALLBACK_TITLE.to_string();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        if line.starts_with('#') && !line.starts_with("##") {
            title = line.replacen('#', "", 1).trim().to_string();
            break;
        }
        if line.contains("\"title\"") && line.contains(':') {
            if let Some(caps) = TITLE_FIELD.captures(line) {
                title = caps[1].to_string();
                break;
            }
        }
    }

    let first_paragraph = raw
        .split("\n\n")
        .find(|p| !p.trim().is_empty() && !p.starts_with('#'));
    let excerpt_source = first_paragraph.unwrap_or(raw);
    let excerpt = format!("{}...", truncate_chars(excerpt_source, MAX_EXCERPT_CHARS));

    GeneratedContent {
        title: truncate_chars(&title, MAX_TITLE_CHARS),
        content: raw.to_string(),
        excerpt: truncate_chars(&excerpt, MAX_EXCERPT_CHARS),
        source: ParseSource::Heuristic,
    }
}
