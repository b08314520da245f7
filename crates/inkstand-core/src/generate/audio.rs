//! Narration audio generation.
//!
//! Text is stripped of markdown and capped before synthesis. Two backends sit
//! behind [`SpeechSynthesizer`]: the hosted text-to-speech function and the
//! TTS provider itself. The configured strategy picks the primary; the direct
//! provider serves as fallback for the mediated strategy.

use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use inkstand_types::error::GenerationError;
use regex::Regex;

/// Longest text sent for synthesis, in characters, before the ellipsis.
pub const MAX_TTS_CHARS: usize = 2500;

/// MIME type of every narration produced here.
pub const AUDIO_MIME: &str = "audio/mpeg";

/// Error message when nothing is left to narrate after cleaning.
pub const EMPTY_TEXT_MESSAGE: &str = "The entry content is empty.";

/// Trait for text-to-speech backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in inkstand-infra (`ElevenLabsSynthesizer`,
/// `MediatedSynthesizer`).
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize already-cleaned text into MPEG audio bytes.
    fn synthesize(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<u8>, GenerationError>> + Send;
}

/// Object-safe version of [`SpeechSynthesizer`] with boxed futures.
pub trait SpeechSynthesizerDyn: Send + Sync {
    fn name(&self) -> &str;

    fn synthesize_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, GenerationError>> + Send + 'a>>;
}

impl<T: SpeechSynthesizer> SpeechSynthesizerDyn for T {
    fn name(&self) -> &str {
        SpeechSynthesizer::name(self)
    }

    fn synthesize_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, GenerationError>> + Send + 'a>> {
        Box::pin(self.synthesize(text))
    }
}

/// Type-erased synthesizer so the strategy can be chosen at runtime.
pub struct BoxSpeechSynthesizer {
    inner: Box<dyn SpeechSynthesizerDyn + Send + Sync>,
}

impl BoxSpeechSynthesizer {
    pub fn new<T: SpeechSynthesizer + 'static>(synthesizer: T) -> Self {
        Self {
            inner: Box::new(synthesizer),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GenerationError> {
        self.inner.synthesize_boxed(text).await
    }
}

/// Produces narration data URIs from post text.
pub struct AudioGenerator {
    primary: BoxSpeechSynthesizer,
    fallback: Option<BoxSpeechSynthesizer>,
}

impl AudioGenerator {
    pub fn new(primary: BoxSpeechSynthesizer) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: BoxSpeechSynthesizer) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    /// Clean `text`, synthesize it and return the raw MPEG bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GenerationError> {
        let clean = prepare_text_for_tts(text);
        if clean.is_empty() {
            return Err(GenerationError::Provider(EMPTY_TEXT_MESSAGE.to_string()));
        }
        tracing::info!(
            synthesizer = self.primary.name(),
            chars = clean.chars().count(),
            "synthesizing narration"
        );

        match self.primary.synthesize(&clean).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(
                        primary = self.primary.name(),
                        fallback = fallback.name(),
                        error = %e,
                        "primary synthesizer failed, falling back"
                    );
                    fallback.synthesize(&clean).await
                }
                None => Err(e),
            },
        }
    }

    /// Narration for `text` as a `data:audio/mpeg;base64,...` URI.
    pub async fn generate(&self, text: &str) -> Result<String, GenerationError> {
        let bytes = self.synthesize(text).await?;
        Ok(to_data_uri(&bytes))
    }
}

pub fn to_data_uri(bytes: &[u8]) -> String {
    format!("data:{AUDIO_MIME};base64,{}", STANDARD.encode(bytes))
}

/// Text narrated for a post: title, excerpt, then body.
pub fn narration_text(title: &str, excerpt: &str, content: &str) -> String {
    format!("{title}. {excerpt}. {content}")
}

static HEADERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#{1,6}\s+").expect("valid regex"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.*?)`").expect("valid regex"));
static LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip markdown, collapse whitespace and cap at [`MAX_TTS_CHARS`].
pub fn prepare_text_for_tts(content: &str) -> String {
    let text = HEADERS.replace_all(content, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = CODE.replace_all(&text, "$1");
    let text = LINKS.replace_all(&text, "$1");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.trim();

    if text.chars().count() > MAX_TTS_CHARS {
        let capped: String = text.chars().take(MAX_TTS_CHARS).collect();
        format!("{capped}...")
    } else {
        text.to_string()
    }
}
