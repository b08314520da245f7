use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Writing tone requested for a generated post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Casual,
    Humorous,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Professional => write!(f, "professional"),
            Tone::Casual => write!(f, "casual"),
            Tone::Humorous => write!(f, "humorous"),
        }
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            "humorous" => Ok(Tone::Humorous),
            other => Err(format!("invalid tone: '{other}'")),
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Professional
    }
}

/// Target length bucket for a generated post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostLength {
    Short,
    Medium,
    Long,
}

impl PostLength {
    /// Word-count range handed to the LLM prompt.
    pub fn word_range(&self) -> &'static str {
        match self {
            PostLength::Short => "300-500",
            PostLength::Medium => "800-1200",
            PostLength::Long => "1500-2000",
        }
    }
}

impl fmt::Display for PostLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostLength::Short => write!(f, "short"),
            PostLength::Medium => write!(f, "medium"),
            PostLength::Long => write!(f, "long"),
        }
    }
}

impl FromStr for PostLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(PostLength::Short),
            "medium" => Ok(PostLength::Medium),
            "long" => Ok(PostLength::Long),
            other => Err(format!("invalid length: '{other}'")),
        }
    }
}

impl Default for PostLength {
    fn default() -> Self {
        PostLength::Medium
    }
}

/// Post lifecycle states.
///
/// - Draft: hand-written or not yet generated
/// - Generated: produced by the AI generators, stored locally only
/// - Published: pushed to the CMS, `storyblok_id` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Generated,
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "draft"),
            PostStatus::Generated => write!(f, "generated"),
            PostStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "generated" => Ok(PostStatus::Generated),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("invalid post status: '{other}'")),
        }
    }
}

/// Narration state of a published post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStatus {
    None,
    Generating,
    Ready,
    Error,
}

impl fmt::Display for AudioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioStatus::None => write!(f, "none"),
            AudioStatus::Generating => write!(f, "generating"),
            AudioStatus::Ready => write!(f, "ready"),
            AudioStatus::Error => write!(f, "error"),
        }
    }
}

/// A blog post owned by the local draft store.
///
/// Field names serialize in camelCase so the persisted JSON array keeps the
/// layout the studio has always written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Opaque, time-sortable identifier.
    pub id: String,
    pub title: String,
    /// Markdown body.
    pub content: String,
    pub excerpt: String,
    /// Cover image URL; empty when no image is attached.
    #[serde(default)]
    pub image_url: String,
    pub theme: String,
    pub tone: Tone,
    pub length: PostLength,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_status: Option<AudioStatus>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// CMS story id, stamped on first successful publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyblok_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Generate a new time-sortable post id (UUID v7).
pub fn new_post_id() -> String {
    Uuid::now_v7().to_string()
}

/// Partial update applied to a [`BlogPost`] with shallow-merge semantics:
/// only the fields that are `Some` overwrite the stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub theme: Option<String>,
    pub tone: Option<Tone>,
    pub length: Option<PostLength>,
    pub status: Option<PostStatus>,
    pub audio_status: Option<AudioStatus>,
    pub published_at: Option<DateTime<Utc>>,
    pub storyblok_id: Option<String>,
    pub audio_url: Option<String>,
}

impl PostPatch {
    /// Overwrite every field of `post` that this patch carries.
    pub fn apply_to(&self, post: &mut BlogPost) {
        if let Some(v) = &self.title {
            post.title = v.clone();
        }
        if let Some(v) = &self.content {
            post.content = v.clone();
        }
        if let Some(v) = &self.excerpt {
            post.excerpt = v.clone();
        }
        if let Some(v) = &self.image_url {
            post.image_url = v.clone();
        }
        if let Some(v) = &self.theme {
            post.theme = v.clone();
        }
        if let Some(v) = self.tone {
            post.tone = v;
        }
        if let Some(v) = self.length {
            post.length = v;
        }
        if let Some(v) = self.status {
            post.status = v;
        }
        if let Some(v) = self.audio_status {
            post.audio_status = Some(v);
        }
        if let Some(v) = self.published_at {
            post.published_at = Some(v);
        }
        if let Some(v) = &self.storyblok_id {
            post.storyblok_id = Some(v.clone());
        }
        if let Some(v) = &self.audio_url {
            post.audio_url = Some(v.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PostPatch::default()
    }
}

/// Options for a content + image generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub theme: String,
    pub tone: Tone,
    pub length: PostLength,
}

/// Generate a URL-safe slug from a post title.
///
/// Rules:
/// - Lowercase
/// - Replace every run of characters outside `[a-z0-9]` with one hyphen
/// - Trim leading/trailing hyphens
///
/// Distinct titles may produce the same slug; callers treat that as a
/// collision on the same CMS entry.
///
/// # Examples
///
/// ```
/// use inkstand_types::post::slugify;
///
/// assert_eq!(slugify("My, Great Post!"), "my-great-post");
/// assert_eq!(slugify("---hello---world---"), "hello-world");
/// ```
pub fn slugify(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_was_hyphen = true; // treat start as hyphen to trim leading
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> BlogPost {
        BlogPost {
            id: "p1".to_string(),
            title: "Coffee Rituals".to_string(),
            content: "# Coffee\n\nBody".to_string(),
            excerpt: "Why we brew".to_string(),
            image_url: "https://img.example/1.png".to_string(),
            theme: "coffee".to_string(),
            tone: Tone::Casual,
            length: PostLength::Short,
            status: PostStatus::Generated,
            audio_status: None,
            created_at: Utc::now(),
            published_at: None,
            storyblok_id: None,
            audio_url: None,
        }
    }

    #[test]
    fn test_slugify_punctuation() {
        assert_eq!(slugify("My, Great Post!"), "my-great-post");
    }

    #[test]
    fn test_slugify_leading_trailing() {
        assert_eq!(slugify("!!Hello World??"), "hello-world");
        assert_eq!(slugify("---hello---world---"), "hello-world");
    }

    #[test]
    fn test_slugify_non_ascii_becomes_separator() {
        assert_eq!(slugify("Café Crème"), "caf-cr-me");
    }

    #[test]
    fn test_slugify_numbers() {
        assert_eq!(slugify("Top 10 Beans of 2024"), "top-10-beans-of-2024");
    }

    #[test]
    fn test_slugify_only_punctuation_is_empty() {
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn test_blog_post_serializes_camel_case() {
        let post = sample_post();
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["imageUrl"], "https://img.example/1.png");
        assert_eq!(json["status"], "generated");
        assert_eq!(json["tone"], "casual");
        assert!(json.get("storyblokId").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_blog_post_reads_legacy_record() {
        let json = r#"{
            "id": "1718000000000",
            "title": "T",
            "content": "C",
            "excerpt": "E",
            "imageUrl": "",
            "theme": "travel",
            "tone": "humorous",
            "length": "long",
            "status": "published",
            "createdAt": "2024-06-10T08:00:00.000Z",
            "storyblokId": "12345"
        }"#;
        let post: BlogPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.storyblok_id.as_deref(), Some("12345"));
        assert_eq!(post.length, PostLength::Long);
        assert!(post.audio_status.is_none());
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut post = sample_post();
        let before = post.clone();
        let patch = PostPatch {
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        patch.apply_to(&mut post);
        assert_eq!(post.status, PostStatus::Published);
        post.status = before.status;
        assert_eq!(post, before);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(PostPatch::default().is_empty());
        let patch = PostPatch {
            title: Some("x".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_tone_and_length_parse() {
        assert_eq!("Casual".parse::<Tone>().unwrap(), Tone::Casual);
        assert_eq!("long".parse::<PostLength>().unwrap(), PostLength::Long);
        assert!("loud".parse::<Tone>().is_err());
        assert_eq!(PostLength::Short.word_range(), "300-500");
    }

    #[test]
    fn test_new_post_ids_are_sortable() {
        let a = new_post_id();
        let b = new_post_id();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
