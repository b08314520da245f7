//! Mirrored Storyblok story and asset types.
//!
//! Story content is kept as the raw JSON object so fields this crate does
//! not know about survive a read-modify-write. Typed accessors decode the
//! blog fields on demand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::collections::BTreeMap;

/// Content type of blog entries in the CMS.
pub const BLOG_COMPONENT: &str = "blog_post";

/// Slug of the parent folder holding every blog entry.
pub const BLOG_FOLDER_SLUG: &str = "blog";

/// Prefix used to list blog entries.
pub const BLOG_PREFIX: &str = "blog/";

/// Upper bound on entries fetched per listing call.
pub const LIST_PAGE_SIZE: u32 = 100;

/// `blog/{slug}`.
pub fn full_slug_for(slug: &str) -> String {
    format!("{BLOG_PREFIX}{slug}")
}

/// A story (entry or folder) as returned by the management or delivery API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub full_slug: String,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: StoryContent,
}

impl Story {
    /// True if this story sits at `full_slug`, comparing both slug fields.
    pub fn matches_full_slug(&self, full_slug: &str) -> bool {
        self.slug == full_slug || self.full_slug == full_slug
    }
}

/// Raw story content with typed accessors for the blog fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryContent(Map<String, Value>);

impl StoryContent {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn component(&self) -> Option<&str> {
        self.text("component")
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    /// Markdown body (`content` field).
    pub fn body(&self) -> Option<&str> {
        self.text("content")
    }

    pub fn excerpt(&self) -> Option<&str> {
        self.text("excerpt")
    }

    pub fn theme(&self) -> Option<&str> {
        self.text("theme")
    }

    pub fn tone(&self) -> Option<&str> {
        self.text("tone")
    }

    pub fn image(&self) -> Asset {
        Asset::decode(self.0.get("image"))
    }

    pub fn audio(&self) -> Asset {
        Asset::decode(self.0.get("audio"))
    }

    /// Id of the audio asset object, if the field holds one.
    pub fn audio_asset_id(&self) -> Option<u64> {
        self.0.get("audio").and_then(|v| v.get("id")).and_then(Value::as_u64)
    }

    /// Replace the `audio` field only; every other key is untouched.
    pub fn set_audio(&mut self, value: Value) {
        self.0.insert("audio".to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// An image or audio field decoded from the CMS.
///
/// The CMS hands these back either as a plain URL string or as an asset
/// object carrying a `filename`. Both collapse to [`Asset::Url`]; anything
/// empty or missing is [`Asset::None`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Asset {
    Url(String),
    None,
}

impl Asset {
    pub fn decode(field: Option<&Value>) -> Self {
        let url = match field {
            Some(Value::String(s)) => s.trim(),
            Some(Value::Object(obj)) => obj
                .get("filename")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or(""),
            _ => "",
        };
        if url.is_empty() {
            Asset::None
        } else {
            Asset::Url(url.to_string())
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Asset::Url(u) => Some(u),
            Asset::None => None,
        }
    }

    pub fn is_some(&self) -> bool {
        matches!(self, Asset::Url(_))
    }
}

/// Content body written on create/update.
///
/// `image` and `audio` are omitted entirely when absent so the CMS never
/// sees an empty or malformed asset field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    pub component: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub theme: String,
    pub tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// Body of a create-story call (entries and folders).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStory {
    pub name: String,
    pub slug: String,
    pub is_folder: bool,
    pub parent_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

/// Filters for listing stories on the management API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryQuery {
    pub starts_with: Option<String>,
    pub per_page: u32,
}

impl StoryQuery {
    pub fn under(prefix: impl Into<String>) -> Self {
        Self {
            starts_with: Some(prefix.into()),
            per_page: LIST_PAGE_SIZE,
        }
    }

    pub fn root() -> Self {
        Self {
            starts_with: None,
            per_page: LIST_PAGE_SIZE,
        }
    }
}

/// Signed upload slot returned when an asset is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedUpload {
    pub id: u64,
    pub pretty_url: String,
    pub post_url: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl SignedUpload {
    /// Signed form fields rendered as strings, ready for a multipart body.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }

    /// Asset object stored in a story field after the upload finishes.
    pub fn asset_field(&self) -> Value {
        serde_json::json!({
            "filename": self.pretty_url,
            "fieldtype": "asset",
            "is_external_url": false,
            "id": self.id,
        })
    }
}

/// A published blog story with its media normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedStory {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub full_slug: String,
    pub published_at: Option<String>,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub theme: String,
    pub tone: String,
    pub image: Asset,
    pub audio: Asset,
}

impl From<Story> for PublishedStory {
    fn from(story: Story) -> Self {
        let c = &story.content;
        Self {
            title: c.title().unwrap_or(&story.name).to_string(),
            content: c.body().unwrap_or_default().to_string(),
            excerpt: c.excerpt().unwrap_or_default().to_string(),
            theme: c.theme().unwrap_or_default().to_string(),
            tone: c.tone().unwrap_or_default().to_string(),
            image: c.image(),
            audio: c.audio(),
            id: story.id,
            name: story.name,
            slug: story.slug,
            full_slug: story.full_slug,
            published_at: story.published_at,
        }
    }
}

impl PublishedStory {
    /// Match by bare slug, `blog/slug`, or full slug in either form.
    pub fn matches(&self, slug: &str) -> bool {
        self.slug == slug
            || self.slug == full_slug_for(slug)
            || self.full_slug == slug
            || self.full_slug == full_slug_for(slug)
    }
}
