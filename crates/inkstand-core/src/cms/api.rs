//! CmsApi trait definition.
//!
//! The raw REST surface of the headless CMS, one method per endpoint the
//! publish protocol touches. No policy lives here: retries, fallbacks and
//! "degrade to not found" decisions belong to [`super::protocol`].

use std::future::Future;

use inkstand_types::error::CmsError;
use inkstand_types::story::{NewStory, SignedUpload, Story, StoryQuery};

/// Trait for CMS backends (Storyblok management + delivery APIs).
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// The HTTP implementation lives in inkstand-infra (`StoryblokClient`).
pub trait CmsApi: Send + Sync {
    /// List stories, optionally under a slug prefix.
    fn list_stories(
        &self,
        query: &StoryQuery,
    ) -> impl Future<Output = Result<Vec<Story>, CmsError>> + Send;

    fn get_story(&self, id: u64) -> impl Future<Output = Result<Story, CmsError>> + Send;

    /// Create a story (never published). Returns the new id, or `None` when
    /// the response carried no id.
    fn create_story(
        &self,
        story: &NewStory,
    ) -> impl Future<Output = Result<Option<u64>, CmsError>> + Send;

    /// Replace the content object of an existing story. Name and slug are
    /// left untouched.
    fn update_story(
        &self,
        id: u64,
        content: &serde_json::Value,
    ) -> impl Future<Output = Result<(), CmsError>> + Send;

    /// Move a story's current draft to published.
    fn publish_story(&self, id: u64) -> impl Future<Output = Result<(), CmsError>> + Send;

    /// Register an asset and obtain a signed upload slot.
    fn create_asset(
        &self,
        filename: &str,
    ) -> impl Future<Output = Result<SignedUpload, CmsError>> + Send;

    /// Upload bytes to a signed slot as multipart form data.
    fn upload_asset(
        &self,
        upload: &SignedUpload,
        filename: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), CmsError>> + Send;

    fn finish_upload(&self, asset_id: u64) -> impl Future<Output = Result<(), CmsError>> + Send;

    fn delete_asset(&self, asset_id: u64) -> impl Future<Output = Result<(), CmsError>> + Send;

    /// Published blog stories from the delivery API. `cache_version` busts
    /// the CDN cache.
    fn list_published(
        &self,
        cache_version: i64,
    ) -> impl Future<Output = Result<Vec<Story>, CmsError>> + Send;
}
