//! Publish/sync protocol against the CMS.
//!
//! Publishing a post runs through these branches:
//!
//! 1. The post already carries a CMS id: update that story in place.
//! 2. A story already sits at `blog/{slug}`: update it instead of creating.
//! 3. Otherwise make sure the `blog` folder exists, create the story as a
//!    draft, then publish it in a separate call.
//!
//! The protocol never creates two stories at the same full slug. Updates and
//! audio attachment report success as a `bool` and log their failures.

use std::sync::Arc;

use inkstand_types::config::CmsSettings;
use inkstand_types::error::CmsError;
use inkstand_types::post::{BlogPost, slugify};
use inkstand_types::story::{
    BLOG_COMPONENT, BLOG_FOLDER_SLUG, BLOG_PREFIX, ContentPayload, NewStory, PublishedStory,
    Story, StoryQuery, full_slug_for,
};

use super::api::CmsApi;

/// Orchestrates publish, update and audio sync for one CMS space.
pub struct PublishProtocol<C: CmsApi> {
    api: Arc<C>,
    settings: CmsSettings,
}

impl<C: CmsApi> PublishProtocol<C> {
    pub fn new(api: Arc<C>, settings: CmsSettings) -> Self {
        Self { api, settings }
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    fn ensure_configured(&self) -> Result<(), CmsError> {
        if self.settings.space_id.is_none() {
            return Err(CmsError::Configuration(
                "STORYBLOK_SPACE_ID is not set".to_string(),
            ));
        }
        if !self.settings.has_management_token {
            return Err(CmsError::Configuration(
                "STORYBLOK_MANAGEMENT_TOKEN is not set".to_string(),
            ));
        }
        Ok(())
    }

    /// Publish `post` and return the CMS story id.
    pub async fn publish(&self, post: &BlogPost) -> Result<String, CmsError> {
        self.ensure_configured()?;

        let full_slug = full_slug_for(&slugify(&post.title));
        tracing::info!(post_id = %post.id, slug = %full_slug, "publishing post");

        if let Some(id) = &post.storyblok_id {
            return self.update_or_fail(id, post).await;
        }

        if let Some(existing) = self.find_existing_story(&full_slug).await {
            tracing::info!(story_id = existing.id, "story exists at slug, updating instead");
            return self.update_or_fail(&existing.id.to_string(), post).await;
        }

        let folder_id = self.ensure_blog_folder().await;
        let payload = build_payload(post);
        let content = serde_json::to_value(&payload)
            .map_err(|e| CmsError::Unexpected(format!("failed to encode content: {e}")))?;

        let new_story = NewStory {
            name: post.title.clone(),
            slug: full_slug.clone(),
            is_folder: false,
            parent_id: folder_id,
            content: Some(content),
        };

        let story_id = self.api.create_story(&new_story).await?.ok_or_else(|| {
            CmsError::Unexpected("create response did not include a story id".to_string())
        })?;
        tracing::info!(story_id, slug = %full_slug, "story created as draft");

        if let Err(e) = self.api.publish_story(story_id).await {
            tracing::warn!(story_id, error = %e, "story created but left as draft");
        }

        Ok(story_id.to_string())
    }

    async fn update_or_fail(&self, id: &str, post: &BlogPost) -> Result<String, CmsError> {
        if self.update(id, post).await {
            Ok(id.to_string())
        } else {
            Err(CmsError::SyncFailed {
                story_id: id.to_string(),
            })
        }
    }

    /// Rewrite the content of story `id` from `post` and publish it.
    pub async fn update(&self, id: &str, post: &BlogPost) -> bool {
        let Ok(story_id) = id.trim().parse::<u64>() else {
            tracing::error!(story_id = %id, "invalid story id");
            return false;
        };

        let content = match serde_json::to_value(build_payload(post)) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(story_id, error = %e, "failed to encode content");
                return false;
            }
        };

        if let Err(e) = self.api.update_story(story_id, &content).await {
            tracing::error!(story_id, error = %e, "story update failed");
            return false;
        }
        if let Err(e) = self.api.publish_story(story_id).await {
            tracing::error!(story_id, error = %e, "publish after update failed");
            return false;
        }

        tracing::info!(story_id, "story updated and published");
        true
    }

    /// Set only the `audio` field of story `id`, preserving everything else.
    pub async fn attach_audio(&self, id: &str, audio: &str) -> bool {
        let Ok(story_id) = id.trim().parse::<u64>() else {
            tracing::error!(story_id = %id, "invalid story id");
            return false;
        };

        let mut story = match self.api.get_story(story_id).await {
            Ok(story) => story,
            Err(e) => {
                tracing::error!(story_id, error = %e, "could not fetch story for audio");
                return false;
            }
        };
        story.content.set_audio(serde_json::Value::String(audio.to_string()));

        self.write_and_publish(story_id, story).await
    }

    async fn write_and_publish(&self, story_id: u64, story: Story) -> bool {
        let content = serde_json::Value::Object(story.content.into_map());
        if let Err(e) = self.api.update_story(story_id, &content).await {
            tracing::error!(story_id, error = %e, "audio update failed");
            return false;
        }
        if let Err(e) = self.api.publish_story(story_id).await {
            tracing::error!(story_id, error = %e, "publish after audio update failed");
            return false;
        }
        tracing::info!(story_id, "audio attached and published");
        true
    }

    /// Look for a story at `full_slug` among the first page under `blog/`.
    /// Listing failures degrade to `None`.
    pub async fn find_existing_story(&self, full_slug: &str) -> Option<Story> {
        match self.api.list_stories(&StoryQuery::under(BLOG_PREFIX)).await {
            Ok(stories) => stories.into_iter().find(|s| s.matches_full_slug(full_slug)),
            Err(e) => {
                tracing::warn!(slug = %full_slug, error = %e, "existing-story lookup failed");
                None
            }
        }
    }

    /// Id of the `blog` folder, creating it when missing. Falls back to the
    /// root (`0`) if listing or creation fails.
    pub async fn ensure_blog_folder(&self) -> u64 {
        let root = match self.api.list_stories(&StoryQuery::root()).await {
            Ok(stories) => stories,
            Err(e) => {
                tracing::warn!(error = %e, "folder lookup failed, using root");
                return 0;
            }
        };

        if let Some(folder) = root
            .iter()
            .find(|s| s.is_folder && s.slug == BLOG_FOLDER_SLUG)
        {
            return folder.id;
        }

        let folder = NewStory {
            name: "Blog".to_string(),
            slug: BLOG_FOLDER_SLUG.to_string(),
            is_folder: true,
            parent_id: 0,
            content: None,
        };
        match self.api.create_story(&folder).await {
            Ok(Some(id)) => {
                tracing::info!(folder_id = id, "created blog folder");
                id
            }
            Ok(None) => {
                tracing::warn!("folder created without id, using root");
                0
            }
            Err(e) => {
                tracing::warn!(error = %e, "folder creation failed, using root");
                0
            }
        }
    }

    /// Upload narration bytes as a CMS asset and link it to `story_id`.
    ///
    /// The previous audio asset, if the field held one, is deleted afterwards;
    /// a failed delete is only logged.
    pub async fn link_audio_asset(&self, story_id: u64, bytes: Vec<u8>) -> bool {
        match self.try_link_audio_asset(story_id, bytes).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(story_id, error = %e, "audio upload failed");
                false
            }
        }
    }

    async fn try_link_audio_asset(&self, story_id: u64, bytes: Vec<u8>) -> Result<(), CmsError> {
        let filename = format!("{story_id}-text-to-speech.mp3");
        let upload = self.api.create_asset(&filename).await?;
        self.api.upload_asset(&upload, &filename, bytes).await?;
        self.api.finish_upload(upload.id).await?;

        let mut story = self.api.get_story(story_id).await?;
        let old_asset = story.content.audio_asset_id();
        story.content.set_audio(upload.asset_field());

        let content = serde_json::Value::Object(story.content.into_map());
        self.api.update_story(story_id, &content).await?;
        tracing::info!(story_id, asset_id = upload.id, "audio asset linked");

        if let Some(old) = old_asset.filter(|old| *old != upload.id) {
            match self.api.delete_asset(old).await {
                Ok(()) => tracing::debug!(asset_id = old, "old audio asset removed"),
                Err(e) => tracing::warn!(asset_id = old, error = %e, "could not delete old audio asset"),
            }
        }
        Ok(())
    }

    /// Fetch one story by id through the management API.
    pub async fn fetch_story(&self, story_id: u64) -> Result<Story, CmsError> {
        self.api.get_story(story_id).await
    }

    /// Published blog stories. Failures are logged with a hint and degrade
    /// to an empty list.
    pub async fn list_published(&self) -> Vec<PublishedStory> {
        let cache_version = crate::now_ms();
        match self.api.list_published(cache_version).await {
            Ok(stories) => {
                tracing::debug!(count = stories.len(), "fetched published stories");
                stories.into_iter().map(PublishedStory::from).collect()
            }
            Err(e) => {
                match e.hint() {
                    Some(hint) => tracing::error!(error = %e, hint, "listing published stories failed"),
                    None => tracing::error!(error = %e, "listing published stories failed"),
                }
                Vec::new()
            }
        }
    }

    pub async fn find_published(&self, slug: &str) -> Option<PublishedStory> {
        self.list_published()
            .await
            .into_iter()
            .find(|s| s.matches(slug))
    }
}

/// Trimmed `value` if it parses as an absolute URL (data URIs included).
fn validated_url(value: Option<&str>, field: &str) -> Option<String> {
    let trimmed = value.map(str::trim).filter(|v| !v.is_empty())?;
    match url::Url::parse(trimmed) {
        Ok(_) => Some(trimmed.to_string()),
        Err(e) => {
            tracing::warn!(field, error = %e, "dropping invalid asset URL");
            None
        }
    }
}

/// Content object written on create and update.
pub fn build_payload(post: &BlogPost) -> ContentPayload {
    ContentPayload {
        component: BLOG_COMPONENT.to_string(),
        title: post.title.clone(),
        content: post.content.clone(),
        excerpt: post.excerpt.clone(),
        theme: post.theme.clone(),
        tone: post.tone.to_string(),
        image: validated_url(Some(&post.image_url), "image"),
        audio: validated_url(post.audio_url.as_deref(), "audio"),
    }
}
