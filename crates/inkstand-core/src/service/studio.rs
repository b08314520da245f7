//! Studio orchestration.
//!
//! Ties the draft store, rate limiter, generators and CMS protocol together
//! into the operations the CLI exposes: generate, regenerate, edit, publish,
//! delete and narrate.

use chrono::Utc;
use inkstand_types::error::{CmsError, GenerationError, StudioError};
use inkstand_types::post::{
    AudioStatus, BlogPost, GenerationRequest, PostPatch, PostStatus, new_post_id,
};
use inkstand_types::rate_limit::RateLimitStatus;
use inkstand_types::story::PublishedStory;

use crate::cms::api::CmsApi;
use crate::cms::protocol::PublishProtocol;
use crate::generate::audio::{AudioGenerator, narration_text};
use crate::generate::content::{ContentGenerator, GeneratedContent, LlmProvider};
use crate::generate::image::{ImageGenerator, ImageProvider};
use crate::rate_limit::RateLimiter;
use crate::storage::LocalStorage;
use crate::storage::drafts::DraftStore;

/// Service orchestrating the post lifecycle.
///
/// Generic over the storage, provider and CMS ports so inkstand-core never
/// depends on inkstand-infra.
pub struct StudioService<S, P, I, C>
where
    S: LocalStorage,
    P: LlmProvider,
    I: ImageProvider,
    C: CmsApi,
{
    drafts: DraftStore<S>,
    limiter: RateLimiter<S>,
    content: ContentGenerator<P>,
    images: ImageGenerator<I>,
    audio: AudioGenerator,
    cms: PublishProtocol<C>,
}

impl<S, P, I, C> StudioService<S, P, I, C>
where
    S: LocalStorage,
    P: LlmProvider,
    I: ImageProvider,
    C: CmsApi,
{
    pub fn new(
        drafts: DraftStore<S>,
        limiter: RateLimiter<S>,
        content: ContentGenerator<P>,
        images: ImageGenerator<I>,
        audio: AudioGenerator,
        cms: PublishProtocol<C>,
    ) -> Self {
        Self {
            drafts,
            limiter,
            content,
            images,
            audio,
            cms,
        }
    }

    pub fn drafts(&self) -> &DraftStore<S> {
        &self.drafts
    }

    pub fn cms(&self) -> &PublishProtocol<C> {
        &self.cms
    }

    pub fn audio(&self) -> &AudioGenerator {
        &self.audio
    }

    pub async fn rate_limit_status(&self) -> RateLimitStatus {
        self.limiter.check_limit().await
    }

    pub fn max_requests(&self) -> u32 {
        self.limiter.max_requests()
    }

    async fn post(&self, id: &str) -> Result<BlogPost, StudioError> {
        self.drafts
            .get(id)
            .await
            .ok_or_else(|| StudioError::PostNotFound(id.to_string()))
    }

    /// Content and image concurrently; fails only if content fails.
    async fn produce(
        &self,
        request: &GenerationRequest,
    ) -> Result<(GeneratedContent, String), StudioError> {
        let (content, image_url) = tokio::try_join!(self.content.generate(request), async {
            Ok::<_, GenerationError>(self.images.generate(&request.theme).await)
        })?;
        Ok((content, image_url))
    }

    /// Generate a new local post. Counts against the rate limit.
    pub async fn generate(&self, request: GenerationRequest) -> Result<BlogPost, StudioError> {
        let status = self.limiter.check_limit().await;
        if status.is_limited {
            tracing::warn!(reset_time = status.reset_time, "generation rate limited");
            return Err(StudioError::RateLimited {
                reset_at: status.reset_at(),
            });
        }
        self.limiter.record_request().await;

        let (content, image_url) = self.produce(&request).await?;

        let post = BlogPost {
            id: new_post_id(),
            title: content.title,
            content: content.content,
            excerpt: content.excerpt,
            image_url,
            theme: request.theme,
            tone: request.tone,
            length: request.length,
            status: PostStatus::Generated,
            audio_status: None,
            created_at: Utc::now(),
            published_at: None,
            storyblok_id: None,
            audio_url: None,
        };
        self.drafts.add(post.clone()).await;
        tracing::info!(post_id = %post.id, title = %post.title, "post generated");
        Ok(post)
    }

    /// Regenerate text and image of an existing post from its own theme,
    /// tone and length. The post returns to `generated`; its CMS id is kept.
    pub async fn regenerate(&self, id: &str) -> Result<BlogPost, StudioError> {
        let post = self.post(id).await?;
        let request = GenerationRequest {
            theme: post.theme.clone(),
            tone: post.tone,
            length: post.length,
        };
        let (content, image_url) = self.produce(&request).await?;

        let patch = PostPatch {
            title: Some(content.title),
            content: Some(content.content),
            excerpt: Some(content.excerpt),
            image_url: Some(image_url),
            status: Some(PostStatus::Generated),
            ..Default::default()
        };
        self.edit(id, patch).await
    }

    /// Apply a local edit.
    pub async fn edit(&self, id: &str, patch: PostPatch) -> Result<BlogPost, StudioError> {
        self.drafts
            .update(id, &patch)
            .await
            .ok_or_else(|| StudioError::PostNotFound(id.to_string()))
    }

    /// Publish a local post and stamp it with the CMS id.
    pub async fn publish_post(&self, id: &str) -> Result<BlogPost, StudioError> {
        let post = self.post(id).await?;
        let story_id = self.cms.publish(&post).await?;

        let patch = PostPatch {
            status: Some(PostStatus::Published),
            published_at: Some(Utc::now()),
            storyblok_id: Some(story_id),
            ..Default::default()
        };
        self.edit(id, patch).await
    }

    /// Delete a post locally. The CMS story, if any, is left in place.
    pub async fn delete(&self, id: &str) -> Result<(), StudioError> {
        if self.drafts.remove(id).await {
            tracing::info!(post_id = %id, "post deleted locally");
            Ok(())
        } else {
            Err(StudioError::PostNotFound(id.to_string()))
        }
    }

    /// Narrate a published local post and attach the audio to its story.
    pub async fn narrate_post(&self, id: &str) -> Result<BlogPost, StudioError> {
        let post = self.post(id).await?;
        let Some(story_id) = post.storyblok_id.clone() else {
            return Err(StudioError::NotPublished(id.to_string()));
        };

        self.set_audio_status(id, AudioStatus::Generating).await;
        let text = narration_text(&post.title, &post.excerpt, &post.content);

        let uri = match self.audio.generate(&text).await {
            Ok(uri) => uri,
            Err(e) => {
                self.set_audio_status(id, AudioStatus::Error).await;
                return Err(e.into());
            }
        };

        if !self.cms.attach_audio(&story_id, &uri).await {
            self.set_audio_status(id, AudioStatus::Error).await;
            return Err(CmsError::SyncFailed { story_id }.into());
        }

        let patch = PostPatch {
            audio_status: Some(AudioStatus::Ready),
            audio_url: Some(uri),
            ..Default::default()
        };
        self.edit(id, patch).await
    }

    /// Narrate a published CMS story found by slug.
    pub async fn narrate_story(&self, slug: &str) -> Result<PublishedStory, StudioError> {
        let story = self
            .cms
            .find_published(slug)
            .await
            .ok_or_else(|| StudioError::PostNotFound(slug.to_string()))?;

        let text = narration_text(&story.title, &story.excerpt, &story.content);
        let uri = self.audio.generate(&text).await?;

        let story_id = story.id.to_string();
        if !self.cms.attach_audio(&story_id, &uri).await {
            return Err(CmsError::SyncFailed { story_id }.into());
        }
        tracing::info!(story_id = story.id, "narration attached to story");
        Ok(story)
    }

    async fn set_audio_status(&self, id: &str, status: AudioStatus) {
        let patch = PostPatch {
            audio_status: Some(status),
            ..Default::default()
        };
        self.drafts.update(id, &patch).await;
    }
}
