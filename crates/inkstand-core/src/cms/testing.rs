//! In-memory CMS used by unit tests across the crate.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use inkstand_types::error::CmsError;
use inkstand_types::story::{NewStory, SignedUpload, Story, StoryContent, StoryQuery};
use serde_json::{Value, json};

use super::api::CmsApi;

#[derive(Default)]
pub struct FakeCms {
    pub stories: Mutex<BTreeMap<u64, Story>>,
    pub calls: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub deleted_assets: Mutex<Vec<u64>>,
    next_id: Mutex<u64>,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_publish: AtomicBool,
    pub fail_delete_asset: AtomicBool,
    pub create_without_id: AtomicBool,
    pub reject_auth: AtomicBool,
}

impl FakeCms {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(100),
            ..Default::default()
        }
    }

    pub fn set(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    fn on(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn story(&self, id: u64) -> Option<Story> {
        self.stories.lock().unwrap().get(&id).cloned()
    }

    pub fn entries(&self) -> Vec<Story> {
        self.stories
            .lock()
            .unwrap()
            .values()
            .filter(|s| !s.is_folder)
            .cloned()
            .collect()
    }

    /// Seed a story directly, bypassing the API.
    pub fn insert(&self, story: Story) {
        self.stories.lock().unwrap().insert(story.id, story);
    }

    pub fn seed_folder(&self, id: u64, slug: &str) {
        self.insert(Story {
            id,
            name: slug.to_string(),
            slug: slug.to_string(),
            full_slug: slug.to_string(),
            is_folder: true,
            parent_id: Some(0),
            published_at: None,
            content: StoryContent::default(),
        });
    }

    fn guard(&self) -> Result<(), CmsError> {
        if Self::on(&self.reject_auth) {
            return Err(CmsError::Authentication);
        }
        Ok(())
    }
}

impl CmsApi for FakeCms {
    async fn list_stories(&self, query: &StoryQuery) -> Result<Vec<Story>, CmsError> {
        self.record(format!("list {:?}", query.starts_with));
        self.guard()?;
        if Self::on(&self.fail_list) {
            return Err(CmsError::Transport("connection reset".into()));
        }
        let stories = self.stories.lock().unwrap();
        Ok(stories
            .values()
            .filter(|s| match &query.starts_with {
                Some(prefix) => s.full_slug.starts_with(prefix.as_str()),
                None => true,
            })
            .take(query.per_page as usize)
            .cloned()
            .collect())
    }

    async fn get_story(&self, id: u64) -> Result<Story, CmsError> {
        self.record(format!("get {id}"));
        self.guard()?;
        self.story(id)
            .ok_or_else(|| CmsError::NotFound(format!("story {id}")))
    }

    async fn create_story(&self, story: &NewStory) -> Result<Option<u64>, CmsError> {
        self.record(format!("create {}", story.slug));
        self.guard()?;
        if Self::on(&self.fail_create) {
            return Err(CmsError::Validation {
                body: r#"{"slug":["has already been taken"]}"#.into(),
            });
        }
        let id = self.next_id();
        let content = match &story.content {
            Some(Value::Object(map)) => StoryContent::new(map.clone()),
            _ => StoryContent::default(),
        };
        let full_slug = if story.parent_id == 0 || story.slug.contains('/') {
            story.slug.clone()
        } else {
            let parent = self.story(story.parent_id).map(|p| p.full_slug);
            format!("{}/{}", parent.unwrap_or_default(), story.slug)
        };
        self.insert(Story {
            id,
            name: story.name.clone(),
            slug: story.slug.clone(),
            full_slug,
            is_folder: story.is_folder,
            parent_id: Some(story.parent_id),
            published_at: None,
            content,
        });
        if Self::on(&self.create_without_id) {
            return Ok(None);
        }
        Ok(Some(id))
    }

    async fn update_story(&self, id: u64, content: &Value) -> Result<(), CmsError> {
        self.record(format!("update {id}"));
        self.guard()?;
        if Self::on(&self.fail_update) {
            return Err(CmsError::Unexpected("HTTP 500".into()));
        }
        let mut stories = self.stories.lock().unwrap();
        let story = stories
            .get_mut(&id)
            .ok_or_else(|| CmsError::NotFound(format!("story {id}")))?;
        if let Value::Object(map) = content {
            story.content = StoryContent::new(map.clone());
        }
        Ok(())
    }

    async fn publish_story(&self, id: u64) -> Result<(), CmsError> {
        self.record(format!("publish {id}"));
        self.guard()?;
        if Self::on(&self.fail_publish) {
            return Err(CmsError::Unexpected("HTTP 500".into()));
        }
        let mut stories = self.stories.lock().unwrap();
        let story = stories
            .get_mut(&id)
            .ok_or_else(|| CmsError::NotFound(format!("story {id}")))?;
        story.published_at = Some("2024-06-10T08:00:00.000Z".into());
        Ok(())
    }

    async fn create_asset(&self, filename: &str) -> Result<SignedUpload, CmsError> {
        self.record(format!("asset {filename}"));
        self.guard()?;
        let id = self.next_id();
        Ok(SignedUpload {
            id,
            pretty_url: format!("https://a.storyblok.com/f/1/{filename}"),
            post_url: "https://s3.example/upload".into(),
            fields: [("key".to_string(), json!(format!("f/1/{filename}")))]
                .into_iter()
                .collect(),
        })
    }

    async fn upload_asset(
        &self,
        _upload: &SignedUpload,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), CmsError> {
        self.record(format!("upload {filename}"));
        self.uploads
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.len()));
        Ok(())
    }

    async fn finish_upload(&self, asset_id: u64) -> Result<(), CmsError> {
        self.record(format!("finish {asset_id}"));
        Ok(())
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<(), CmsError> {
        self.record(format!("delete_asset {asset_id}"));
        if Self::on(&self.fail_delete_asset) {
            return Err(CmsError::Unexpected("HTTP 500".into()));
        }
        self.deleted_assets.lock().unwrap().push(asset_id);
        Ok(())
    }

    async fn list_published(&self, cache_version: i64) -> Result<Vec<Story>, CmsError> {
        self.record(format!("cdn {cache_version}"));
        self.guard()?;
        Ok(self
            .stories
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.published_at.is_some() && s.content.component() == Some("blog_post"))
            .cloned()
            .collect())
    }
}
