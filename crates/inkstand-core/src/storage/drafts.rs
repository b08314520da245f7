//! Local draft store.
//!
//! Posts are kept as one JSON array under [`POSTS_KEY`], newest first.
//! Reads degrade to an empty list and write failures are logged, so the
//! store never fails its caller.

use std::sync::Arc;

use inkstand_types::post::{BlogPost, PostPatch};

use super::{LocalStorage, POSTS_KEY, read_json, write_json};

/// Draft store over any [`LocalStorage`] backend.
pub struct DraftStore<S: LocalStorage> {
    storage: Arc<S>,
}

impl<S: LocalStorage> DraftStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// All posts, most recently added first.
    pub async fn list(&self) -> Vec<BlogPost> {
        read_json(self.storage.as_ref(), POSTS_KEY)
            .await
            .unwrap_or_default()
    }

    pub async fn get(&self, id: &str) -> Option<BlogPost> {
        self.list().await.into_iter().find(|p| p.id == id)
    }

    /// Prepend a post. No uniqueness check is made on `id`.
    pub async fn add(&self, post: BlogPost) {
        let mut posts = self.list().await;
        tracing::debug!(post_id = %post.id, "adding draft");
        posts.insert(0, post);
        write_json(self.storage.as_ref(), POSTS_KEY, &posts).await;
    }

    /// Shallow-merge `patch` into the post with `id`.
    ///
    /// Returns the updated post, or `None` (and writes nothing) when no post
    /// has that id.
    pub async fn update(&self, id: &str, patch: &PostPatch) -> Option<BlogPost> {
        let mut posts = self.list().await;
        let post = posts.iter_mut().find(|p| p.id == id)?;
        patch.apply_to(post);
        let updated = post.clone();
        write_json(self.storage.as_ref(), POSTS_KEY, &posts).await;
        Some(updated)
    }

    /// Remove the post with `id`. Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut posts = self.list().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        let removed = posts.len() != before;
        write_json(self.storage.as_ref(), POSTS_KEY, &posts).await;
        removed
    }
}

impl<S: LocalStorage> Clone for DraftStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}
