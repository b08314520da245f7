//! Local persistence surface.
//!
//! Everything the studio keeps on the local machine lives behind
//! [`LocalStorage`]: a flat map from string keys to JSON strings. The draft
//! store, session flag and rate limiter each own one key.

pub mod drafts;
pub mod session;

use std::future::Future;

use dashmap::DashMap;
use inkstand_types::error::RepositoryError;

/// Key holding the JSON array of drafts.
pub const POSTS_KEY: &str = "ai-blog-studio-posts";

/// Key holding the rate-limit window.
pub const RATE_LIMIT_KEY: &str = "ai-blog-studio-rate-limit";

/// Key holding the login session timestamp.
pub const AUTH_KEY: &str = "ai-blog-studio-auth";

/// Trait for string key -> JSON string persistence.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// The SQLite implementation lives in inkstand-infra.
pub trait LocalStorage: Send + Sync {
    /// Read a value. Returns None if the key does not exist.
    fn get_item(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Write a value (upsert).
    fn set_item(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove a key. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// In-process storage, used by tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), RepositoryError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Read and decode `key`, degrading every failure to `None`.
pub(crate) async fn read_json<S, T>(storage: &S, key: &str) -> Option<T>
where
    S: LocalStorage,
    T: serde::de::DeserializeOwned,
{
    match storage.get_item(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable local record");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "local storage read failed");
            None
        }
    }
}

/// Encode and write `value` under `key`; failures are logged and swallowed.
pub(crate) async fn write_json<S, T>(storage: &S, key: &str, value: &T)
where
    S: LocalStorage,
    T: serde::Serialize + ?Sized,
{
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(key, error = %e, "failed to encode local record");
            return;
        }
    };
    if let Err(e) = storage.set_item(key, &raw).await {
        tracing::error!(key, error = %e, "local storage write failed");
    }
}
