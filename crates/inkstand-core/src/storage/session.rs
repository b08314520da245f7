//! Admin session flag.
//!
//! A login stamps the current time under [`AUTH_KEY`]. The session is valid
//! for 24 hours from that stamp, computed lazily on every check.

use std::sync::Arc;

use inkstand_types::rate_limit::AuthState;
use subtle::ConstantTimeEq;

use super::{AUTH_KEY, LocalStorage, read_json, write_json};
use crate::now_ms;

pub struct SessionAuth<S: LocalStorage> {
    storage: Arc<S>,
}

impl<S: LocalStorage> SessionAuth<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(now_ms()).await
    }

    pub async fn is_authenticated_at(&self, now: i64) -> bool {
        read_json::<_, AuthState>(self.storage.as_ref(), AUTH_KEY)
            .await
            .is_some_and(|auth| auth.is_valid_at(now))
    }

    /// Milliseconds since epoch at which the current session expires.
    pub async fn expires_at(&self) -> Option<i64> {
        read_json::<_, AuthState>(self.storage.as_ref(), AUTH_KEY)
            .await
            .map(|auth| auth.timestamp + inkstand_types::rate_limit::SESSION_TTL_MS)
    }

    pub async fn set_authenticated(&self) {
        self.set_authenticated_at(now_ms()).await;
    }

    pub async fn set_authenticated_at(&self, now: i64) {
        write_json(self.storage.as_ref(), AUTH_KEY, &AuthState { timestamp: now }).await;
    }

    pub async fn clear_auth(&self) {
        if let Err(e) = self.storage.remove_item(AUTH_KEY).await {
            tracing::error!(error = %e, "failed to clear session");
        }
    }

    /// Compare `candidate` against the configured admin password and start a
    /// session on a match. An unset or empty password never matches.
    pub async fn login(&self, candidate: &str, expected: Option<&str>) -> bool {
        if !password_matches(candidate, expected) {
            tracing::warn!("login rejected");
            return false;
        }
        self.set_authenticated().await;
        tracing::info!("session started");
        true
    }
}

fn password_matches(candidate: &str, expected: Option<&str>) -> bool {
    match expected {
        Some(expected) if !expected.is_empty() => {
            candidate.as_bytes().ct_eq(expected.as_bytes()).into()
        }
        _ => false,
    }
}
