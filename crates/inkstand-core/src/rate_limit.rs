//! Generation rate limiter.
//!
//! A fixed-window counter: the first request opens a one-hour window, every
//! request inside it is recorded, and the window resets once it has passed.
//! Bursts straddling a window boundary can therefore reach twice the cap.
//! State lives under [`RATE_LIMIT_KEY`] so it survives restarts.

use std::sync::Arc;

use inkstand_types::rate_limit::{RATE_LIMIT_WINDOW_MS, RateLimitState, RateLimitStatus};

use crate::now_ms;
use crate::storage::{LocalStorage, RATE_LIMIT_KEY, read_json, write_json};

pub struct RateLimiter<S: LocalStorage> {
    storage: Arc<S>,
    max_requests: u32,
}

impl<S: LocalStorage> RateLimiter<S> {
    pub fn new(storage: Arc<S>, max_requests: u32) -> Self {
        Self {
            storage,
            max_requests,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub async fn check_limit(&self) -> RateLimitStatus {
        self.check_limit_at(now_ms()).await
    }

    /// Quota at `now` (epoch ms). Missing, expired or corrupt state counts as
    /// a fresh window.
    pub async fn check_limit_at(&self, now: i64) -> RateLimitStatus {
        let fresh = RateLimitStatus {
            remaining: self.max_requests,
            reset_time: now + RATE_LIMIT_WINDOW_MS,
            is_limited: false,
        };

        let Some(state) = self.load().await else {
            return fresh;
        };
        if now > state.reset_time {
            return fresh;
        }

        let used = u32::try_from(state.requests.len()).unwrap_or(u32::MAX);
        let remaining = self.max_requests.saturating_sub(used);
        RateLimitStatus {
            remaining,
            reset_time: state.reset_time,
            is_limited: remaining == 0,
        }
    }

    pub async fn record_request(&self) {
        self.record_request_at(now_ms()).await;
    }

    /// Record one generation at `now`, opening a new window if needed.
    pub async fn record_request_at(&self, now: i64) {
        let state = match self.load().await {
            Some(mut state) if now <= state.reset_time => {
                state.requests.push(now);
                state
            }
            _ => RateLimitState {
                requests: vec![now],
                reset_time: now + RATE_LIMIT_WINDOW_MS,
            },
        };
        tracing::debug!(count = state.requests.len(), "recorded generation request");
        write_json(self.storage.as_ref(), RATE_LIMIT_KEY, &state).await;
    }

    async fn load(&self) -> Option<RateLimitState> {
        read_json(self.storage.as_ref(), RATE_LIMIT_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    const T0: i64 = 1_700_000_000_000;

    fn limiter(max: u32) -> (Arc<MemoryStorage>, RateLimiter<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (Arc::clone(&storage), RateLimiter::new(storage, max))
    }

    #[tokio::test]
    async fn test_fresh_state_has_full_quota() {
        let (_, rl) = limiter(10);
        let status = rl.check_limit_at(T0).await;
        assert_eq!(status.remaining, 10);
        assert_eq!(status.reset_time, T0 + RATE_LIMIT_WINDOW_MS);
        assert!(!status.is_limited);
    }

    #[tokio::test]
    async fn test_limited_after_max_records() {
        let (_, rl) = limiter(10);
        for i in 0..10 {
            rl.record_request_at(T0 + i).await;
        }
        let status = rl.check_limit_at(T0 + 100).await;
        assert!(status.is_limited);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.reset_time, T0 + RATE_LIMIT_WINDOW_MS);
    }

    #[tokio::test]
    async fn test_remaining_never_negative() {
        let (_, rl) = limiter(2);
        for i in 0..5 {
            rl.record_request_at(T0 + i).await;
        }
        assert_eq!(rl.check_limit_at(T0 + 10).await.remaining, 0);
    }

    #[tokio::test]
    async fn test_window_resets_after_reset_time() {
        let (_, rl) = limiter(10);
        for i in 0..10 {
            rl.record_request_at(T0 + i).await;
        }
        let later = T0 + RATE_LIMIT_WINDOW_MS + 1;
        let status = rl.check_limit_at(later).await;
        assert_eq!(status.remaining, 10);
        assert!(!status.is_limited);

        rl.record_request_at(later).await;
        let status = rl.check_limit_at(later + 1).await;
        assert_eq!(status.remaining, 9);
        assert_eq!(status.reset_time, later + RATE_LIMIT_WINDOW_MS);
    }

    #[tokio::test]
    async fn test_boundary_instant_still_in_window() {
        let (_, rl) = limiter(1);
        rl.record_request_at(T0).await;
        assert!(rl.check_limit_at(T0 + RATE_LIMIT_WINDOW_MS).await.is_limited);
    }

    #[tokio::test]
    async fn test_corrupt_state_is_full_quota() {
        let (storage, rl) = limiter(10);
        storage.set_item(RATE_LIMIT_KEY, "garbage").await.unwrap();
        assert_eq!(rl.check_limit_at(T0).await.remaining, 10);
        rl.record_request_at(T0).await;
        assert_eq!(rl.check_limit_at(T0).await.remaining, 9);
    }
}
