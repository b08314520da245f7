//! Persisted rate-limit and session state.
//!
//! Timestamps are epoch milliseconds so the JSON stays compatible with the
//! records the studio has always stored.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Length of one rate-limit window.
pub const RATE_LIMIT_WINDOW_MS: i64 = 60 * 60 * 1000;

/// Default number of generations allowed per window.
pub const DEFAULT_MAX_REQUESTS_PER_HOUR: u32 = 10;

/// Lifetime of a login session.
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Fixed-window counter state stored under `ai-blog-studio-rate-limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub requests: Vec<i64>,
    pub reset_time: i64,
}

/// Result of a quota check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub remaining: u32,
    pub reset_time: i64,
    pub is_limited: bool,
}

impl RateLimitStatus {
    pub fn reset_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.reset_time)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Session record stored under `ai-blog-studio-auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub timestamp: i64,
}

impl AuthState {
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms - self.timestamp < SESSION_TTL_MS
    }
}
