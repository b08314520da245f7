//! Business logic and port trait definitions for Inkstand.
//!
//! This crate defines the "ports" (storage, CMS, LLM, image and speech
//! traits) that the infrastructure layer implements. It depends only on
//! `inkstand-types` -- never on `inkstand-infra` or any database/HTTP crate.

pub mod cms;
pub mod generate;
pub mod rate_limit;
pub mod service;
pub mod storage;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
