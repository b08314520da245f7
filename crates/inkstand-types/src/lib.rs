//! Shared domain types for Inkstand.
//!
//! This crate contains the core domain types used across the studio:
//! BlogPost, CMS Story and Asset, rate-limit state, configuration, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod post;
pub mod rate_limit;
pub mod secret;
pub mod story;
