//! Infrastructure layer for Inkstand.
//!
//! Contains implementations of the port traits defined in `inkstand-core`:
//! SQLite-backed local storage, the Storyblok CMS client, and the Mistral,
//! fal and ElevenLabs provider clients. Also owns config loading.

pub mod cms;
pub mod config;
pub mod http;
pub mod image;
pub mod llm;
pub mod sqlite;
pub mod tts;
