//! HTTP layer for Inkstand.
//!
//! Serves the text-to-speech function at
//! `/.netlify/functions/text-to-speech` plus a `/health` probe.

pub mod error;
pub mod function;
pub mod router;
