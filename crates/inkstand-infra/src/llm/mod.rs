//! LLM provider implementations.

pub mod mistral;
