//! Image provider implementations.

pub mod fal;
