//! Content, image and narration generators.
//!
//! Each generator owns its prompt or text preparation and delegates the
//! network call to a port trait implemented in inkstand-infra.

pub mod audio;
pub mod content;
pub mod image;

/// First `max` characters of `s`, cut on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
