//! CMS client implementations.

pub mod storyblok;
