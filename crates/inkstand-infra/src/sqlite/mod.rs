//! SQLite persistence for the local storage surface.

pub mod local_storage;
pub mod pool;
