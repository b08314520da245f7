//! Observability setup shared by the CLI and the HTTP service.

pub mod tracing_setup;
