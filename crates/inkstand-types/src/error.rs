use thiserror::Error;

/// Errors raised by the CMS publish/sync protocol and the Storyblok client.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("CMS is not configured: {0}")]
    Configuration(String),

    #[error("authentication failed: check the Storyblok management token")]
    Authentication,

    #[error("permission denied: the token cannot write to this space")]
    Permission,

    #[error("not found: {0}")]
    NotFound(String),

    /// 422 from the management API. The body is preserved verbatim; it also
    /// covers "slug already taken".
    #[error("validation failed: {body}")]
    Validation { body: String },

    #[error("story {story_id} could not be updated")]
    SyncFailed { story_id: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),

    #[error("failed to decode CMS response: {0}")]
    Deserialization(String),
}

impl CmsError {
    /// Map an HTTP status + body from the management or delivery API.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 => CmsError::Authentication,
            403 => CmsError::Permission,
            404 => CmsError::NotFound(body),
            422 => CmsError::Validation { body },
            _ => CmsError::Unexpected(format!("HTTP {status}: {body}")),
        }
    }

    /// Operator hint logged alongside the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CmsError::Authentication => {
                Some("the token is invalid or expired; generate a new one in Storyblok")
            }
            CmsError::Permission => {
                Some("the token lacks permission; check its access level in Storyblok")
            }
            CmsError::NotFound(_) => {
                Some("the space id or content type is wrong, or no blog/ stories exist")
            }
            _ => None,
        }
    }
}

/// Errors from the content, image and audio generators.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator not configured: {0}")]
    Configuration(String),

    /// Provider failure; carries the user-facing message.
    #[error("{0}")]
    Provider(String),

    /// Strict parse failure; the heuristic stage recovers from it.
    #[error("could not parse generated content: {0}")]
    Parse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors from repository operations (used by the storage port in inkstand-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),
}

/// Service-level errors surfaced by the studio orchestration.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("rate limit reached; quota resets at {reset_at}")]
    RateLimited { reset_at: chrono::DateTime<chrono::Utc> },

    #[error("post '{0}' not found")]
    PostNotFound(String),

    #[error("post '{0}' has not been published")]
    NotPublished(String),

    #[error("not logged in or session expired; run `inkstand login`")]
    Unauthenticated,

    #[error(transparent)]
    Cms(#[from] CmsError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
