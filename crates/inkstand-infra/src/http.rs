//! Shared outbound HTTP client.

use std::time::Duration;

/// Build the reqwest client shared by every provider and the CMS client.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("inkstand/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Body of a failed response, for error messages.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}
