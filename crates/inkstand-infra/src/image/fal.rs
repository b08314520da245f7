//! FalImageProvider -- [`ImageProvider`] backed by a fal.ai text-to-image
//! endpoint.

use inkstand_core::generate::image::ImageProvider;
use inkstand_types::config::FalConfig;
use inkstand_types::error::GenerationError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::http::error_body;

pub struct FalImageProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    endpoint: String,
    aspect_ratio: String,
}

#[derive(Serialize)]
struct FalRequest<'a> {
    prompt: &'a str,
    aspect_ratio: &'a str,
    num_images: u32,
}

#[derive(Deserialize)]
struct FalResponse {
    #[serde(default)]
    images: Vec<FalImage>,
}

#[derive(Deserialize)]
struct FalImage {
    url: String,
}

impl FalImageProvider {
    pub fn from_config(client: reqwest::Client, config: &FalConfig) -> Self {
        Self {
            client,
            api_key: config
                .api_key
                .as_ref()
                .filter(|k| !k.is_blank())
                .map(|k| SecretString::from(k.expose().to_string())),
            endpoint: config.endpoint.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
        }
    }
}

impl ImageProvider for FalImageProvider {
    fn name(&self) -> &str {
        "fal"
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| GenerationError::Configuration("FAL_API_KEY is not set".into()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Key {}", api_key.expose_secret()))
            .json(&FalRequest {
                prompt,
                aspect_ratio: &self.aspect_ratio,
                num_images: 1,
            })
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(GenerationError::Provider(format!("fal HTTP {status}: {body}")));
        }

        let body: FalResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        body.images
            .into_iter()
            .next()
            .map(|image| image.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GenerationError::Provider("fal returned no images".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use inkstand_types::secret::Redacted;

    fn provider(server: &MockServer, key: Option<&str>) -> FalImageProvider {
        let config = FalConfig {
            api_key: key.map(Redacted::new),
            endpoint: server.url("/fal-ai/imagen4/preview/fast"),
            aspect_ratio: "16:9".into(),
        };
        FalImageProvider::from_config(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_returns_first_image_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/fal-ai/imagen4/preview/fast")
                .header("authorization", "Key fal-key")
                .json_body_includes(r#"{"prompt":"a cafe","aspect_ratio":"16:9","num_images":1}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"images":[{"url":"https://fal.media/files/a.png","width":1344,"height":768}]}"#);
        });

        let url = provider(&server, Some("fal-key"))
            .generate_image("a cafe")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(url, "https://fal.media/files/a.png");
    }

    #[tokio::test]
    async fn test_empty_images_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/fal-ai/imagen4/preview/fast");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"images":[]}"#);
        });

        assert!(provider(&server, Some("k")).generate_image("x").await.is_err());
    }

    #[tokio::test]
    async fn test_http_error_is_provider_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/fal-ai/imagen4/preview/fast");
            then.status(500).body("boom");
        });

        let err = provider(&server, Some("k")).generate_image("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let server = MockServer::start();
        let err = provider(&server, None).generate_image("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }
}
