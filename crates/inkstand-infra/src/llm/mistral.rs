//! MistralProvider -- concrete [`LlmProvider`] for the Mistral chat API.
//!
//! Sends non-streaming requests to `{base_url}/chat/completions` with Bearer
//! auth. The API key is held as a [`SecretString`]; a provider built without
//! a key fails every call with `AuthenticationFailed` instead of hitting the
//! network.

use inkstand_core::generate::content::LlmProvider;
use inkstand_types::config::MistralConfig;
use inkstand_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::http::error_body;

pub struct MistralProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl MistralProvider {
    pub fn new(client: reqwest::Client, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            api_key,
            base_url: MistralConfig::default().base_url,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &MistralConfig) -> Self {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|k| !k.is_blank())
            .map(|k| SecretString::from(k.expose().to_string()));
        Self::new(client, api_key).with_base_url(config.base_url.clone())
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl LlmProvider for MistralProvider {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::AuthenticationFailed)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                400 | 422 => LlmError::InvalidRequest(body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {body}"),
                },
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        let usage = chat
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            model = %chat.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "completion received"
        );

        Ok(CompletionResponse {
            id: chat.id,
            content,
            model: chat.model,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use inkstand_types::llm::Message;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "mistral-large-latest".into(),
            messages: vec![Message::user("Write about coffee")],
            max_tokens: 4000,
            temperature: Some(0.7),
        }
    }

    fn provider(server: &MockServer) -> MistralProvider {
        MistralProvider::new(reqwest::Client::new(), Some(SecretString::from("mk-test".to_string())))
            .with_base_url(server.base_url())
    }

    #[tokio::test]
    async fn test_complete_sends_chat_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/chat/completions")
                .header("authorization", "Bearer mk-test")
                .json_body_includes(
                    r#"{"model":"mistral-large-latest","max_tokens":4000,"temperature":0.7,"messages":[{"role":"user","content":"Write about coffee"}]}"#,
                );
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"cmpl-1","model":"mistral-large-latest","choices":[{"index":0,"message":{"role":"assistant","content":"{\"title\":\"Coffee\"}"}}],"usage":{"prompt_tokens":12,"completion_tokens":34}}"#);
        });

        let response = provider(&server).complete(&request()).await.unwrap();
        mock.assert();
        assert_eq!(response.id, "cmpl-1");
        assert_eq!(response.content, r#"{"title":"Coffee"}"#);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 34);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/chat/completions");
            then.status(401).body("Unauthorized");
        });

        let err = provider(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"x","model":"m","choices":[]}"#);
        });

        let err = provider(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_blank_content_is_passed_through() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"x","model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"  "}}]}"#);
        });

        let response = provider(&server).complete(&request()).await.unwrap();
        assert_eq!(response.content, "  ");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        // Unmatched requests get a 404, which would surface as a provider error.
        let server = MockServer::start();
        let provider = MistralProvider::new(reqwest::Client::new(), None).with_base_url(server.base_url());
        assert!(!provider.has_api_key());
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }
}
