//! StoryblokClient -- concrete [`CmsApi`] implementation for Storyblok.
//!
//! Management calls go to `{management_base_url}/spaces/{space}/...` with
//! the management token in the `Authorization` header. Published listings go
//! through the delivery API (`cdn/stories`) with the read-only token as a
//! query parameter. Tokens are held as [`SecretString`] and never logged.

use std::sync::Arc;

use inkstand_core::cms::api::CmsApi;
use inkstand_types::config::CmsConfig;
use inkstand_types::error::CmsError;
use inkstand_types::secret::Redacted;
use inkstand_types::story::{
    BLOG_COMPONENT, BLOG_PREFIX, LIST_PAGE_SIZE, NewStory, SignedUpload, Story, StoryQuery,
};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::http::error_body;

pub struct StoryblokClient {
    client: reqwest::Client,
    space_id: Option<String>,
    tokens: Arc<Tokens>,
    management_base_url: String,
    delivery_base_url: String,
}

struct Tokens {
    management: Option<SecretString>,
    delivery: Option<SecretString>,
}

#[derive(Deserialize)]
struct StoriesEnvelope {
    #[serde(default)]
    stories: Vec<Story>,
}

#[derive(Deserialize)]
struct StoryEnvelope {
    story: Story,
}

impl StoryblokClient {
    pub fn new(client: reqwest::Client, config: &CmsConfig) -> Self {
        let settings = config.settings();
        let secret = |token: &Option<Redacted>| {
            token
                .as_ref()
                .filter(|t| !t.is_blank())
                .map(|t| SecretString::from(t.expose().to_string()))
        };

        Self {
            client,
            space_id: settings.space_id,
            tokens: Arc::new(Tokens {
                management: secret(&config.management_token),
                delivery: secret(&config.delivery_token),
            }),
            management_base_url: config.management_base_url.trim_end_matches('/').to_string(),
            delivery_base_url: config.delivery_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Same credentials, different space. Used when a request names its
    /// own space id.
    pub fn for_space(&self, space_id: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            space_id: Some(space_id.into()),
            tokens: Arc::clone(&self.tokens),
            management_base_url: self.management_base_url.clone(),
            delivery_base_url: self.delivery_base_url.clone(),
        }
    }

    pub fn space_id(&self) -> Option<&str> {
        self.space_id.as_deref()
    }

    fn space_url(&self, path: &str) -> Result<String, CmsError> {
        let space = self
            .space_id
            .as_deref()
            .ok_or_else(|| CmsError::Configuration("STORYBLOK_SPACE_ID is not set".into()))?;
        Ok(format!("{}/spaces/{space}/{path}", self.management_base_url))
    }

    fn management_token(&self) -> Result<&str, CmsError> {
        self.tokens
            .management
            .as_ref()
            .map(|t| t.expose_secret())
            .ok_or_else(|| {
                CmsError::Configuration("STORYBLOK_MANAGEMENT_TOKEN is not set".into())
            })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, CmsError> {
        let response = request
            .header("Authorization", self.management_token()?)
            .send()
            .await
            .map_err(|e| CmsError::Transport(e.to_string()))?;
        check_status(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CmsError> {
        response
            .json()
            .await
            .map_err(|e| CmsError::Deserialization(e.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CmsError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(CmsError::from_status(status.as_u16(), error_body(response).await))
    }
}

impl CmsApi for StoryblokClient {
    async fn list_stories(&self, query: &StoryQuery) -> Result<Vec<Story>, CmsError> {
        let mut params = vec![("per_page", query.per_page.to_string())];
        if let Some(prefix) = &query.starts_with {
            params.push(("starts_with", prefix.clone()));
        }

        let request = self.client.get(self.space_url("stories")?).query(&params);
        let envelope: StoriesEnvelope = Self::decode(self.send(request).await?).await?;
        tracing::debug!(count = envelope.stories.len(), "listed stories");
        Ok(envelope.stories)
    }

    async fn get_story(&self, id: u64) -> Result<Story, CmsError> {
        let request = self.client.get(self.space_url(&format!("stories/{id}"))?);
        let envelope: StoryEnvelope = Self::decode(self.send(request).await?).await?;
        Ok(envelope.story)
    }

    async fn create_story(&self, story: &NewStory) -> Result<Option<u64>, CmsError> {
        let request = self
            .client
            .post(self.space_url("stories")?)
            .json(&json!({ "story": story }));
        let body: serde_json::Value = Self::decode(self.send(request).await?).await?;
        Ok(body.pointer("/story/id").and_then(serde_json::Value::as_u64))
    }

    async fn update_story(&self, id: u64, content: &serde_json::Value) -> Result<(), CmsError> {
        let request = self
            .client
            .put(self.space_url(&format!("stories/{id}"))?)
            .json(&json!({ "story": { "content": content } }));
        self.send(request).await?;
        Ok(())
    }

    async fn publish_story(&self, id: u64) -> Result<(), CmsError> {
        let request = self
            .client
            .get(self.space_url(&format!("stories/{id}/publish"))?);
        self.send(request).await?;
        Ok(())
    }

    async fn create_asset(&self, filename: &str) -> Result<SignedUpload, CmsError> {
        let request = self
            .client
            .post(self.space_url("assets")?)
            .json(&json!({ "filename": filename }));
        Self::decode(self.send(request).await?).await
    }

    async fn upload_asset(
        &self,
        upload: &SignedUpload,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), CmsError> {
        let mut form = Form::new();
        for (key, value) in upload.form_fields() {
            if !value.is_empty() {
                form = form.text(key, value);
            }
        }
        let file = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("audio/mpeg")
            .map_err(|e| CmsError::Unexpected(e.to_string()))?;
        form = form.part("file", file);

        let response = self
            .client
            .post(&upload.post_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CmsError::Transport(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }

    async fn finish_upload(&self, asset_id: u64) -> Result<(), CmsError> {
        let request = self
            .client
            .get(self.space_url(&format!("assets/{asset_id}/finish_upload"))?);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<(), CmsError> {
        let request = self
            .client
            .delete(self.space_url(&format!("assets/{asset_id}"))?);
        self.send(request).await?;
        Ok(())
    }

    async fn list_published(&self, cache_version: i64) -> Result<Vec<Story>, CmsError> {
        let token = self
            .tokens
            .delivery
            .as_ref()
            .ok_or_else(|| CmsError::Configuration("STORYBLOK_TOKEN is not set".into()))?;

        let per_page = LIST_PAGE_SIZE.to_string();
        let cv = cache_version.to_string();
        let response = self
            .client
            .get(format!("{}/cdn/stories", self.delivery_base_url))
            .query(&[
                ("token", token.expose_secret()),
                ("version", "published"),
                ("content_type", BLOG_COMPONENT),
                ("starts_with", BLOG_PREFIX),
                ("per_page", per_page.as_str()),
                ("cv", cv.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CmsError::Transport(e.to_string()))?;

        let envelope: StoriesEnvelope = Self::decode(check_status(response).await?).await?;
        Ok(envelope.stories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    fn client_for(server: &MockServer) -> StoryblokClient {
        let config = CmsConfig {
            space_id: Some("42".into()),
            management_token: Some(Redacted::new("mgmt-token")),
            delivery_token: Some(Redacted::new("cdn-token")),
            management_base_url: server.base_url(),
            delivery_base_url: server.base_url(),
        };
        StoryblokClient::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_list_stories_sends_auth_and_filters() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/spaces/42/stories")
                .header("authorization", "mgmt-token")
                .query_param("per_page", "100")
                .query_param("starts_with", "blog/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"stories":[{"id":7,"name":"Coffee","slug":"coffee","full_slug":"blog/coffee","content":{"component":"blog_post","title":"Coffee"}}]}"#);
        });

        let stories = client_for(&server)
            .list_stories(&StoryQuery::under("blog/"))
            .await
            .unwrap();
        mock.assert();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].id, 7);
        assert_eq!(stories[0].content.title(), Some("Coffee"));
    }

    #[tokio::test]
    async fn test_create_story_wraps_body_and_reads_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/spaces/42/stories")
                .json_body_includes(r#"{"story":{"name":"blog","slug":"blog","is_folder":true,"parent_id":0}}"#);
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"story":{"id":99,"name":"blog"}}"#);
        });

        let id = client_for(&server)
            .create_story(&NewStory {
                name: "blog".into(),
                slug: "blog".into(),
                is_folder: true,
                parent_id: 0,
                content: None,
            })
            .await
            .unwrap();
        mock.assert();
        assert_eq!(id, Some(99));
    }

    #[tokio::test]
    async fn test_create_story_without_id_returns_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/spaces/42/stories");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"story":{}}"#);
        });

        let id = client_for(&server)
            .create_story(&NewStory {
                name: "x".into(),
                slug: "x".into(),
                is_folder: false,
                parent_id: 1,
                content: Some(json!({"component": "blog_post"})),
            })
            .await
            .unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn test_update_story_puts_content_only() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("PUT")
                .path("/spaces/42/stories/7")
                .json_body(json!({"story": {"content": {"title": "New"}}}));
            then.status(200).body("{}");
        });

        client_for(&server)
            .update_story(7, &json!({"title": "New"}))
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_status_codes_map_to_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/spaces/42/stories/1");
            then.status(401).body("unauthorized");
        });
        server.mock(|when, then| {
            when.method("GET").path("/spaces/42/stories/2");
            then.status(403).body("forbidden");
        });
        server.mock(|when, then| {
            when.method("GET").path("/spaces/42/stories/3/publish");
            then.status(422).body(r#"{"slug":["already taken"]}"#);
        });

        let client = client_for(&server);
        assert!(matches!(client.get_story(1).await, Err(CmsError::Authentication)));
        assert!(matches!(client.get_story(2).await, Err(CmsError::Permission)));
        match client.publish_story(3).await {
            Err(CmsError::Validation { body }) => assert!(body.contains("already taken")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_space_is_a_configuration_error() {
        let client = StoryblokClient::new(reqwest::Client::new(), &CmsConfig::default());
        assert!(matches!(
            client.get_story(1).await,
            Err(CmsError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_asset_upload_flow() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method("POST")
                .path("/spaces/42/assets")
                .json_body(json!({"filename": "7-text-to-speech.mp3"}));
            then.status(200)
                .header("content-type", "application/json")
                .body(format!(
                    r#"{{"id":555,"pretty_url":"https://a.storyblok.com/f/42/7-text-to-speech.mp3","post_url":"{}/s3-upload","fields":{{"key":"f/42/7.mp3","policy":"abc","acl":""}}}}"#,
                    server.base_url()
                ));
        });
        let upload = server.mock(|when, then| {
            when.method("POST")
                .path("/s3-upload")
                .header_exists("content-type");
            then.status(204);
        });
        let finish = server.mock(|when, then| {
            when.method("GET").path("/spaces/42/assets/555/finish_upload");
            then.status(200).body("{}");
        });

        let client = client_for(&server);
        let signed = client.create_asset("7-text-to-speech.mp3").await.unwrap();
        assert_eq!(signed.id, 555);
        client
            .upload_asset(&signed, "7-text-to-speech.mp3", b"ID3".to_vec())
            .await
            .unwrap();
        client.finish_upload(signed.id).await.unwrap();

        create.assert();
        upload.assert();
        finish.assert();
    }

    #[tokio::test]
    async fn test_delete_asset_hits_endpoint() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("DELETE").path("/spaces/42/assets/9");
            then.status(204);
        });
        client_for(&server).delete_asset(9).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_list_published_uses_delivery_api() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/cdn/stories")
                .query_param("token", "cdn-token")
                .query_param("version", "published")
                .query_param("content_type", "blog_post")
                .query_param("starts_with", "blog/")
                .query_param("per_page", "100")
                .query_param("cv", "1700000000000");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"stories":[{"id":1,"slug":"coffee","full_slug":"blog/coffee","published_at":"2024-01-01T00:00:00.000Z","content":{"title":"Coffee","image":"https://img/x.png"}}]}"#);
        });

        let stories = client_for(&server).list_published(1_700_000_000_000).await.unwrap();
        mock.assert();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].content.image().url(), Some("https://img/x.png"));
    }

    #[tokio::test]
    async fn test_for_space_rewrites_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/spaces/77/stories/5");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"story":{"id":5,"name":"x"}}"#);
        });

        let story = client_for(&server).for_space("77").get_story(5).await.unwrap();
        mock.assert();
        assert_eq!(story.id, 5);
    }
}
