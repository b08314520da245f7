//! Text-to-speech function.
//!
//! Two request shapes share one endpoint:
//!
//! - `{text}`: synthesize and return the audio inline as base64.
//! - `{space_id, story_id}`: read the story through the management API,
//!   narrate its title and body, upload the MP3 as a CMS asset and link it
//!   to the story's `audio` field.
//!
//! The function always calls the TTS provider directly; it never goes back
//! through itself.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use inkstand_core::cms::protocol::PublishProtocol;
use inkstand_core::generate::audio::{
    AUDIO_MIME, AudioGenerator, BoxSpeechSynthesizer, EMPTY_TEXT_MESSAGE, prepare_text_for_tts,
};
use inkstand_infra::cms::storyblok::StoryblokClient;
use inkstand_infra::tts::elevenlabs::ElevenLabsSynthesizer;
use inkstand_types::config::{CmsSettings, StudioConfig};
use inkstand_types::error::GenerationError;
use inkstand_types::story::Story;
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::{AppError, cors_headers};

pub const TTS_PATH: &str = "/.netlify/functions/text-to-speech";

const GENERATED_MESSAGE: &str = "Text-to-Speech successfully generated.";
const UPLOADED_MESSAGE: &str = "Text-to-Speech successfully created and uploaded.";
const UPLOAD_FAILED_MESSAGE: &str = "Something went wrong during upload.";
const AUDIO_FAILED_MESSAGE: &str = "Error while generating the audio.";

#[derive(Clone)]
pub struct FunctionState {
    audio: Arc<AudioGenerator>,
    cms: Arc<StoryblokClient>,
    has_management_token: bool,
}

impl FunctionState {
    pub fn from_config(client: &reqwest::Client, config: &StudioConfig) -> Self {
        let direct = ElevenLabsSynthesizer::from_config(client.clone(), &config.elevenlabs);
        Self {
            audio: Arc::new(AudioGenerator::new(BoxSpeechSynthesizer::new(direct))),
            cms: Arc::new(StoryblokClient::new(client.clone(), &config.cms)),
            has_management_token: config.cms.settings().has_management_token,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TtsRequest {
    text: Option<String>,
    space_id: Option<Value>,
    story_id: Option<Value>,
}

/// Handler for every method on [`TTS_PATH`].
pub async fn text_to_speech(
    State(state): State<FunctionState>,
    method: Method,
    body: Bytes,
) -> Response {
    match method {
        Method::OPTIONS => (StatusCode::OK, cors_headers(), "").into_response(),
        Method::POST => match handle_post(&state, &body).await {
            Ok(payload) => (StatusCode::OK, cors_headers(), Json(payload)).into_response(),
            Err(e) => e.into_response(),
        },
        _ => AppError::MethodNotAllowed.into_response(),
    }
}

async fn handle_post(state: &FunctionState, body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::Invalid("Request body is required".into()));
    }
    let request: TtsRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::Invalid(format!("Invalid request body: {e}")))?;

    if request.text.is_some() {
        synthesize_text(state, request.text.as_deref().unwrap_or_default()).await
    } else {
        narrate_story(state, request.space_id.as_ref(), request.story_id.as_ref()).await
    }
}

async fn synthesize_text(state: &FunctionState, text: &str) -> Result<Value, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Invalid("text parameter is required".into()));
    }
    tracing::info!(chars = text.chars().count(), "processing text-to-speech request");

    let bytes = state.audio.synthesize(text).await.map_err(synthesis_error)?;
    Ok(json!({
        "message": GENERATED_MESSAGE,
        "audio": STANDARD.encode(bytes),
        "contentType": AUDIO_MIME,
    }))
}

async fn narrate_story(
    state: &FunctionState,
    space_id: Option<&Value>,
    story_id: Option<&Value>,
) -> Result<Value, AppError> {
    let (Some(space_id), Some(story_id)) = (
        space_id.and_then(id_text),
        story_id.and_then(id_text).and_then(|id| id.parse::<u64>().ok()),
    ) else {
        return Err(AppError::Invalid("space_id and story_id are required".into()));
    };
    tracing::info!(%space_id, story_id, "processing story narration request");

    let protocol = PublishProtocol::new(
        Arc::new(state.cms.for_space(space_id.clone())),
        CmsSettings {
            space_id: Some(space_id),
            has_management_token: state.has_management_token,
        },
    );

    let story = protocol
        .fetch_story(story_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let text = story_narration(&story);
    let bytes = state.audio.synthesize(&text).await.map_err(synthesis_error)?;

    if protocol.link_audio_asset(story_id, bytes).await {
        tracing::info!(story_id, "text-to-speech process completed");
        Ok(json!({ "message": UPLOADED_MESSAGE }))
    } else {
        Err(AppError::Internal(UPLOAD_FAILED_MESSAGE.into()))
    }
}

/// Ids arrive as JSON numbers or strings.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Spoken text for a story, with a pause between title and body.
fn story_narration(story: &Story) -> String {
    let title = story
        .content
        .title()
        .filter(|t| !t.is_empty())
        .or(Some(story.name.as_str()).filter(|n| !n.is_empty()))
        .unwrap_or("Article");
    let body = story
        .content
        .body()
        .filter(|c| !c.is_empty())
        .or(story.content.excerpt())
        .unwrap_or_default();

    format!(
        "Article title: {title}. <break time=\"1.0s\" /> Article content: {}",
        prepare_text_for_tts(body)
    )
}

fn synthesis_error(e: GenerationError) -> AppError {
    match e {
        GenerationError::Provider(message) if message == EMPTY_TEXT_MESSAGE => {
            AppError::Invalid(message)
        }
        other => {
            tracing::error!(error = %other, "speech synthesis failed");
            AppError::Internal(AUDIO_FAILED_MESSAGE.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::router::build_router;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use httpmock::MockServer;
    use inkstand_types::secret::Redacted;
    use tower::ServiceExt;

    const VOICE_PATH: &str = "/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM";

    fn state_for(server: &MockServer) -> FunctionState {
        let mut config = StudioConfig::default();
        config.elevenlabs.api_key = Some(Redacted::new("el-key"));
        config.elevenlabs.base_url = server.base_url();
        config.cms.space_id = Some("42".into());
        config.cms.management_token = Some(Redacted::new("mgmt"));
        config.cms.management_base_url = server.base_url();
        FunctionState::from_config(&reqwest::Client::new(), &config)
    }

    async fn call(state: FunctionState, method: &str, body: &str) -> (StatusCode, Response) {
        let request = Request::builder()
            .method(method)
            .uri(TTS_PATH)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_cors(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_options_returns_empty_ok() {
        let server = MockServer::start();
        let (status, response) = call(state_for(&server), "OPTIONS", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_get_is_method_not_allowed() {
        let server = MockServer::start();
        let (status, response) = call(state_for(&server), "GET", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&response);
        assert_eq!(json_body(response).await["message"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_missing_body_and_fields_are_rejected() {
        let server = MockServer::start();

        let (status, response) = call(state_for(&server), "POST", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        assert_eq!(json_body(response).await["message"], "Request body is required");

        let (_, response) = call(state_for(&server), "POST", r#"{"text":"  "}"#).await;
        assert_eq!(json_body(response).await["message"], "text parameter is required");

        let (_, response) = call(state_for(&server), "POST", r#"{"space_id":42}"#).await;
        assert_eq!(
            json_body(response).await["message"],
            "space_id and story_id are required"
        );
    }

    #[tokio::test]
    async fn test_markdown_only_text_is_empty_entry() {
        let server = MockServer::start();
        let (status, response) = call(state_for(&server), "POST", r###"{"text":"## "}"###).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["message"], EMPTY_TEXT_MESSAGE);
    }

    #[tokio::test]
    async fn test_text_request_returns_base64_audio() {
        let server = MockServer::start();
        let tts = server.mock(|when, then| {
            when.method("POST")
                .path(VOICE_PATH)
                .json_body_includes(r#"{"text":"Hello world"}"#);
            then.status(200).body(b"ID3");
        });

        let (status, response) =
            call(state_for(&server), "POST", r#"{"text":"**Hello** world"}"#).await;
        tts.assert();
        assert_eq!(status, StatusCode::OK);
        assert_cors(&response);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Text-to-Speech successfully generated.");
        assert_eq!(body["audio"], "SUQz");
        assert_eq!(body["contentType"], "audio/mpeg");
    }

    #[tokio::test]
    async fn test_provider_failure_is_generic_audio_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path(VOICE_PATH);
            then.status(500).body("down");
        });

        let (status, response) = call(state_for(&server), "POST", r#"{"text":"Hello"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["message"], "Error while generating the audio.");
    }

    #[tokio::test]
    async fn test_story_request_uploads_and_links_audio() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/spaces/42/stories/7");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"story":{"id":7,"name":"coffee","slug":"coffee","full_slug":"blog/coffee","content":{"component":"blog_post","title":"Coffee","content":"Brew **slowly**.","excerpt":"E"}}}"#);
        });
        let tts = server.mock(|when, then| {
            when.method("POST").path(VOICE_PATH);
            then.status(200).body(b"ID3");
        });
        let create = server.mock(|when, then| {
            when.method("POST")
                .path("/spaces/42/assets")
                .json_body_includes(r#"{"filename":"7-text-to-speech.mp3"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(format!(
                    r#"{{"id":900,"pretty_url":"https://a.storyblok.com/f/42/7-text-to-speech.mp3","post_url":"{}/upload","fields":{{"key":"k"}}}}"#,
                    server.base_url()
                ));
        });
        let upload = server.mock(|when, then| {
            when.method("POST").path("/upload");
            then.status(204);
        });
        let finish = server.mock(|when, then| {
            when.method("GET").path("/spaces/42/assets/900/finish_upload");
            then.status(200).body("{}");
        });
        let update = server.mock(|when, then| {
            when.method("PUT")
                .path("/spaces/42/stories/7")
                .json_body_includes(
                    r#"{"story":{"content":{"title":"Coffee","audio":{"id":900,"fieldtype":"asset","filename":"https://a.storyblok.com/f/42/7-text-to-speech.mp3","is_external_url":false}}}}"#,
                );
            then.status(200).body("{}");
        });

        let (status, response) = call(
            state_for(&server),
            "POST",
            r#"{"space_id":"42","story_id":7}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(response).await["message"],
            "Text-to-Speech successfully created and uploaded."
        );
        tts.assert();
        create.assert();
        upload.assert();
        finish.assert();
        update.assert();
    }

    #[tokio::test]
    async fn test_failed_upload_reports_upload_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/spaces/42/stories/7");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"story":{"id":7,"name":"coffee","content":{"title":"Coffee"}}}"#);
        });
        server.mock(|when, then| {
            when.method("POST").path(VOICE_PATH);
            then.status(200).body(b"ID3");
        });
        server.mock(|when, then| {
            when.method("POST").path("/spaces/42/assets");
            then.status(403).body("forbidden");
        });

        let (status, response) =
            call(state_for(&server), "POST", r#"{"space_id":42,"story_id":"7"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["message"],
            "Something went wrong during upload."
        );
    }

    #[test]
    fn test_narration_falls_back_to_name_and_excerpt() {
        let story: Story = serde_json::from_value(json!({
            "id": 1,
            "name": "Fallback Name",
            "content": {"title": "", "excerpt": "Only the *excerpt*."}
        }))
        .unwrap();
        assert_eq!(
            story_narration(&story),
            "Article title: Fallback Name. <break time=\"1.0s\" /> Article content: Only the excerpt."
        );

        let bare: Story = serde_json::from_value(json!({"id": 2})).unwrap();
        assert_eq!(
            story_narration(&bare),
            "Article title: Article. <break time=\"1.0s\" /> Article content: "
        );
    }
}
