//! Application state wiring all services together.
//!
//! `AppState` pins the generic studio service to the concrete infra
//! implementations and is shared by every CLI command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use inkstand_core::cms::protocol::PublishProtocol;
use inkstand_core::generate::content::{ContentGenerator, ContentSettings};
use inkstand_core::generate::image::ImageGenerator;
use inkstand_core::rate_limit::RateLimiter;
use inkstand_core::service::studio::StudioService;
use inkstand_core::storage::drafts::DraftStore;
use inkstand_core::storage::session::SessionAuth;
use inkstand_infra::cms::storyblok::StoryblokClient;
use inkstand_infra::config::{CredentialStatus, resolve_data_dir, resolve_studio_config};
use inkstand_infra::http::build_http_client;
use inkstand_infra::image::fal::FalImageProvider;
use inkstand_infra::llm::mistral::MistralProvider;
use inkstand_infra::sqlite::local_storage::SqliteLocalStorage;
use inkstand_infra::sqlite::pool::DatabasePool;
use inkstand_infra::tts::build_audio_generator;
use inkstand_types::config::StudioConfig;

pub type ConcreteStudioService =
    StudioService<SqliteLocalStorage, MistralProvider, FalImageProvider, StoryblokClient>;

#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: Arc<StudioConfig>,
    pub credentials: Arc<Vec<CredentialStatus>>,
    pub http_client: reqwest::Client,
    pub studio: Arc<ConcreteStudioService>,
    pub session: Arc<SessionAuth<SqliteLocalStorage>>,
}

impl AppState {
    /// Resolve config, open the database and wire the studio service.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let resolved = resolve_studio_config(&data_dir).await;
        let config = resolved.config;

        let db_pool = DatabasePool::open(&data_dir).await?;
        let storage = Arc::new(SqliteLocalStorage::new(db_pool));

        let http_client = build_http_client(Duration::from_secs(config.http.timeout_secs))?;

        let cms_client = Arc::new(StoryblokClient::new(http_client.clone(), &config.cms));
        let studio = StudioService::new(
            DraftStore::new(Arc::clone(&storage)),
            RateLimiter::new(Arc::clone(&storage), config.rate_limit.max_requests_per_hour),
            ContentGenerator::new(
                MistralProvider::from_config(http_client.clone(), &config.mistral),
                ContentSettings::from(&config.mistral),
            ),
            ImageGenerator::new(FalImageProvider::from_config(http_client.clone(), &config.fal)),
            build_audio_generator(&http_client, &config),
            PublishProtocol::new(cms_client, config.cms.settings()),
        );

        tracing::debug!(data_dir = %data_dir.display(), strategy = %config.audio.strategy, "state initialized");

        Ok(Self {
            data_dir,
            config: Arc::new(config),
            credentials: Arc::new(resolved.credentials),
            http_client,
            studio: Arc::new(studio),
            session: Arc::new(SessionAuth::new(storage)),
        })
    }
}
