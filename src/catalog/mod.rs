use std::time::Duration;

use anyhow::Context as _;

use crate::config::CatalogConfig;

pub mod details;
pub mod xml;

const HOT_PATH: &str = "/xmlapi2/hot?boardgame";
const COLLECTION_PATH: &str = "/xmlapi2/collection";
const SEARCH_PATH: &str = "/xmlapi2/search";
const THING_PATH: &str = "/xmlapi2/thing";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
}

/// Anything that can hand back the raw detail document for a single game.
#[async_trait::async_trait]
pub trait GameDetailSource: Send + Sync {
    async fn fetch_game_by_id(&self, id: &str) -> Result<String, CatalogError>;
}

/// Thin client for the BoardGameGeek XML API. Every call is one GET that
/// returns the raw body; parsing happens in [`xml`].
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("catalog http client")?;

        Ok(Self::with_client(http, &config.base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_hottest(&self) -> Result<String, CatalogError> {
        self.get(HOT_PATH, &[]).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_user_collection(&self, username: &str) -> Result<String, CatalogError> {
        self.get(
            COLLECTION_PATH,
            &[("username", username), ("subtype", "boardgame"), ("own", "1")],
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_user_wishlist(&self, username: &str) -> Result<String, CatalogError> {
        self.get(
            COLLECTION_PATH,
            &[("username", username), ("subtype", "boardgame"), ("wishlist", "1")],
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_game_by_title(&self, title: &str) -> Result<String, CatalogError> {
        self.get(SEARCH_PATH, &[("query", title)]).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_game_by_id(&self, id: &str) -> Result<String, CatalogError> {
        self.get(THING_PATH, &[("id", id), ("exact", "1")]).await
    }

    async fn get(&self, endpoint: &'static str, query: &[(&str, &str)]) -> Result<String, CatalogError> {
        let transport = |source| CatalogError::Transport { endpoint, source };

        let resp = self
            .http
            .get(format!("{}{}", self.base_url, endpoint))
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status { endpoint, status });
        }

        let body = resp.text().await.map_err(transport)?;

        tracing::debug!(endpoint, bytes = body.len(), "catalog response received");

        Ok(body)
    }
}

#[async_trait::async_trait]
impl GameDetailSource for CatalogClient {
    async fn fetch_game_by_id(&self, id: &str) -> Result<String, CatalogError> {
        CatalogClient::fetch_game_by_id(self, id).await
    }
}
