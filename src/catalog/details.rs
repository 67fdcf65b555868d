use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use super::xml::extract_thing_fields;
use super::GameDetailSource;

/// Name given to a game whose detail document was fetched but carried no
/// primary name.
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl GameSummary {
    fn unavailable(id: String) -> Self {
        Self {
            id,
            name: None,
            image: None,
        }
    }
}

/// Resolves ids to [`GameSummary`] values with a bounded number of detail
/// requests in flight. Output order always matches input order.
#[derive(Debug, Clone)]
pub struct DetailFetcher<S> {
    source: S,
    max_concurrency: usize,
    timeout: Duration,
}

impl<S: GameDetailSource> DetailFetcher<S> {
    pub fn new(source: S, max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            source,
            max_concurrency: max_concurrency.max(1),
            timeout,
        }
    }

    #[tracing::instrument(skip_all, fields(count = ids.len()))]
    pub async fn fetch_details(&self, ids: Vec<String>) -> Vec<GameSummary> {
        let summaries: Vec<GameSummary> = stream::iter(ids)
            .map(|id| self.fetch_one(id))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let missing = summaries.iter().filter(|s| s.name.is_none()).count();
        tracing::debug!(total = summaries.len(), missing, "fetched game details");

        summaries
    }

    async fn fetch_one(&self, id: String) -> GameSummary {
        let body = match tokio::time::timeout(self.timeout, self.source.fetch_game_by_id(&id)).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                tracing::warn!(id, error = %e, "game detail fetch failed");
                return GameSummary::unavailable(id);
            }
            Err(_) => {
                tracing::warn!(id, timeout = ?self.timeout, "game detail fetch timed out");
                return GameSummary::unavailable(id);
            }
        };

        let fields = extract_thing_fields(&body);
        if fields.name.is_none() {
            tracing::warn!(id, "no primary name in game detail");
        }

        GameSummary {
            id,
            name: Some(fields.name.unwrap_or_else(|| UNKNOWN_NAME.to_string())),
            image: fields.image,
        }
    }
}
