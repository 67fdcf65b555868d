use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use crate::catalog::details::DetailFetcher;
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::database::game_profile::MongoProfileStore;
use crate::database::{account, game_profile, session};
use crate::library::Library;

pub struct Global {
    pub config: Config,
    pub db: mongodb::Database,
    pub catalog: CatalogClient,
    pub details: DetailFetcher<CatalogClient>,
    pub library: Library,
    pub started_at: std::time::Instant,
}

impl Global {
    pub async fn init(config: Config) -> anyhow::Result<Arc<Self>> {
        let mongo = mongodb::Client::with_uri_str(&config.database.uri)
            .await
            .context("mongodb connect")?;

        tracing::info!("connected to mongodb");

        let db = mongo.database(&config.database.name);

        Self::ensure_indexes(&db).await?;

        let catalog = CatalogClient::new(&config.catalog)?;
        let details = DetailFetcher::new(
            catalog.clone(),
            config.catalog.max_concurrency,
            Duration::from_secs(config.catalog.timeout_secs),
        );
        let library = Library::new(Arc::new(MongoProfileStore::new(&db)));

        Ok(Arc::new(Self {
            config,
            db,
            catalog,
            details,
            library,
            started_at: std::time::Instant::now(),
        }))
    }

    pub(crate) async fn ensure_indexes(db: &mongodb::Database) -> anyhow::Result<()> {
        let unique = [
            (account::COLLECTION, "username"),
            (game_profile::COLLECTION, "username"),
        ];

        for (collection, key) in unique {
            db.collection::<mongodb::bson::Document>(collection)
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { key: 1 })
                        .options(IndexOptions::builder().unique(true).build())
                        .build(),
                )
                .await
                .with_context(|| format!("creating unique index on {collection}.{key}"))?;
        }

        db.collection::<mongodb::bson::Document>(session::COLLECTION)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "expires_at": 1 })
                    .options(IndexOptions::builder().expire_after(Duration::ZERO).build())
                    .build(),
            )
            .await
            .context("creating session ttl index")?;

        tracing::info!("ensured indexes");
        Ok(())
    }
}

/// A [`Global`] over a throwaway database on `APP__DATABASE__URI`, or `None`
/// when no server is configured.
#[cfg(test)]
pub async fn test_global() -> Option<Arc<Global>> {
    let mut config = Config::default();
    config.database.uri = std::env::var("APP__DATABASE__URI").ok()?;
    config.database.name = format!("boardgame_test_{}", uuid::Uuid::new_v4().simple());

    Some(Global::init(config).await.expect("test database is reachable"))
}
