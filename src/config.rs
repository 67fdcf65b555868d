use std::env;
use std::net::SocketAddr;

use ::config::{Environment, File};
use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    pub cors_origins: Vec<String>,
    /// Directory holding the built frontend. Paths outside `/api` are served
    /// from here, falling back to `index.html`.
    pub public_dir: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3030)),
            cors_origins: vec![
                "http://127.0.0.1:5173".into(),
                "http://localhost:5173".into(),
            ],
            public_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".into(),
            name: "boardgames".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Upper bound on in-flight detail requests per batch.
    pub max_concurrency: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://boardgamegeek.com".into(),
            user_agent: concat!("boardgame-api/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 10,
            max_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: u64,
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "loginToken".into(),
            ttl_hours: 24 * 7,
            secure_cookie: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub level: String,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".into(),
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            catalog: CatalogConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let environment = env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let config_file = match environment.as_str() {
            "production" => "prod",
            _ => "dev",
        };

        ::config::Config::builder()
            .add_source(File::with_name("config/default.yaml").required(false))
            .add_source(File::with_name(&format!("config/{}.yaml", config_file)).required(false))
            .add_source(File::with_name("config/local.yaml").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = ::config::Config::builder()
            .set_override("catalog.max_concurrency", 4)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.catalog.max_concurrency, 4);
        assert_eq!(config.catalog.timeout_secs, 10);
        assert_eq!(config.catalog.base_url, "https://boardgamegeek.com");
        assert_eq!(config.session.cookie_name, "loginToken");
        assert_eq!(config.api.bind.port(), 3030);
        assert!(config.api.public_dir.is_none());
    }
}
