use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use axum::extract::{MatchedPath, Request};
use axum::http::HeaderValue;
use axum::response::Response;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, MaxAge};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::ApiConfig;
use crate::database::session::MongoSessionStore;
use crate::global::Global;

pub mod error;
pub mod routes;
pub mod session;

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid cors origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::list([
            hyper::Method::GET,
            hyper::Method::POST,
            hyper::Method::PUT,
        ]))
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(MaxAge::exact(Duration::from_secs(7200)))
}

fn app(global: Arc<Global>) -> Router {
    let api = routes::routes().fallback(not_found);

    let router = Router::new().nest("/api", api);

    let router = match &global.config.api.public_dir {
        Some(dir) => {
            let index = format!("{}/index.html", dir.trim_end_matches('/'));
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => router.fallback(not_found),
    };

    let sessions = session::session_layer(&global.config.session, MongoSessionStore::new(&global.db));

    router.layer(
        ServiceBuilder::new()
            .layer(CompressionLayer::new())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request| {
                        // Route templates keep ids and usernames out of span names.
                        let route = req
                            .extensions()
                            .get::<MatchedPath>()
                            .map(|path| path.as_str().to_string())
                            .unwrap_or_else(|| req.uri().path().to_string());

                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            route,
                            status = tracing::field::Empty,
                        )
                    })
                    .on_response(|res: &Response, latency: Duration, span: &Span| {
                        span.record("status", res.status().as_u16());
                        if res.status().is_server_error() {
                            tracing::warn!(status = res.status().as_u16(), ?latency, "request failed");
                        } else {
                            tracing::debug!(status = res.status().as_u16(), ?latency, "request handled");
                        }
                    })
                    .on_failure(()),
            )
            .layer(cors_layer(&global.config.api))
            .layer(sessions),
    )
    .with_state(global)
}

#[tracing::instrument]
async fn not_found() -> error::ApiError {
    error::ApiError::not_found(error::ApiErrorCode::ROUTE_NOT_FOUND, "route not found")
}

/// Serves until `shutdown` resolves, then stops accepting connections and
/// lets in-flight requests finish.
#[tracing::instrument(name = "HTTP", skip_all)]
pub async fn run(global: Arc<Global>, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    let bind = global.config.api.bind;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind HTTP server to {bind}"))?;

    tracing::info!(%bind, "http server listening");

    axum::serve(
        listener,
        app(global).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("http server error")?;

    tracing::info!("http server stopped");

    Ok(())
}
