use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::global::Global;

pub mod auth;
pub mod bgg;

pub fn routes() -> Router<Arc<Global>> {
    Router::new()
        .route("/", get(root))
        .nest("/bgg", bgg::routes())
        .nest("/auth", auth::routes())
}

#[derive(serde::Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
    uptime: u64,
}

#[tracing::instrument(skip(global))]
async fn root(State(global): State<Arc<Global>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Board Game Catalogue API",
        version: env!("CARGO_PKG_VERSION"),
        uptime: global.started_at.elapsed().as_secs(),
    })
}
