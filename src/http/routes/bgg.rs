use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::catalog::details::GameSummary;
use crate::catalog::xml::{parse_hottest, parse_user_collection, CollectionEntry};
use crate::database::game_profile::{GameRef, UserGameProfile};
use crate::global::Global;
use crate::http::error::ApiError;
use crate::http::session::LoggedInUser;

pub fn routes() -> Router<Arc<Global>> {
    Router::new()
        .route("/hottest", get(get_hottest))
        .route("/liked", get(get_liked))
        .route("/log", get(add_log))
        .route("/add", put(add_liked_game))
        .route("/search/{game_id}", get(get_game_by_id))
        .route("/search/image/{game_ids}", get(get_images_by_ids))
        .route("/search/title/{game_title}", get(get_game_by_title))
        .route("/{username}", get(get_user_collection))
}

fn xml_response(body: String) -> Response {
    ([(CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response()
}

/// Splits a comma separated id list, dropping blanks.
fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /api/bgg/hottest
///
/// The current hot list with names and images resolved per game.
#[tracing::instrument(skip(global))]
async fn get_hottest(State(global): State<Arc<Global>>) -> Result<Json<Vec<GameSummary>>, ApiError> {
    let xml = global.catalog.fetch_hottest().await?;
    let hottest = parse_hottest(&xml);

    tracing::debug!(count = hottest.len(), "hot list fetched");

    let ids = hottest.into_iter().map(|entry| entry.id).collect();
    Ok(Json(global.details.fetch_details(ids).await))
}

/// GET /api/bgg/liked
#[tracing::instrument(skip_all, fields(username = %user.username))]
async fn get_liked(
    State(global): State<Arc<Global>>,
    LoggedInUser(user): LoggedInUser,
) -> Result<Json<UserGameProfile>, ApiError> {
    Ok(Json(global.library.get_profile(&user.username).await?))
}

/// GET /api/bgg/log
#[tracing::instrument]
async fn add_log() -> StatusCode {
    tracing::debug!("log received from frontend");
    StatusCode::NO_CONTENT
}

/// PUT /api/bgg/add
#[tracing::instrument(skip_all, fields(username = %user.username, game_id = %game.id))]
async fn add_liked_game(
    State(global): State<Arc<Global>>,
    LoggedInUser(user): LoggedInUser,
    Json(game): Json<GameRef>,
) -> Result<Json<UserGameProfile>, ApiError> {
    Ok(Json(global.library.add_liked_game(&user, game).await?))
}

/// GET /api/bgg/search/{game_id}
///
/// Raw detail document, passed through as XML.
#[tracing::instrument(skip(global))]
async fn get_game_by_id(
    State(global): State<Arc<Global>>,
    Path(game_id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(xml_response(global.catalog.fetch_game_by_id(&game_id).await?))
}

/// GET /api/bgg/search/image/{game_ids}
#[tracing::instrument(skip(global))]
async fn get_images_by_ids(
    State(global): State<Arc<Global>>,
    Path(game_ids): Path<String>,
) -> Json<Vec<GameSummary>> {
    Json(global.details.fetch_details(split_ids(&game_ids)).await)
}

/// GET /api/bgg/search/title/{game_title}
///
/// Raw search results, passed through as XML.
#[tracing::instrument(skip(global))]
async fn get_game_by_title(
    State(global): State<Arc<Global>>,
    Path(game_title): Path<String>,
) -> Result<Response, ApiError> {
    Ok(xml_response(global.catalog.fetch_game_by_title(&game_title).await?))
}

/// GET /api/bgg/{username}
///
/// Games the BoardGameGeek user owns.
#[tracing::instrument(skip(global))]
async fn get_user_collection(
    State(global): State<Arc<Global>>,
    Path(username): Path<String>,
) -> Result<Json<Vec<CollectionEntry>>, ApiError> {
    let xml = global.catalog.fetch_user_collection(&username).await?;
    Ok(Json(parse_user_collection(&xml)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ids() {
        assert_eq!(split_ids("12, 13,,  266192 ,"), vec!["12", "13", "266192"]);
        assert!(split_ids("").is_empty());
        assert!(split_ids(" , ").is_empty());
    }
}
