use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tower_sessions::Session;

use crate::auth::{self, Credentials, SignupRequest};
use crate::global::Global;
use crate::http::error::ApiError;
use crate::http::session::AuthSession;
use crate::library::LoginView;

pub fn routes() -> Router<Arc<Global>> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/logout", post(logout))
}

/// POST /api/auth/login
#[tracing::instrument(skip_all, fields(username = %creds.username))]
async fn login(
    State(global): State<Arc<Global>>,
    session: Session,
    Json(creds): Json<Credentials>,
) -> Result<Json<LoginView>, ApiError> {
    let outcome = auth::login(&global, creds).await?;
    AuthSession::new(&session).sign_in(&outcome.user).await?;

    Ok(Json(outcome.view))
}

/// POST /api/auth/signup
///
/// Creates the account and its empty game profile, then logs in.
#[tracing::instrument(skip_all, fields(username = %req.username))]
async fn signup(
    State(global): State<Arc<Global>>,
    session: Session,
    Json(req): Json<SignupRequest>,
) -> Result<Json<LoginView>, ApiError> {
    let outcome = auth::signup(&global, req).await?;
    AuthSession::new(&session).sign_in(&outcome.user).await?;

    Ok(Json(outcome.view))
}

/// POST /api/auth/logout
#[tracing::instrument(skip_all)]
async fn logout(session: Session) -> Result<StatusCode, ApiError> {
    AuthSession::new(&session).sign_out().await?;
    tracing::debug!("session removed");

    Ok(StatusCode::NO_CONTENT)
}
