use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

use crate::auth::{AuthError, UserContext};
use crate::config::SessionConfig;
use crate::http::error::{ApiError, ApiErrorCode};

const SESSION_USER: &str = "auth:user";

/// Session cookie settings. Cross-site frontends need `SameSite=None`, which
/// browsers only accept on secure cookies.
pub fn session_layer<S: SessionStore>(config: &SessionConfig, store: S) -> SessionManagerLayer<S> {
    let same_site = if config.secure_cookie {
        SameSite::None
    } else {
        SameSite::Lax
    };

    SessionManagerLayer::new(store)
        .with_name(config.cookie_name.clone())
        .with_http_only(true)
        .with_secure(config.secure_cookie)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(config.ttl_hours as i64)))
}

/// The logged in user stored in a [`Session`].
pub struct AuthSession<'a> {
    session: &'a Session,
}

impl<'a> AuthSession<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Binds `user` to the session under a fresh id.
    pub async fn sign_in(&self, user: &UserContext) -> Result<(), AuthError> {
        self.session.cycle_id().await?;
        self.session.insert(SESSION_USER, user).await?;
        Ok(())
    }

    pub async fn user(&self) -> Result<Option<UserContext>, AuthError> {
        Ok(self.session.get(SESSION_USER).await?)
    }

    /// Deletes the stored session and expires the cookie.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.flush().await?;
        Ok(())
    }
}

/// Rejects the request with 401 unless it carries a live session.
pub struct LoggedInUser(pub UserContext);

impl<S> FromRequestParts<S> for LoggedInUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await.map_err(|(_, reason)| {
            tracing::error!(reason, "session layer missing");
            ApiError::internal_server_error(ApiErrorCode::INTERNAL_ERROR, "internal error")
        })?;

        let user = AuthSession::new(&session).user().await?.ok_or(AuthError::Unauthorized)?;

        Ok(Self(user))
    }
}
