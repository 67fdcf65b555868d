use std::borrow::Cow;

use axum::response::IntoResponse;
use axum::Json;
use hyper::StatusCode;

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::library::LibraryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ApiErrorCode(pub u16);

impl ApiErrorCode {
	/// The requested route does not exist.
	pub const ROUTE_NOT_FOUND: Self = Self(404);
	/// BoardGameGeek could not be reached or answered with an error.
	pub const UPSTREAM_FETCH_FAILED: Self = Self(1000);
	/// The user has no game profile.
	pub const PROFILE_NOT_FOUND: Self = Self(2000);
	/// A game profile already exists for this user.
	pub const DUPLICATE_USER: Self = Self(2001);
	/// The submitted game has no id.
	pub const INVALID_GAME: Self = Self(2002);
	/// A database query failed unexpectedly.
	pub const DATABASE_ERROR: Self = Self(3000);
	pub const MISSING_CREDENTIALS: Self = Self(4000);
	pub const INVALID_CREDENTIALS: Self = Self(4001);
	pub const USERNAME_TAKEN: Self = Self(4002);
	/// The request has no live session.
	pub const UNAUTHORIZED: Self = Self(4003);
	pub const INTERNAL_ERROR: Self = Self(5000);
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiError {
	#[serde(skip)]
	pub status_code: StatusCode,
	pub status: Cow<'static, str>,
	pub error_code: ApiErrorCode,
	pub error: Cow<'static, str>,
}

impl ApiError {
	pub fn new(status_code: StatusCode, error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self {
			status_code,
			status: status_code.canonical_reason().unwrap_or("unknown").into(),
			error_code,
			error: error.into(),
		}
	}

	pub fn bad_request(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, error_code, error)
	}

	pub fn unauthorized(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::UNAUTHORIZED, error_code, error)
	}

	pub fn not_found(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::NOT_FOUND, error_code, error)
	}

	pub fn conflict(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::CONFLICT, error_code, error)
	}

	pub fn bad_gateway(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::BAD_GATEWAY, error_code, error)
	}

	pub fn internal_server_error(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR, error_code, error)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> axum::http::Response<axum::body::Body> {
		(self.status_code, Json(self)).into_response()
	}
}

impl From<CatalogError> for ApiError {
	fn from(e: CatalogError) -> Self {
		tracing::error!(error = %e, "catalog request failed");
		Self::bad_gateway(ApiErrorCode::UPSTREAM_FETCH_FAILED, "could not fetch data from boardgamegeek")
	}
}

impl From<LibraryError> for ApiError {
	fn from(e: LibraryError) -> Self {
		match e {
			LibraryError::NotFound(_) => Self::not_found(ApiErrorCode::PROFILE_NOT_FOUND, "game profile not found"),
			LibraryError::DuplicateUser(_) => Self::conflict(ApiErrorCode::DUPLICATE_USER, "game profile already exists"),
			LibraryError::InvalidGame => Self::bad_request(ApiErrorCode::INVALID_GAME, "game id is required"),
			LibraryError::Persistence(e) => {
				tracing::error!(error = %e, "profile store failed");
				Self::internal_server_error(ApiErrorCode::DATABASE_ERROR, "failed to access game profile")
			}
		}
	}
}

impl From<AuthError> for ApiError {
	fn from(e: AuthError) -> Self {
		match e {
			AuthError::MissingCredentials => Self::bad_request(ApiErrorCode::MISSING_CREDENTIALS, e.to_string()),
			AuthError::InvalidCredentials => Self::unauthorized(ApiErrorCode::INVALID_CREDENTIALS, e.to_string()),
			AuthError::UsernameTaken => Self::conflict(ApiErrorCode::USERNAME_TAKEN, e.to_string()),
			AuthError::Unauthorized => Self::unauthorized(ApiErrorCode::UNAUTHORIZED, e.to_string()),
			AuthError::Library(e) => e.into(),
			AuthError::Persistence(e) => {
				tracing::error!(error = %e, "account store failed");
				Self::internal_server_error(ApiErrorCode::DATABASE_ERROR, "failed to access accounts")
			}
			AuthError::Hash(e) => {
				tracing::error!(error = %e, "password hashing failed");
				Self::internal_server_error(ApiErrorCode::INTERNAL_ERROR, "internal error")
			}
			AuthError::Session(e) => {
				tracing::error!(error = %e, "session store failed");
				Self::internal_server_error(ApiErrorCode::INTERNAL_ERROR, "internal error")
			}
		}
	}
}
