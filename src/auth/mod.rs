use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::database::account::{Account, GUEST_HANDLE};
use crate::database::StoreError;
use crate::global::Global;
use crate::library::{load_login_view, LibraryError, LoginView};

pub mod password;

/// The logged in user, passed explicitly to everything that acts on their
/// behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(rename = "bggUser")]
    pub bgg_user: String,
}

impl UserContext {
    pub fn has_catalog_account(&self) -> bool {
        !self.bgg_user.is_empty() && self.bgg_user != GUEST_HANDLE
    }
}

impl From<&Account> for UserContext {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_hex(),
            username: account.username.clone(),
            bgg_user: account.bgg_user.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username already taken")]
    UsernameTaken,
    #[error("not logged in")]
    Unauthorized,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error("session store failed: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "bggUser", default)]
    pub bgg_user: Option<String>,
}

/// Result of a successful login: who logged in and the view to send back.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserContext,
    pub view: LoginView,
}

fn require_credentials(username: &str, password: &str) -> Result<String, AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(username.to_string())
}

#[tracing::instrument(skip_all, fields(username = %req.username))]
pub async fn signup(global: &Arc<Global>, req: SignupRequest) -> Result<LoginOutcome, AuthError> {
    let username = require_credentials(&req.username, &req.password)?;

    if Account::find_by_username(&global.db, &username).await?.is_some() {
        return Err(AuthError::UsernameTaken);
    }

    let hash = password::hash_password(req.password.clone(), password::HASH_COST).await?;
    let account = Account::new(username.clone(), hash, req.bgg_user);

    match account.insert(&global.db).await {
        Ok(()) => {}
        Err(StoreError::Duplicate) => return Err(AuthError::UsernameTaken),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(bgg_user = %account.bgg_user, "account created");

    // An account without a game profile cannot use the library, so it does
    // not survive a failed profile setup.
    if let Err(e) = global.library.initialize_profile(&UserContext::from(&account)).await {
        tracing::warn!(error = %e, "game profile setup failed, removing account");
        Account::delete(&global.db, account.id).await?;
        return Err(e.into());
    }

    login(
        global,
        Credentials {
            username,
            password: req.password,
        },
    )
    .await
}

/// Checks the credentials and builds the login view. Starting the session is
/// left to the caller.
#[tracing::instrument(skip_all, fields(username = %creds.username))]
pub async fn login(global: &Arc<Global>, creds: Credentials) -> Result<LoginOutcome, AuthError> {
    let username = require_credentials(&creds.username, &creds.password)?;

    let account = Account::find_by_username(&global.db, &username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify_password(creds.password, account.password.clone()).await? {
        tracing::info!("password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    let user = UserContext::from(&account);

    let stored = match global.library.get_profile(&user.username).await {
        Ok(profile) => Some(profile),
        Err(LibraryError::NotFound(_)) => {
            tracing::warn!("account has no game profile");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let view = load_login_view(&global.catalog, &user, stored.as_ref()).await;

    tracing::info!(
        owned = view.super_liked_games.len(),
        wanted = view.liked_games_array.len(),
        "user logged in"
    );

    Ok(LoginOutcome { user, view })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::test_global;

    #[test]
    fn test_require_credentials() {
        assert_eq!(require_credentials(" al ", "pw").unwrap(), "al");
        assert!(matches!(require_credentials("", "pw"), Err(AuthError::MissingCredentials)));
        assert!(matches!(require_credentials("   ", "pw"), Err(AuthError::MissingCredentials)));
        assert!(matches!(require_credentials("al", ""), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_account_into_context() {
        let account = Account::new("al".into(), "hash".into(), None);
        let user = UserContext::from(&account);

        assert_eq!(user.id, account.id.to_hex());
        assert_eq!(user.username, "al");
        assert!(!user.has_catalog_account());
    }

    #[test]
    fn test_signup_request_defaults_handle() {
        let req: SignupRequest =
            serde_json::from_str(r#"{"username":"al","password":"pw"}"#).unwrap();

        assert!(req.bgg_user.is_none());
        assert_eq!(Account::new(req.username, "h".into(), req.bgg_user).bgg_user, GUEST_HANDLE);
    }

    #[tokio::test]
    async fn test_signup_removes_account_when_profile_setup_fails() {
        let Some(global) = test_global().await else {
            return;
        };

        // A leftover profile under the same username makes setup fail.
        let leftover = UserContext {
            id: "old".into(),
            username: "al".into(),
            bgg_user: GUEST_HANDLE.into(),
        };
        global.library.initialize_profile(&leftover).await.unwrap();

        let err = signup(
            &global,
            SignupRequest {
                username: "al".into(),
                password: "pw".into(),
                bgg_user: None,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AuthError::Library(LibraryError::DuplicateUser(_))));
        assert!(Account::find_by_username(&global.db, "al").await.unwrap().is_none());

        global.db.drop().await.unwrap();
    }

    #[tokio::test]
    async fn test_login_view_includes_stored_likes() {
        let Some(global) = test_global().await else {
            return;
        };

        let signed_up = signup(
            &global,
            SignupRequest {
                username: "al".into(),
                password: "pw".into(),
                bgg_user: None,
            },
        )
        .await
        .unwrap();
        assert!(signed_up.view.liked_games_array.is_empty());

        let game = crate::database::game_profile::GameRef {
            id: "5".into(),
            name: "Azul".into(),
            image: None,
        };
        global.library.add_liked_game(&signed_up.user, game.clone()).await.unwrap();

        let outcome = login(
            &global,
            Credentials {
                username: "al".into(),
                password: "pw".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.user, signed_up.user);
        assert_eq!(outcome.view.liked_games_array, vec![game]);

        global.db.drop().await.unwrap();
    }
}
