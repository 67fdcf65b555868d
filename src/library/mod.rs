//! A user's liked and owned games.
//!
//! The persisted profile only ever changes through [`Library::add_liked_game`].
//! The login view merges the stored lists with what the catalog reports and is
//! never written back.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::auth::UserContext;
use crate::catalog::xml::parse_user_collection;
use crate::catalog::{CatalogClient, CatalogError};
use crate::database::game_profile::{GameRef, ProfileStore, UserGameProfile};
use crate::database::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("no game profile for user {0}")]
    NotFound(String),
    #[error("user {0} already has a game profile")]
    DuplicateUser(String),
    #[error("game is missing an id")]
    InvalidGame,
    #[error("profile store failed: {0}")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for LibraryError {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e)
    }
}

#[derive(Clone)]
pub struct Library {
    store: Arc<dyn ProfileStore>,
}

impl Library {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Makes sure `game` is in the user's liked list and returns the profile,
    /// whether or not the game was already there.
    #[tracing::instrument(skip(self, user, game), fields(username = %user.username, game_id = %game.id))]
    pub async fn add_liked_game(&self, user: &UserContext, game: GameRef) -> Result<UserGameProfile, LibraryError> {
        let game = GameRef {
            id: game.id.trim().to_string(),
            ..game
        };
        if game.id.is_empty() {
            return Err(LibraryError::InvalidGame);
        }

        let profile = self
            .store
            .add_liked_game(&user.username, &game)
            .await?
            .ok_or_else(|| LibraryError::NotFound(user.username.clone()))?;

        tracing::info!(liked = profile.liked_games_array.len(), "liked game stored");

        Ok(profile)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_profile(&self, username: &str) -> Result<UserGameProfile, LibraryError> {
        self.store
            .find(username)
            .await?
            .ok_or_else(|| LibraryError::NotFound(username.to_string()))
    }

    /// Creates the empty profile a new account starts with.
    #[tracing::instrument(skip_all, fields(username = %user.username))]
    pub async fn initialize_profile(&self, user: &UserContext) -> Result<UserGameProfile, LibraryError> {
        if self.store.find(&user.username).await?.is_some() {
            return Err(LibraryError::DuplicateUser(user.username.clone()));
        }

        let profile = UserGameProfile::empty(user.id.clone(), user.username.clone());
        match self.store.insert(&profile).await {
            Ok(()) => {}
            Err(StoreError::Duplicate) => return Err(LibraryError::DuplicateUser(user.username.clone())),
            Err(e) => return Err(e.into()),
        }

        tracing::info!("game profile created");

        Ok(profile)
    }
}

/// What a client sees right after logging in: the identity plus the games the
/// user likes and owns, locally and according to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginView {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(rename = "bggUser")]
    pub bgg_user: String,
    #[serde(rename = "likedGamesArray")]
    pub liked_games_array: Vec<GameRef>,
    #[serde(rename = "superLikedGames")]
    pub super_liked_games: Vec<GameRef>,
}

/// Stored entries come first, catalog entries with an id already listed are
/// dropped.
pub fn compose_login_view(
    user: &UserContext,
    stored: Option<&UserGameProfile>,
    owned: Vec<GameRef>,
    wanted: Vec<GameRef>,
) -> LoginView {
    let (liked, super_liked) = match stored {
        Some(profile) => (profile.liked_games_array.clone(), profile.super_liked_games.clone()),
        None => (Vec::new(), Vec::new()),
    };

    LoginView {
        id: user.id.clone(),
        username: user.username.clone(),
        bgg_user: user.bgg_user.clone(),
        liked_games_array: unique_games(liked.into_iter().chain(wanted).collect()),
        super_liked_games: unique_games(super_liked.into_iter().chain(owned).collect()),
    }
}

/// Looks up the user's owned games and wishlist on the catalog and builds the
/// login view around the stored profile. Any lookup that fails contributes
/// nothing.
#[tracing::instrument(skip_all, fields(username = %user.username, bgg_user = %user.bgg_user))]
pub async fn load_login_view(catalog: &CatalogClient, user: &UserContext, stored: Option<&UserGameProfile>) -> LoginView {
    if !user.has_catalog_account() {
        return compose_login_view(user, stored, Vec::new(), Vec::new());
    }

    let (owned, wanted) = tokio::join!(
        catalog.fetch_user_collection(&user.bgg_user),
        catalog.fetch_user_wishlist(&user.bgg_user),
    );

    compose_login_view(
        user,
        stored,
        collection_games(owned, "owned"),
        collection_games(wanted, "wishlist"),
    )
}

fn collection_games(result: Result<String, CatalogError>, list: &'static str) -> Vec<GameRef> {
    match result {
        Ok(xml) => parse_user_collection(&xml).into_iter().map(GameRef::from).collect(),
        Err(e) => {
            tracing::warn!(list, error = %e, "catalog collection lookup failed");
            Vec::new()
        }
    }
}

/// Keeps the first occurrence of each game id.
fn unique_games(games: Vec<GameRef>) -> Vec<GameRef> {
    let mut seen = HashSet::new();
    games.into_iter().filter(|g| seen.insert(g.id.clone())).collect()
}
