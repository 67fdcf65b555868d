use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::catalog::xml::CollectionEntry;

pub const COLLECTION: &str = "game";

/// A game as stored in a user's lists. Identity is the catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<CollectionEntry> for GameRef {
    fn from(entry: CollectionEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            image: None,
        }
    }
}

/// Per-user liked (wishlist) and super liked (owned) games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGameProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub liked_games_array: Vec<GameRef>,
    #[serde(default)]
    pub super_liked_games: Vec<GameRef>,
}

impl UserGameProfile {
    pub fn empty(id: String, username: String) -> Self {
        Self {
            id,
            username,
            liked_games_array: Vec::new(),
            super_liked_games: Vec::new(),
        }
    }
}

/// Persistence needed by the library. Implementations must make
/// [`ProfileStore::add_liked_game`] a single atomic set insert.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, username: &str) -> Result<Option<UserGameProfile>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the username already has a profile.
    async fn insert(&self, profile: &UserGameProfile) -> Result<(), StoreError>;

    /// Adds `game` to the liked list unless a game with the same id is
    /// already there. Returns the profile after the update, or `None` when
    /// no profile exists for `username`.
    async fn add_liked_game(&self, username: &str, game: &GameRef) -> Result<Option<UserGameProfile>, StoreError>;
}

/// Matches `username`'s profile only while no liked game has `game_id`, so a
/// repeated add finds nothing to update.
fn liked_game_filter(username: &str, game_id: &str) -> Document {
    doc! { "username": username, "likedGamesArray.id": { "$ne": game_id } }
}

fn liked_game_push(game: &GameRef) -> Result<Document, StoreError> {
    Ok(doc! { "$push": { "likedGamesArray": bson::to_bson(game)? } })
}

#[derive(Debug, Clone)]
pub struct MongoProfileStore {
    collection: mongodb::Collection<UserGameProfile>,
}

impl MongoProfileStore {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }
}

#[async_trait::async_trait]
impl ProfileStore for MongoProfileStore {
    #[tracing::instrument(skip(self))]
    async fn find(&self, username: &str) -> Result<Option<UserGameProfile>, StoreError> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    #[tracing::instrument(skip_all, fields(username = %profile.username))]
    async fn insert(&self, profile: &UserGameProfile) -> Result<(), StoreError> {
        self.collection.insert_one(profile).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, game), fields(game_id = %game.id))]
    async fn add_liked_game(&self, username: &str, game: &GameRef) -> Result<Option<UserGameProfile>, StoreError> {
        let updated = self
            .collection
            .find_one_and_update(liked_game_filter(username, &game.id), liked_game_push(game)?)
            .return_document(ReturnDocument::After)
            .await?;

        match updated {
            Some(profile) => Ok(Some(profile)),
            // Either the game is already listed or there is no profile.
            None => self.find(username).await,
        }
    }
}
