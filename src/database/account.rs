use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::StoreError;

pub const COLLECTION: &str = "user";

/// Handle used when a user signs up without a BoardGameGeek account.
pub const GUEST_HANDLE: &str = "guest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    /// bcrypt hash, never the plain password.
    pub password: String,
    #[serde(rename = "bggUser")]
    pub bgg_user: String,
    pub created_at: bson::DateTime,
}

impl Account {
    pub fn new(username: String, password_hash: String, bgg_user: Option<String>) -> Self {
        let bgg_user = bgg_user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| GUEST_HANDLE.to_string());

        Self {
            id: ObjectId::new(),
            username,
            password: password_hash,
            bgg_user,
            created_at: bson::DateTime::now(),
        }
    }

    pub fn collection(db: &mongodb::Database) -> mongodb::Collection<Self> {
        db.collection(COLLECTION)
    }

    #[tracing::instrument(skip(db))]
    pub async fn find_by_username(db: &mongodb::Database, username: &str) -> Result<Option<Self>, StoreError> {
        Ok(Self::collection(db).find_one(doc! { "username": username }).await?)
    }

    /// Fails with [`StoreError::Duplicate`] when the username is taken.
    #[tracing::instrument(skip_all, fields(username = %self.username))]
    pub async fn insert(&self, db: &mongodb::Database) -> Result<(), StoreError> {
        Self::collection(db).insert_one(self).await?;
        Ok(())
    }

    #[tracing::instrument(skip(db))]
    pub async fn delete(db: &mongodb::Database, id: ObjectId) -> Result<(), StoreError> {
        Self::collection(db).delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}
