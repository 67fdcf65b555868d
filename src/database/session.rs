use mongodb::bson::doc;
use serde::{Deserialize, Serialize};
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};

use super::StoreError;

pub const COLLECTION: &str = "session";

/// A login session as stored in Mongo. A TTL index on `expires_at` removes
/// dead sessions.
#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "_id")]
    id: String,
    data: bson::Document,
    expires_at: bson::DateTime,
}

impl SessionDocument {
    fn from_record(record: &Record) -> session_store::Result<Self> {
        let data = bson::to_document(&record.data).map_err(|e| session_store::Error::Encode(e.to_string()))?;

        Ok(Self {
            id: record.id.to_string(),
            data,
            expires_at: bson::DateTime::from_time_0_3(record.expiry_date),
        })
    }

    fn into_record(self) -> session_store::Result<Record> {
        let id = self
            .id
            .parse::<Id>()
            .map_err(|e| session_store::Error::Decode(format!("bad session id {}: {e}", self.id)))?;
        let data = bson::from_document(self.data).map_err(|e| session_store::Error::Decode(e.to_string()))?;

        Ok(Record {
            id,
            data,
            expiry_date: self.expires_at.to_time_0_3(),
        })
    }
}

fn backend(e: impl std::fmt::Display) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

/// [`SessionStore`] backed by the `session` collection.
#[derive(Debug, Clone)]
pub struct MongoSessionStore {
    collection: mongodb::Collection<SessionDocument>,
}

impl MongoSessionStore {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MongoSessionStore {
    #[tracing::instrument(skip_all)]
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            let document = SessionDocument::from_record(record)?;
            match self.collection.insert_one(&document).await.map_err(StoreError::from) {
                Ok(_) => return Ok(()),
                Err(StoreError::Duplicate) => {
                    tracing::debug!("session id collision, regenerating");
                    record.id = Id::default();
                }
                Err(e) => return Err(backend(e)),
            }
        }
    }

    #[tracing::instrument(skip_all)]
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let document = SessionDocument::from_record(record)?;

        self.collection
            .replace_one(doc! { "_id": document.id.as_str() }, &document)
            .upsert(true)
            .await
            .map_err(backend)?;

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        // The TTL sweep runs about once a minute, so expiry is checked here too.
        let found = self
            .collection
            .find_one(doc! {
                "_id": session_id.to_string(),
                "expires_at": { "$gt": bson::DateTime::now() },
            })
            .await
            .map_err(backend)?;

        found.map(SessionDocument::into_record).transpose()
    }

    #[tracing::instrument(skip_all)]
    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.collection
            .delete_one(doc! { "_id": session_id.to_string() })
            .await
            .map_err(backend)?;

        Ok(())
    }
}
