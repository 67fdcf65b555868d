use mongodb::error::{ErrorKind, WriteFailure};

pub mod account;
pub mod game_profile;
pub mod session;

#[cfg(test)]
pub mod memory;

/// MongoDB's duplicate key error code.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document already exists")]
    Duplicate,
    #[error(transparent)]
    Mongo(mongodb::error::Error),
    #[error(transparent)]
    Encode(#[from] bson::ser::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        if is_duplicate_key(&e) {
            Self::Duplicate
        } else {
            Self::Mongo(e)
        }
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == DUPLICATE_KEY
    )
}

/// A fresh, uniquely named database on the server named by
/// `APP__DATABASE__URI`. Tests that need a real Mongo return early without it.
#[cfg(test)]
pub async fn test_database() -> Option<mongodb::Database> {
    let uri = std::env::var("APP__DATABASE__URI").ok()?;
    let client = mongodb::Client::with_uri_str(&uri)
        .await
        .expect("APP__DATABASE__URI is set but not usable");

    Some(client.database(&format!("boardgame_test_{}", uuid::Uuid::new_v4().simple())))
}
