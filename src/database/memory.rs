use std::collections::HashMap;
use std::sync::Mutex;

use super::game_profile::{GameRef, ProfileStore, UserGameProfile};
use super::StoreError;

/// In-process [`ProfileStore`] for tests. The lock makes each operation
/// atomic the way a single Mongo update is.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, UserGameProfile>>,
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find(&self, username: &str) -> Result<Option<UserGameProfile>, StoreError> {
        Ok(self.profiles.lock().unwrap().get(username).cloned())
    }

    async fn insert(&self, profile: &UserGameProfile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.lock().unwrap();
        if profiles.contains_key(&profile.username) {
            return Err(StoreError::Duplicate);
        }
        profiles.insert(profile.username.clone(), profile.clone());
        Ok(())
    }

    async fn add_liked_game(&self, username: &str, game: &GameRef) -> Result<Option<UserGameProfile>, StoreError> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(username) else {
            return Ok(None);
        };

        if !profile.liked_games_array.iter().any(|g| g.id == game.id) {
            profile.liked_games_array.push(game.clone());
        }

        Ok(Some(profile.clone()))
    }
}
