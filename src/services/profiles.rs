use crate::error::{Result, StoreError};
use crate::models::{Profile, ProfileUpdate};
use crate::store::ProfileStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct ProfileService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ProfileStore + ?Sized> ProfileService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Profile>> {
        Ok(self.store.get_profile(id).await?)
    }

    /// Only the name and phone can change
    pub async fn update(&self, profile: &Profile, update: ProfileUpdate) -> Result<Profile> {
        if update == ProfileUpdate::default() {
            return Ok(self
                .store
                .get_profile(profile.id)
                .await?
                .ok_or(StoreError::NotFound {
                    entity: "profile",
                    id: profile.id,
                })?);
        }

        let updated = self.store.update_profile(profile.id, &update).await?;
        info!(profile_id = %profile.id, "Profile updated");
        Ok(updated)
    }
}
