use crate::error::{Result, StoreError};
use crate::models::{Profile, Property};
use crate::store::FavoriteStore;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct FavoriteService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: FavoriteStore + ?Sized> FavoriteService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adding an existing favorite is a no-op
    pub async fn add(&self, user: &Profile, property_id: Uuid) -> Result<()> {
        match self.store.add_favorite(user.id, property_id).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict(_)) => {
                debug!(user_id = %user.id, %property_id, "Already a favorite");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, user: &Profile, property_id: Uuid) -> Result<()> {
        self.store.remove_favorite(user.id, property_id).await?;
        Ok(())
    }

    /// Returns whether the property is a favorite afterwards
    pub async fn toggle(&self, user: &Profile, property_id: Uuid) -> Result<bool> {
        if self.store.is_favorite(user.id, property_id).await? {
            self.remove(user, property_id).await?;
            Ok(false)
        } else {
            self.add(user, property_id).await?;
            Ok(true)
        }
    }

    pub async fn is_favorite(&self, user: &Profile, property_id: Uuid) -> Result<bool> {
        Ok(self.store.is_favorite(user.id, property_id).await?)
    }

    pub async fn list(&self, user: &Profile) -> Result<Vec<Property>> {
        Ok(self.store.favorite_properties(user.id).await?)
    }
}
