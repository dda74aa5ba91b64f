use crate::error::Result;
use crate::models::{Notification, Profile};
use crate::store::NotificationStore;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A user's in-app notifications
pub struct InboxService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: NotificationStore + ?Sized> InboxService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user: &Profile) -> Result<Vec<Notification>> {
        Ok(self.store.notifications_for_user(user.id).await?)
    }

    pub async fn unread_count(&self, user: &Profile) -> Result<usize> {
        let notifications = self.store.notifications_for_user(user.id).await?;
        Ok(notifications.iter().filter(|n| !n.is_read).count())
    }

    /// Returns false if the notification is not the user's
    pub async fn mark_read(&self, user: &Profile, notification_id: Uuid) -> Result<bool> {
        let found = self
            .store
            .mark_notification_read(user.id, notification_id)
            .await?;
        if !found {
            debug!(user_id = %user.id, %notification_id, "Notification not found for user");
        }
        Ok(found)
    }

    pub async fn mark_all_read(&self, user: &Profile) -> Result<u64> {
        Ok(self.store.mark_all_notifications_read(user.id).await?)
    }
}
