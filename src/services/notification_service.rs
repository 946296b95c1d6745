use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    notification::{NewNotification, Notification},
    user::Actor,
};
use crate::services::policy::{Action, Policy};
use crate::store::{Page, Paged, Store};

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records a notification for a change that has already been committed.
    /// A failure here is logged and does not undo that change.
    pub async fn emit(&self, notification: NewNotification) -> Option<Notification> {
        let recipient_id = notification.recipient_id;
        let kind = notification.notification_type;
        match self.store.insert_notification(notification).await {
            Ok(created) => {
                tracing::debug!(
                    notification_id = %created.id,
                    recipient_id = %recipient_id,
                    "notification recorded"
                );
                Some(created)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    recipient_id = %recipient_id,
                    notification_type = kind.as_str(),
                    "failed to record notification"
                );
                None
            }
        }
    }

    pub async fn list(&self, actor: &Actor, page: Page) -> Result<Paged<Notification>> {
        self.store.list_notifications(actor.id, page).await
    }

    pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> Result<Notification> {
        let notification = self.store.find_notification(id).await?;
        Policy::can(actor, Action::ReadNotification(notification.as_ref()))?;
        self.store.mark_notification_read(id).await
    }

    pub async fn mark_all_read(&self, actor: &Actor) -> Result<u64> {
        let updated = self.store.mark_all_read(actor.id).await?;
        tracing::info!(user_id = %actor.id, updated, "notifications marked read");
        Ok(updated)
    }
}

