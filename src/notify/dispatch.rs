use crate::models::{DeliveryStatus, NewOutboxMessage};
use crate::notify::traits::{Email, Mailer};
use crate::store::OutboxStore;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a single best-effort delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent { outbox_id: Option<Uuid> },
    /// Delivery failed; the outbox row, if any, is left for the relay
    Failed {
        outbox_id: Option<Uuid>,
        error: String,
    },
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Records each email in the outbox and makes one delivery attempt
///
/// Nothing here returns an error: callers report success regardless, and a
/// failed send stays observable in the outbox.
pub struct Dispatcher<S: ?Sized, M: ?Sized> {
    outbox: Arc<S>,
    mailer: Arc<M>,
}

impl<S: ?Sized, M: ?Sized> Clone for Dispatcher<S, M> {
    fn clone(&self) -> Self {
        Self {
            outbox: Arc::clone(&self.outbox),
            mailer: Arc::clone(&self.mailer),
        }
    }
}

impl<S, M> Dispatcher<S, M>
where
    S: OutboxStore + ?Sized,
    M: Mailer + ?Sized,
{
    pub fn new(outbox: Arc<S>, mailer: Arc<M>) -> Self {
        Self { outbox, mailer }
    }

    pub async fn dispatch(&self, email: Email) -> Delivery {
        let outbox_id = match self
            .outbox
            .enqueue_email(NewOutboxMessage {
                recipient: email.to.clone(),
                subject: email.subject.clone(),
                html: email.html.clone(),
                status: DeliveryStatus::Pending,
                attempts: 0,
            })
            .await
        {
            Ok(message) => Some(message.id),
            Err(e) => {
                warn!(to = %email.to, error = %e, "Failed to record email in outbox, sending anyway");
                None
            }
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                info!(to = %email.to, subject = %email.subject, mailer = self.mailer.name(), "Email sent");
                if let Some(id) = outbox_id {
                    if let Err(e) = self.outbox.mark_email_sent(id, 1).await {
                        warn!(outbox_id = %id, error = %e, "Failed to mark outbox email as sent");
                    }
                }
                Delivery::Sent { outbox_id }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(to = %email.to, subject = %email.subject, error = %error, "Failed to send email notification");
                if let Some(id) = outbox_id {
                    if let Err(e) = self.outbox.mark_email_failed(id, 1, &error).await {
                        warn!(outbox_id = %id, error = %e, "Failed to record email failure in outbox");
                    }
                }
                Delivery::Failed { outbox_id, error }
            }
        }
    }
}
