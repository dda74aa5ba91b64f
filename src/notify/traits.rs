use crate::error::NotifyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload accepted by the send-email endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Common trait for email delivery
///
/// Implementations make exactly one delivery attempt per call; retrying is
/// the outbox relay's job.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
