use crate::error::NotifyError;
use crate::notify::templates::html_to_text;
use crate::notify::traits::{Email, Mailer};
use async_trait::async_trait;
use tracing::info;

/// Mailer that logs emails instead of sending them
///
/// Used when no send-email endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "📧 Email (development mode)\n{}",
            html_to_text(&email.html)
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
