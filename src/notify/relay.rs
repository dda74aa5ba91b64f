use crate::config::OutboxConfig;
use crate::error::StoreError;
use crate::notify::traits::{Email, Mailer};
use crate::store::OutboxStore;
use chrono::{Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_GRACE_SECS: i64 = 365 * 24 * 60 * 60;

/// Counts from one relay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub sent: usize,
    pub failed: usize,
}

impl RelayReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

/// Re-delivers outbox emails whose inline attempt failed or never finished
pub struct OutboxRelay<S: ?Sized, M: ?Sized> {
    outbox: Arc<S>,
    mailer: Arc<M>,
    config: OutboxConfig,
}

impl<S, M> OutboxRelay<S, M>
where
    S: OutboxStore + ?Sized,
    M: Mailer + ?Sized,
{
    pub fn new(outbox: Arc<S>, mailer: Arc<M>, config: OutboxConfig) -> Self {
        Self {
            outbox,
            mailer,
            config,
        }
    }

    /// One pass over the due messages, one attempt each
    ///
    /// # Errors
    ///
    /// Fails only if the due messages cannot be read; per-message store
    /// errors are logged.
    pub async fn run_once(&self) -> Result<RelayReport, StoreError> {
        let grace_secs = i64::try_from(self.config.pending_grace_secs)
            .unwrap_or(MAX_GRACE_SECS)
            .min(MAX_GRACE_SECS);
        let pending_before = Utc::now() - Duration::seconds(grace_secs);

        let due = self
            .outbox
            .due_emails(self.config.batch_size, self.config.max_attempts, pending_before)
            .await?;
        debug!("{} outbox emails due", due.len());

        let mut report = RelayReport::default();
        for message in due {
            let attempts = message.attempts + 1;
            let email = Email {
                to: message.recipient,
                subject: message.subject,
                html: message.html,
            };

            let outcome = match self.mailer.send(&email).await {
                Ok(()) => {
                    report.sent += 1;
                    info!(outbox_id = %message.id, to = %email.to, attempts, "Outbox email delivered");
                    self.outbox.mark_email_sent(message.id, attempts).await
                }
                Err(e) => {
                    report.failed += 1;
                    let error = e.to_string();
                    if attempts >= self.config.max_attempts {
                        warn!(outbox_id = %message.id, to = %email.to, error = %error, "Giving up on outbox email");
                    } else {
                        warn!(outbox_id = %message.id, to = %email.to, attempts, error = %error, "Outbox email failed, will retry");
                    }
                    self.outbox.mark_email_failed(message.id, attempts, &error).await
                }
            };

            if let Err(e) = outcome {
                warn!(outbox_id = %message.id, error = %e, "Failed to record outbox delivery");
            }
        }

        Ok(report)
    }

    /// Runs a pass every poll interval until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(self.config.poll_interval_secs.max(1)));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => match self.run_once().await {
                    Ok(report) if report.attempted() > 0 => {
                        info!(sent = report.sent, failed = report.failed, "Outbox pass complete");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Outbox pass failed"),
                },
                () = &mut shutdown => {
                    info!("Outbox relay stopping");
                    break;
                }
            }
        }
    }
}
