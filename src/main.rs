use anyhow::Context;
use rental_market::config::AppConfig;
use rental_market::notify::{ConsoleMailer, HttpMailer, Mailer, OutboxRelay};
use rental_market::store::RestStore;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let once = std::env::args().skip(1).any(|arg| arg == "--once");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let store = Arc::new(RestStore::new(&config.store).context("Failed to create store client")?);

    let mailer: Arc<dyn Mailer> = match &config.mailer.endpoint {
        Some(endpoint) => Arc::new(
            HttpMailer::new(endpoint.clone(), &config.mailer)
                .context("Failed to create mail client")?,
        ),
        None => {
            warn!("RENTAL_MAIL_ENDPOINT not set, emails will only be logged");
            Arc::new(ConsoleMailer::new())
        }
    };

    info!("📬 Rental market outbox relay");
    info!(
        mailer = mailer.name(),
        poll_secs = config.outbox.poll_interval_secs,
        batch_size = config.outbox.batch_size,
        max_attempts = config.outbox.max_attempts,
        "Relay configured"
    );

    let relay = OutboxRelay::new(store, mailer, config.outbox);

    if once {
        let report = relay.run_once().await.context("Outbox pass failed")?;
        info!("✅ Sent {} emails, {} failed", report.sent, report.failed);
        return Ok(());
    }

    relay
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
