use crate::config::MailerConfig;
use crate::error::NotifyError;
use crate::notify::traits::{Email, Mailer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Mailer that posts `{to, subject, html}` to the app's send-email endpoint
pub struct HttpMailer {
    client: Client,
    endpoint: String,
}

/// Error payload returned by the endpoint on failure
#[derive(Debug, Deserialize)]
struct EndpointError {
    error: Option<String>,
    message: Option<String>,
}

impl HttpMailer {
    pub fn new(endpoint: impl Into<String>, config: &MailerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create mail HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        debug!("Posting email for {} to {}", email.to, self.endpoint);

        let response = self.client.post(&self.endpoint).json(email).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<EndpointError>(&body) {
            Ok(EndpointError {
                error: Some(error),
                message: Some(detail),
            }) => format!("{error}: {detail}"),
            Ok(EndpointError {
                error: Some(text), ..
            })
            | Ok(EndpointError {
                message: Some(text),
                ..
            }) => text,
            _ => body,
        };

        Err(NotifyError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
