//! Configuration management.
//!
//! Loads configuration from environment variables (optionally seeded from a
//! `.env` file) with defaults for everything except the store credentials.

use crate::booking::{BookingPolicy, OverlapPolicy, TransitionPolicy};
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub mailer: MailerConfig,
    pub branding: EmailBranding,
    pub booking: BookingPolicy,
    pub outbox: OutboxConfig,
}

/// Hosted REST backend connection.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://project.example.co`
    pub url: String,
    /// Public API key sent as `apikey`
    pub api_key: String,
    /// User session token; the API key is used as bearer when absent
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Send-email endpoint. Without an endpoint, emails are logged.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl MailerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Values shared by all email templates.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailBranding {
    /// Public URL of the web app, used for links
    pub app_url: String,
    pub brand_name: String,
}

impl Default for EmailBranding {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".to_string(),
            brand_name: "Smart house: your rental services".to_string(),
        }
    }
}

/// Outbox relay tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxConfig {
    pub poll_interval_secs: u64,
    pub batch_size: usize,
    pub max_attempts: u32,
    /// Pending messages younger than this are left to their inline attempt
    pub pending_grace_secs: u64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            batch_size: 50,
            max_attempts: 5,
            pending_grace_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let branding_defaults = EmailBranding::default();
        let outbox_defaults = OutboxConfig::default();

        Ok(Self {
            store: StoreConfig {
                url: vars.required("RENTAL_STORE_URL")?,
                api_key: vars.required("RENTAL_STORE_API_KEY")?,
                access_token: vars.optional("RENTAL_STORE_ACCESS_TOKEN"),
                timeout_secs: vars.parsed("RENTAL_STORE_TIMEOUT_SECS", 30)?,
            },
            mailer: MailerConfig {
                endpoint: vars.optional("RENTAL_MAIL_ENDPOINT"),
                timeout_secs: vars.parsed("RENTAL_MAIL_TIMEOUT_SECS", 15)?,
            },
            branding: EmailBranding {
                app_url: vars
                    .optional("RENTAL_APP_URL")
                    .unwrap_or(branding_defaults.app_url),
                brand_name: vars
                    .optional("RENTAL_BRAND_NAME")
                    .unwrap_or(branding_defaults.brand_name),
            },
            booking: BookingPolicy {
                overlap: vars.parsed("RENTAL_OVERLAP_POLICY", OverlapPolicy::default())?,
                transitions: vars
                    .parsed("RENTAL_TRANSITION_POLICY", TransitionPolicy::default())?,
            },
            outbox: OutboxConfig {
                poll_interval_secs: vars
                    .parsed("RENTAL_OUTBOX_POLL_SECS", outbox_defaults.poll_interval_secs)?,
                batch_size: vars
                    .parsed("RENTAL_OUTBOX_BATCH_SIZE", outbox_defaults.batch_size)?,
                max_attempts: vars
                    .parsed("RENTAL_OUTBOX_MAX_ATTEMPTS", outbox_defaults.max_attempts)?,
                pending_grace_secs: vars
                    .parsed("RENTAL_OUTBOX_GRACE_SECS", outbox_defaults.pending_grace_secs)?,
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }
}
