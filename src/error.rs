//! Error types for store access, notification delivery and marketplace operations.

use crate::models::{AvailabilityStatus, BookingStatus};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Failures talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("store request failed: {0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("store error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message reported by the store
        message: String,
    },

    /// A row did not have the expected shape.
    #[error("failed to decode {table} rows: {source}")]
    Decode {
        /// Table the rows came from
        table: &'static str,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// A write targeted a row that does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Row identifier
        id: Uuid,
    },

    /// A uniqueness or exclusion constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Failures delivering a notification email.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NotifyError {
    #[error("mail request failed: {0}")]
    Transport(String),

    #[error("mail endpoint rejected the message (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Business rules a request violated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("property {0} not found")]
    PropertyNotFound(Uuid),

    #[error("property is {0}, not available")]
    PropertyUnavailable(AvailabilityStatus),

    #[error("property {0} has no rent provider")]
    MissingProvider(Uuid),

    #[error("rent providers cannot book properties")]
    ProvidersCannotBook,

    #[error("rent providers cannot review properties")]
    ProvidersCannotReview,

    #[error("only rent providers can list properties")]
    NotAProvider,

    #[error("property {0} belongs to another provider")]
    NotOwner(Uuid),

    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("booking {0} belongs to another provider")]
    NotBookingProvider(Uuid),

    #[error("bookings can only be confirmed or cancelled, not set to {0}")]
    InvalidTargetStatus(BookingStatus),

    #[error("booking cannot move from {from} to {to}")]
    TransitionNotAllowed {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("property already has a booking overlapping {start} to {end}")]
    OverlappingBooking { start: NaiveDate, end: NaiveDate },

    #[error("{0}")]
    InvalidRating(String),
}

/// Error returned by every marketplace operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Message safe to show to end users.
    ///
    /// Every failure maps to the same generic text; details go to the logs.
    pub fn user_message(&self) -> &'static str {
        "Something went wrong. Please try again."
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Store(_) => None,
        }
    }
}

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Invalid or missing configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
