//! Rental marketplace backend: listings, bookings and their notifications.

pub mod booking;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;

pub use booking::{BookingPolicy, BookingRequest, BookingService, OverlapPolicy, TransitionPolicy};
pub use config::AppConfig;
pub use error::{NotifyError, Rejection, Result, ServiceError, StoreError};
