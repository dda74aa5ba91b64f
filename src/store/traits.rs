use crate::error::StoreError;
use crate::models::{
    AvailabilityStatus, Booking, BookingDetails, BookingStatus, NewBooking, NewOutboxMessage,
    NewProperty, NewReview, Notification, OutboxMessage, Profile, ProfileUpdate, Property,
    PropertyUpdate, Rating, Review,
};
use crate::store::types::PropertyFilter;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Listings and their images
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get_property(&self, id: Uuid) -> StoreResult<Option<Property>>;

    /// Listings matching the filter, newest first
    async fn search_properties(&self, filter: &PropertyFilter) -> StoreResult<Vec<Property>>;

    async fn properties_by_provider(&self, provider_id: Uuid) -> StoreResult<Vec<Property>>;

    /// Inserts the listing and its images in the given order
    async fn insert_property(&self, property: NewProperty, images: Vec<String>)
        -> StoreResult<Property>;

    async fn update_availability(
        &self,
        id: Uuid,
        status: AvailabilityStatus,
    ) -> StoreResult<Property>;

    /// Writes only the fields set in `update`
    async fn update_property(&self, id: Uuid, update: &PropertyUpdate) -> StoreResult<Property>;

    /// Returns whether a row was deleted
    async fn delete_property(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<Profile>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking>;

    /// Non-cancelled bookings of the property overlapping `[start, end)`
    async fn overlapping_bookings(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Booking>>;

    /// Inserts unless an overlapping booking exists, failing with
    /// [`StoreError::Conflict`] otherwise.
    ///
    /// The default checks then inserts, so it is only as strong as the
    /// store-side exclusion constraint behind `insert_booking`.
    async fn insert_booking_exclusive(&self, booking: NewBooking) -> StoreResult<Booking> {
        let existing = self
            .overlapping_bookings(booking.property_id, booking.start_date, booking.end_date)
            .await?;
        if let Some(clash) = existing.first() {
            return Err(StoreError::Conflict(format!(
                "booking {} already covers {} to {}",
                clash.id, clash.start_date, clash.end_date
            )));
        }
        self.insert_booking(booking).await
    }

    async fn get_booking_details(&self, id: Uuid) -> StoreResult<Option<BookingDetails>>;

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus)
        -> StoreResult<Booking>;

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<BookingDetails>>;

    async fn bookings_for_provider(&self, provider_id: Uuid) -> StoreResult<Vec<BookingDetails>>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_review(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<Option<Review>>;

    async fn insert_review(&self, review: NewReview) -> StoreResult<Review>;

    async fn update_review(
        &self,
        id: Uuid,
        rating: Rating,
        comment: Option<String>,
    ) -> StoreResult<Review>;

    async fn reviews_for_property(&self, property_id: Uuid) -> StoreResult<Vec<Review>>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] if the pair already exists
    async fn add_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<()>;

    async fn remove_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<bool>;

    async fn is_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<bool>;

    async fn favorite_properties(&self, user_id: Uuid) -> StoreResult<Vec<Property>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Newest first
    async fn notifications_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Notification>>;

    /// Returns whether the user's notification was found
    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;

    /// Returns how many notifications changed
    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<u64>;
}

/// Durable queue of notification emails
#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn enqueue_email(&self, message: NewOutboxMessage) -> StoreResult<OutboxMessage>;

    /// Failed messages with attempts left, plus pending ones created before
    /// `pending_before`, oldest first
    async fn due_emails(
        &self,
        limit: usize,
        max_attempts: u32,
        pending_before: DateTime<Utc>,
    ) -> StoreResult<Vec<OutboxMessage>>;

    async fn mark_email_sent(&self, id: Uuid, attempts: u32) -> StoreResult<()>;

    async fn mark_email_failed(&self, id: Uuid, attempts: u32, error: &str) -> StoreResult<()>;
}

/// Every table the marketplace touches
pub trait Store:
    PropertyStore
    + ProfileStore
    + BookingStore
    + ReviewStore
    + FavoriteStore
    + NotificationStore
    + OutboxStore
{
}

impl<T> Store for T where
    T: PropertyStore
        + ProfileStore
        + BookingStore
        + ReviewStore
        + FavoriteStore
        + NotificationStore
        + OutboxStore
{
}
