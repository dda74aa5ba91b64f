use crate::error::StoreError;
use crate::models::{
    AvailabilityStatus, Booking, BookingDetails, BookingStatus, ContactSummary, DeliveryStatus,
    Favorite, NewBooking, NewOutboxMessage, NewProperty, NewReview, Notification, OutboxMessage,
    Profile, ProfileUpdate, Property, PropertyImage, PropertySummary, PropertyUpdate, Rating,
    Review,
};
use crate::store::traits::{
    BookingStore, FavoriteStore, NotificationStore, OutboxStore, ProfileStore, PropertyStore,
    ReviewStore, StoreResult,
};
use crate::store::types::PropertyFilter;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    properties: Vec<Property>,
    profiles: HashMap<Uuid, Profile>,
    bookings: Vec<Booking>,
    reviews: Vec<Review>,
    favorites: Vec<Favorite>,
    notifications: Vec<Notification>,
    outbox: Vec<OutboxMessage>,
}

/// In-memory store for tests and local runs
///
/// Rows live in insertion order behind a single mutex. The lock is never held
/// across an await, so every trait call is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail like an unreachable store
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Profiles are created by the auth backend, so they are seeded directly
    pub fn add_profile(&self, profile: Profile) {
        self.lock().profiles.insert(profile.id, profile);
    }

    pub fn add_property(&self, property: Property) {
        self.lock().properties.push(property);
    }

    /// Notifications are written by server-side triggers
    pub fn add_notification(&self, notification: Notification) {
        self.lock().notifications.push(notification);
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.lock().bookings.clone()
    }

    pub fn outbox(&self) -> Vec<OutboxMessage> {
        self.lock().outbox.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "store is not accepting writes".to_string(),
            });
        }
        Ok(self.lock())
    }
}

impl Tables {
    fn details(&self, booking: &Booking) -> BookingDetails {
        let property = self
            .properties
            .iter()
            .find(|p| p.id == booking.property_id)
            .map(|p| PropertySummary {
                id: p.id,
                title: p.title.clone(),
                location: p.location.clone(),
            });
        let contact = |id: Uuid| {
            self.profiles.get(&id).map(|profile| ContactSummary {
                email: Some(profile.email.clone()),
                full_name: profile.full_name.clone(),
            })
        };

        BookingDetails {
            booking: booking.clone(),
            property,
            user_profile: contact(booking.user_id),
            provider_profile: contact(booking.rent_provider_id),
        }
    }

    fn newest_details(&self, keep: impl Fn(&Booking) -> bool) -> Vec<BookingDetails> {
        let mut rows: Vec<_> = self
            .bookings
            .iter()
            .filter(|&b| keep(b))
            .map(|b| self.details(b))
            .collect();
        rows.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        rows
    }

    fn push_booking(&mut self, new: NewBooking) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4(),
            property_id: new.property_id,
            user_id: new.user_id,
            rent_provider_id: new.rent_provider_id,
            start_date: new.start_date,
            end_date: new.end_date,
            total_amount: new.total_amount,
            message: new.message,
            status: new.status,
            created_at: Utc::now(),
        };
        self.bookings.push(booking.clone());
        booking
    }

    fn overlapping(&self, property_id: Uuid, start: NaiveDate, end: NaiveDate) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|b| b.property_id == property_id && b.overlaps(start, end))
            .cloned()
            .collect()
    }
}

fn newest_first(mut properties: Vec<Property>) -> Vec<Property> {
    properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    properties
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn get_property(&self, id: Uuid) -> StoreResult<Option<Property>> {
        Ok(self.lock().properties.iter().find(|p| p.id == id).cloned())
    }

    async fn search_properties(&self, filter: &PropertyFilter) -> StoreResult<Vec<Property>> {
        let matches = self
            .lock()
            .properties
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        let mut properties = newest_first(matches);
        if let Some(limit) = filter.limit {
            properties.truncate(limit);
        }
        debug!("Memory search returned {} properties", properties.len());
        Ok(properties)
    }

    async fn properties_by_provider(&self, provider_id: Uuid) -> StoreResult<Vec<Property>> {
        let owned = self
            .lock()
            .properties
            .iter()
            .filter(|p| p.rent_provider_id == Some(provider_id))
            .cloned()
            .collect();
        Ok(newest_first(owned))
    }

    async fn insert_property(
        &self,
        new: NewProperty,
        images: Vec<String>,
    ) -> StoreResult<Property> {
        let mut tables = self.write_lock()?;
        let property = Property {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            location: new.location,
            price: new.price,
            bedrooms: new.bedrooms,
            bathrooms: new.bathrooms,
            area: new.area,
            property_type: new.property_type,
            image_url: new.image_url,
            images: images
                .into_iter()
                .zip(0..)
                .map(|(image_url, display_order)| PropertyImage {
                    image_url,
                    display_order,
                })
                .collect(),
            availability_status: new.availability_status,
            rent_provider_id: Some(new.rent_provider_id),
            professional_domains: new.professional_domains,
            interests: new.interests,
            lifestyle: new.lifestyle,
            amenities: new.amenities,
            is_verified: new.is_verified,
            rating: None,
            contact_phone: new.contact_phone,
            created_at: Utc::now(),
        };
        tables.properties.push(property.clone());
        Ok(property)
    }

    async fn update_availability(
        &self,
        id: Uuid,
        status: AvailabilityStatus,
    ) -> StoreResult<Property> {
        let mut tables = self.write_lock()?;
        let property = tables
            .properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound {
                entity: "property",
                id,
            })?;
        property.availability_status = status;
        Ok(property.clone())
    }

    async fn update_property(&self, id: Uuid, update: &PropertyUpdate) -> StoreResult<Property> {
        let mut tables = self.write_lock()?;
        let property = tables
            .properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound {
                entity: "property",
                id,
            })?;
        update.apply(property);
        Ok(property.clone())
    }

    async fn delete_property(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.write_lock()?;
        let before = tables.properties.len();
        tables.properties.retain(|p| p.id != id);
        let deleted = tables.properties.len() < before;
        if deleted {
            tables.favorites.retain(|f| f.property_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.lock().profiles.get(&id).cloned())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<Profile> {
        let mut tables = self.write_lock()?;
        let profile = tables.profiles.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "profile",
            id,
        })?;
        if let Some(full_name) = &update.full_name {
            profile.full_name = Some(full_name.clone());
        }
        if let Some(phone) = &update.phone {
            profile.phone = Some(phone.clone());
        }
        Ok(profile.clone())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        Ok(self.write_lock()?.push_booking(booking))
    }

    async fn overlapping_bookings(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Booking>> {
        Ok(self.lock().overlapping(property_id, start, end))
    }

    async fn insert_booking_exclusive(&self, booking: NewBooking) -> StoreResult<Booking> {
        let mut tables = self.write_lock()?;
        let clashes = tables.overlapping(booking.property_id, booking.start_date, booking.end_date);
        if let Some(clash) = clashes.first() {
            return Err(StoreError::Conflict(format!(
                "booking {} already covers {} to {}",
                clash.id, clash.start_date, clash.end_date
            )));
        }
        Ok(tables.push_booking(booking))
    }

    async fn get_booking_details(&self, id: Uuid) -> StoreResult<Option<BookingDetails>> {
        let tables = self.lock();
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.id == id)
            .map(|b| tables.details(b)))
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Booking> {
        let mut tables = self.write_lock()?;
        let booking = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound {
                entity: "booking",
                id,
            })?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<BookingDetails>> {
        Ok(self.lock().newest_details(|b| b.user_id == user_id))
    }

    async fn bookings_for_provider(&self, provider_id: Uuid) -> StoreResult<Vec<BookingDetails>> {
        Ok(self.lock().newest_details(|b| b.rent_provider_id == provider_id))
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn find_review(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self
            .lock()
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.property_id == property_id)
            .cloned())
    }

    async fn insert_review(&self, new: NewReview) -> StoreResult<Review> {
        let mut tables = self.write_lock()?;
        let review = Review {
            id: Uuid::new_v4(),
            property_id: new.property_id,
            user_id: new.user_id,
            rating: new.rating,
            comment: new.comment,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn update_review(
        &self,
        id: Uuid,
        rating: Rating,
        comment: Option<String>,
    ) -> StoreResult<Review> {
        let mut tables = self.write_lock()?;
        let review = tables
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound {
                entity: "review",
                id,
            })?;
        review.rating = rating;
        review.comment = comment;
        review.updated_at = Some(Utc::now());
        Ok(review.clone())
    }

    async fn reviews_for_property(&self, property_id: Uuid) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<_> = self
            .lock()
            .reviews
            .iter()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn add_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<()> {
        let mut tables = self.write_lock()?;
        let favorite = Favorite {
            user_id,
            property_id,
        };
        if tables.favorites.contains(&favorite) {
            return Err(StoreError::Conflict(format!(
                "property {property_id} is already a favorite"
            )));
        }
        tables.favorites.push(favorite);
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.write_lock()?;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.user_id == user_id && f.property_id == property_id));
        Ok(tables.favorites.len() < before)
    }

    async fn is_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .lock()
            .favorites
            .iter()
            .any(|f| f.user_id == user_id && f.property_id == property_id))
    }

    async fn favorite_properties(&self, user_id: Uuid) -> StoreResult<Vec<Property>> {
        let tables = self.lock();
        Ok(tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| tables.properties.iter().find(|p| p.id == f.property_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn notifications_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Notification>> {
        let mut notifications: Vec<_> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.write_lock()?;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.write_lock()?;
        let mut changed = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl OutboxStore for MemoryStore {
    async fn enqueue_email(&self, new: NewOutboxMessage) -> StoreResult<OutboxMessage> {
        let mut tables = self.write_lock()?;
        let message = OutboxMessage {
            id: Uuid::new_v4(),
            recipient: new.recipient,
            subject: new.subject,
            html: new.html,
            status: new.status,
            attempts: new.attempts,
            last_error: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.outbox.push(message.clone());
        Ok(message)
    }

    async fn due_emails(
        &self,
        limit: usize,
        max_attempts: u32,
        pending_before: DateTime<Utc>,
    ) -> StoreResult<Vec<OutboxMessage>> {
        let mut due: Vec<_> = self
            .lock()
            .outbox
            .iter()
            .filter(|m| m.attempts < max_attempts)
            .filter(|m| match m.status {
                DeliveryStatus::Failed => true,
                DeliveryStatus::Pending => m.created_at < pending_before,
                DeliveryStatus::Sent => false,
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        due.truncate(limit);
        Ok(due)
    }

    async fn mark_email_sent(&self, id: Uuid, attempts: u32) -> StoreResult<()> {
        let mut tables = self.write_lock()?;
        let message = find_outbox(&mut tables, id)?;
        message.status = DeliveryStatus::Sent;
        message.attempts = attempts;
        message.last_error = None;
        message.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_email_failed(&self, id: Uuid, attempts: u32, error: &str) -> StoreResult<()> {
        let mut tables = self.write_lock()?;
        let message = find_outbox(&mut tables, id)?;
        message.status = DeliveryStatus::Failed;
        message.attempts = attempts;
        message.last_error = Some(error.to_string());
        message.updated_at = Some(Utc::now());
        Ok(())
    }
}

fn find_outbox(tables: &mut Tables, id: Uuid) -> StoreResult<&mut OutboxMessage> {
    tables
        .outbox
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or(StoreError::NotFound {
            entity: "outbox message",
            id,
        })
}
