//! Booking lifecycle: request, price, decide, notify.

pub mod policy;
pub mod pricing;

pub use policy::{BookingPolicy, OverlapPolicy, TransitionPolicy};
pub use pricing::{quote, Quote, DAYS_PER_MONTH};

use crate::config::EmailBranding;
use crate::error::{Rejection, Result, StoreError};
use crate::models::{
    AvailabilityStatus, Booking, BookingDetails, BookingStatus, NewBooking, Profile, Property,
};
use crate::notify::templates::{self, BookingConfirmedEmail, BookingRequestEmail};
use crate::notify::{Dispatcher, Mailer};
use crate::store::Store;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A user's request to stay at a property
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub message: Option<String>,
}

/// Creates bookings and applies provider decisions
///
/// Store failures abort the operation. Email side effects go through the
/// [`Dispatcher`] and never change the result.
pub struct BookingService<S: ?Sized, M: ?Sized> {
    store: Arc<S>,
    dispatcher: Dispatcher<S, M>,
    policy: BookingPolicy,
    branding: EmailBranding,
}

impl<S, M> BookingService<S, M>
where
    S: Store + ?Sized,
    M: Mailer + ?Sized,
{
    pub fn new(store: Arc<S>, mailer: Arc<M>, policy: BookingPolicy, branding: EmailBranding) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&store), mailer),
            store,
            policy,
            branding,
        }
    }

    pub fn policy(&self) -> BookingPolicy {
        self.policy
    }

    /// Create a pending booking and tell the provider about it.
    ///
    /// # Errors
    ///
    /// [`Rejection`]s for providers, reversed date ranges, missing or
    /// unavailable properties, and (under [`OverlapPolicy::Reject`])
    /// overlapping stays; store errors otherwise.
    pub async fn create(&self, requester: &Profile, request: BookingRequest) -> Result<Booking> {
        if requester.is_provider() {
            return Err(Rejection::ProvidersCannotBook.into());
        }
        if request.end_date < request.start_date {
            return Err(Rejection::InvalidDateRange {
                start: request.start_date,
                end: request.end_date,
            }
            .into());
        }

        let property = self
            .store
            .get_property(request.property_id)
            .await?
            .ok_or(Rejection::PropertyNotFound(request.property_id))?;
        if property.availability_status != AvailabilityStatus::Available {
            return Err(Rejection::PropertyUnavailable(property.availability_status).into());
        }
        let provider_id = property
            .rent_provider_id
            .ok_or(Rejection::MissingProvider(property.id))?;

        let quote = quote(property.price, request.start_date, request.end_date)?;
        let new_booking = NewBooking {
            property_id: property.id,
            user_id: requester.id,
            rent_provider_id: provider_id,
            start_date: request.start_date,
            end_date: request.end_date,
            total_amount: quote.total_amount,
            message: request.message.filter(|m| !m.trim().is_empty()),
            status: BookingStatus::Pending,
        };

        let inserted = match self.policy.overlap {
            OverlapPolicy::Allow => self.store.insert_booking(new_booking).await,
            OverlapPolicy::Reject => self.store.insert_booking_exclusive(new_booking).await,
        };
        let booking = match inserted {
            Ok(booking) => booking,
            Err(StoreError::Conflict(reason)) if self.policy.overlap == OverlapPolicy::Reject => {
                info!(property_id = %property.id, %reason, "Rejected overlapping booking");
                return Err(Rejection::OverlappingBooking {
                    start: request.start_date,
                    end: request.end_date,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            booking_id = %booking.id,
            property_id = %property.id,
            days = quote.days,
            total_amount = booking.total_amount,
            "Booking request created"
        );

        self.notify_provider(&property, requester, &booking).await;
        Ok(booking)
    }

    /// Confirm or cancel a booking as its provider.
    ///
    /// # Errors
    ///
    /// [`Rejection`]s for a pending target, an unknown booking, a caller who
    /// is not the booking's provider, or a transition the policy forbids;
    /// store errors otherwise.
    pub async fn update_status(
        &self,
        actor: &Profile,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking> {
        if status == BookingStatus::Pending {
            return Err(Rejection::InvalidTargetStatus(status).into());
        }

        let details = self
            .store
            .get_booking_details(booking_id)
            .await?
            .ok_or(Rejection::BookingNotFound(booking_id))?;
        if details.booking.rent_provider_id != actor.id {
            return Err(Rejection::NotBookingProvider(booking_id).into());
        }

        let from = details.booking.status;
        if !self.policy.transitions.permits(from, status) {
            return Err(Rejection::TransitionNotAllowed { from, to: status }.into());
        }

        let booking = self.store.update_booking_status(booking_id, status).await?;
        info!(%booking_id, %from, to = %status, "Booking status updated");

        if status == BookingStatus::Confirmed {
            self.notify_guest(&details).await;
        }
        Ok(booking)
    }

    /// The requester's bookings, newest first
    pub async fn bookings_for_user(&self, actor: &Profile) -> Result<Vec<BookingDetails>> {
        Ok(self.store.bookings_for_user(actor.id).await?)
    }

    /// Bookings on the provider's properties, newest first
    pub async fn bookings_for_provider(&self, actor: &Profile) -> Result<Vec<BookingDetails>> {
        if !actor.is_provider() {
            return Err(Rejection::NotAProvider.into());
        }
        Ok(self.store.bookings_for_provider(actor.id).await?)
    }

    async fn notify_provider(&self, property: &Property, guest: &Profile, booking: &Booking) {
        let provider = match self.store.get_profile(booking.rent_provider_id).await {
            Ok(Some(provider)) => provider,
            Ok(None) => {
                warn!(booking_id = %booking.id, "Provider profile not found, skipping booking email");
                return;
            }
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "Failed to load provider profile, skipping booking email");
                return;
            }
        };
        if provider.email.trim().is_empty() {
            warn!(booking_id = %booking.id, "Provider has no email address");
            return;
        }

        let email = templates::booking_request(
            &provider.email,
            &BookingRequestEmail {
                property_title: &property.title,
                property_location: &property.location,
                guest_name: guest.display_name(),
                guest_email: &guest.email,
                start_date: booking.start_date,
                end_date: booking.end_date,
                total_amount: booking.total_amount,
                message: booking.message.as_deref(),
            },
            &self.branding,
        );
        self.dispatcher.dispatch(email).await;
    }

    async fn notify_guest(&self, details: &BookingDetails) {
        let Some(to) = details
            .user_profile
            .as_ref()
            .and_then(|guest| guest.email.as_deref())
            .filter(|email| !email.trim().is_empty())
        else {
            warn!(booking_id = %details.booking.id, "Guest has no email address, skipping confirmation");
            return;
        };

        let (title, location) = details
            .property
            .as_ref()
            .map_or(("Property", ""), |p| (p.title.as_str(), p.location.as_str()));
        let provider_name = details
            .provider_profile
            .as_ref()
            .and_then(|p| p.full_name.as_deref())
            .unwrap_or("Property Owner");

        let email = templates::booking_confirmed(
            to,
            &BookingConfirmedEmail {
                property_title: title,
                property_location: location,
                provider_name,
                start_date: details.booking.start_date,
                end_date: details.booking.end_date,
                total_amount: details.booking.total_amount,
            },
            &self.branding,
        );
        self.dispatcher.dispatch(email).await;
    }
}
