#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use rental_market::booking::{BookingPolicy, BookingService};
use rental_market::config::EmailBranding;
use rental_market::models::{AvailabilityStatus, Profile, Property, PropertyType, UserRole};
use rental_market::notify::RecordingMailer;
use rental_market::store::MemoryStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn profile(role: UserRole, email: &str, name: &str) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: Some(name.to_string()),
        phone: None,
        role,
        avatar_url: None,
    }
}

pub fn property(provider: Option<Uuid>, price: i64) -> Property {
    Property {
        id: Uuid::new_v4(),
        title: "2BHK near the lake".to_string(),
        description: String::new(),
        location: "Bengaluru, Karnataka".to_string(),
        price,
        bedrooms: 2,
        bathrooms: 1,
        area: 950,
        property_type: PropertyType::Apartment,
        image_url: None,
        images: Vec::new(),
        availability_status: AvailabilityStatus::Available,
        rent_provider_id: provider,
        professional_domains: BTreeSet::new(),
        interests: BTreeSet::new(),
        lifestyle: BTreeSet::new(),
        amenities: BTreeSet::new(),
        is_verified: false,
        rating: None,
        contact_phone: None,
        created_at: Utc::now(),
    }
}

/// A seeded store with one provider, one guest and one listing at 30000/month
pub struct Marketplace {
    pub store: Arc<MemoryStore>,
    pub mailer: RecordingMailer,
    pub provider: Profile,
    pub guest: Profile,
    pub property: Property,
}

impl Marketplace {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = profile(UserRole::RentProvider, "owner@example.com", "Ravi Kumar");
        let guest = profile(UserRole::User, "asha@example.com", "Asha Rao");
        let property = property(Some(provider.id), 30000);

        store.add_profile(provider.clone());
        store.add_profile(guest.clone());
        store.add_property(property.clone());

        Self {
            store,
            mailer: RecordingMailer::new(),
            provider,
            guest,
            property,
        }
    }

    pub fn bookings(&self, policy: BookingPolicy) -> BookingService<MemoryStore, RecordingMailer> {
        BookingService::new(
            Arc::clone(&self.store),
            Arc::new(self.mailer.clone()),
            policy,
            EmailBranding::default(),
        )
    }
}
