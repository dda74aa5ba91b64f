use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Account role, fixed at signup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    RentProvider,
}

/// Listing category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    Apartment,
    Villa,
    #[serde(rename = "Independent House")]
    IndependentHouse,
    Studio,
    Penthouse,
    #[serde(rename = "PG/Co-Living")]
    PgCoLiving,
    #[serde(rename = "Serviced Apartment")]
    ServicedApartment,
}

impl PropertyType {
    /// Label as stored in the `type` column
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apartment => "Apartment",
            Self::Villa => "Villa",
            Self::IndependentHouse => "Independent House",
            Self::Studio => "Studio",
            Self::Penthouse => "Penthouse",
            Self::PgCoLiving => "PG/Co-Living",
            Self::ServicedApartment => "Serviced Apartment",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Rented,
    Maintenance,
}

impl AvailabilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image attached to a listing, ordered by `display_order`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyImage {
    pub image_url: String,
    #[serde(default)]
    pub display_order: i32,
}

/// Core property data model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub location: String,
    /// Monthly rent in whole currency units
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub image_url: Option<String>,
    #[serde(
        default,
        rename = "property_images",
        deserialize_with = "null_as_default",
        skip_serializing
    )]
    pub images: Vec<PropertyImage>,
    pub availability_status: AvailabilityStatus,
    pub rent_provider_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub professional_domains: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lifestyle: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amenities: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_verified: bool,
    pub rating: Option<f64>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// Embedded images sorted by display order
    pub fn sort_images(&mut self) {
        self.images.sort_by_key(|image| image.display_order);
    }
}

/// Insert payload for `properties`
#[derive(Debug, Clone, Serialize)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub image_url: Option<String>,
    pub contact_phone: Option<String>,
    pub rent_provider_id: Uuid,
    pub availability_status: AvailabilityStatus,
    pub is_verified: bool,
    pub professional_domains: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    pub lifestyle: BTreeSet<String>,
    pub amenities: BTreeSet<String>,
}

/// Listing fields the owning provider may edit; `None` leaves a field as is
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PropertyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<i32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<AvailabilityStatus>,
}

impl PropertyUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the set fields to a row
    pub fn apply(&self, property: &mut Property) {
        if let Some(title) = &self.title {
            property.title = title.clone();
        }
        if let Some(description) = &self.description {
            property.description = description.clone();
        }
        if let Some(location) = &self.location {
            property.location = location.clone();
        }
        if let Some(price) = self.price {
            property.price = price;
        }
        if let Some(bedrooms) = self.bedrooms {
            property.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = self.bathrooms {
            property.bathrooms = bathrooms;
        }
        if let Some(area) = self.area {
            property.area = area;
        }
        if let Some(property_type) = self.property_type {
            property.property_type = property_type;
        }
        if let Some(image_url) = &self.image_url {
            property.image_url = Some(image_url.clone());
        }
        if let Some(contact_phone) = &self.contact_phone {
            property.contact_phone = Some(contact_phone.clone());
        }
        if let Some(status) = self.availability_status {
            property.availability_status = status;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn is_provider(&self) -> bool {
        self.role == UserRole::RentProvider
    }

    /// Name shown in emails, falling back to the email address
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// The only profile fields a user may change
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub rent_provider_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: f64,
    pub message: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Half-open `[start, end)` overlap with another date range
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.status != BookingStatus::Cancelled && self.start_date < end && start < self.end_date
    }
}

/// Insert payload for `bookings`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewBooking {
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub rent_provider_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: f64,
    pub message: Option<String>,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertySummary {
    pub id: Uuid,
    pub title: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactSummary {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Booking joined with its property and both parties
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: Option<PropertySummary>,
    pub user_profile: Option<ContactSummary>,
    pub provider_profile: Option<ContactSummary>,
}

/// Star rating, always within 1..=5
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("rating must be between 1 and 5, got {value}"))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewReview {
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub rating: Rating,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Favorite {
    pub user_id: Uuid,
    pub property_id: Uuid,
}

/// In-app notification, written by server-side triggers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// Queued notification email and its delivery state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewOutboxMessage {
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub status: DeliveryStatus,
    pub attempts: u32,
}

/// Treats an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
