use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{
    AvailabilityStatus, Booking, BookingDetails, BookingStatus, DeliveryStatus, Favorite,
    NewBooking, NewOutboxMessage, NewProperty, NewReview, Notification, OutboxMessage, Profile,
    ProfileUpdate, Property, PropertyUpdate, Rating, Review,
};
use crate::store::traits::{
    BookingStore, FavoriteStore, NotificationStore, OutboxStore, ProfileStore, PropertyStore,
    ReviewStore, StoreResult,
};
use crate::store::types::PropertyFilter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

const PROPERTY_SELECT: &str = "*,property_images(image_url,display_order)";
const BOOKING_DETAILS_SELECT: &str = "*,\
    property:properties!bookings_property_id_fkey(id,title,location),\
    user_profile:profiles!bookings_user_id_fkey(email,full_name),\
    provider_profile:profiles!bookings_rent_provider_id_fkey(full_name)";
const FAVORITE_SELECT: &str =
    "property_id,properties(*,property_images(image_url,display_order))";
const OUTBOX_TABLE: &str = "email_outbox";

type Query = Vec<(&'static str, String)>;

/// Store backed by the hosted PostgREST API
pub struct RestStore {
    client: Client,
    rest_url: String,
    api_key: String,
    bearer: String,
}

/// Error body returned by the REST API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FavoriteRow {
    properties: Option<Property>,
}

#[derive(Serialize)]
struct PropertyImageRow<'a> {
    property_id: Uuid,
    image_url: &'a str,
    display_order: i32,
}

impl RestStore {
    /// Create a store client for the project at `config.url`
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create store HTTP client")?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            bearer: config
                .access_token
                .clone()
                .unwrap_or_else(|| config.api_key.clone()),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{table}", self.rest_url);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    async fn select<T: DeserializeOwned>(&self, table: &'static str, query: &Query) -> StoreResult<Vec<T>> {
        let response = self.request(Method::GET, table).query(query).send().await?;
        decode(table, response).await
    }

    async fn select_first<T: DeserializeOwned>(
        &self,
        table: &'static str,
        mut query: Query,
    ) -> StoreResult<Option<T>> {
        query.push(("limit", "1".to_string()));
        let rows: Vec<T> = self.select(table, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B, T>(&self, table: &'static str, body: &B, query: &Query) -> StoreResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, table)
            .query(query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        decode(table, response).await
    }

    async fn insert_one<B, T>(&self, table: &'static str, body: &B, query: &Query) -> StoreResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.insert(table, body, query).await?;
        rows.into_iter().next().ok_or_else(|| StoreError::Api {
            status: StatusCode::CREATED.as_u16(),
            message: format!("insert into {table} returned no rows"),
        })
    }

    async fn update<B, T>(&self, table: &'static str, query: &Query, body: &B) -> StoreResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::PATCH, table)
            .query(query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        decode(table, response).await
    }

    async fn update_one<B, T>(
        &self,
        table: &'static str,
        entity: &'static str,
        id: Uuid,
        mut query: Query,
        body: &B,
    ) -> StoreResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        query.insert(0, ("id", eq(id)));
        let rows: Vec<T> = self.update(table, &query, body).await?;
        rows.into_iter()
            .next()
            .ok_or(StoreError::NotFound { entity, id })
    }

    async fn delete(&self, table: &'static str, query: &Query) -> StoreResult<usize> {
        let response = self
            .request(Method::DELETE, table)
            .query(query)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Value> = decode(table, response).await?;
        Ok(rows.len())
    }
}

/// Checks the status and decodes the body, failing fast on shape mismatch
async fn decode<T: DeserializeOwned>(table: &'static str, response: Response) -> StoreResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(ApiErrorBody {
                message: Some(message),
                details,
            }) => match details {
                Some(details) => format!("{message} ({details})"),
                None => message,
            },
            _ => body,
        };
        return Err(if status == StatusCode::CONFLICT {
            StoreError::Conflict(message)
        } else {
            StoreError::Api {
                status: status.as_u16(),
                message,
            }
        });
    }

    serde_json::from_str(&body).map_err(|source| StoreError::Decode { table, source })
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn newest_first() -> (&'static str, String) {
    ("order", "created_at.desc".to_string())
}

/// Postgres array literal with every element quoted
fn pg_array(values: &BTreeSet<String>) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// Query parameters for a property search
pub(crate) fn filter_query(filter: &PropertyFilter) -> Query {
    let mut query: Query = vec![("select", PROPERTY_SELECT.to_string())];

    if let Some(location) = filter.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        query.push(("location", format!("ilike.*{location}*")));
    }
    if let Some(property_type) = filter.property_type {
        query.push(("type", eq(property_type.as_str())));
    }
    if let Some(min) = filter.min_price {
        query.push(("price", format!("gte.{min}")));
    }
    if let Some(max) = filter.max_price {
        query.push(("price", format!("lte.{max}")));
    }
    if let Some(min) = filter.min_bedrooms {
        query.push(("bedrooms", format!("gte.{min}")));
    }
    if let Some(status) = filter.availability {
        query.push(("availability_status", eq(status.as_str())));
    }
    if !filter.professional_domains.is_empty() {
        query.push(("professional_domains", format!("ov.{}", pg_array(&filter.professional_domains))));
    }
    if !filter.interests.is_empty() {
        query.push(("interests", format!("ov.{}", pg_array(&filter.interests))));
    }
    if !filter.amenities.is_empty() {
        query.push(("amenities", format!("cs.{}", pg_array(&filter.amenities))));
    }

    query.push(newest_first());
    if let Some(limit) = filter.limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

fn sorted(mut properties: Vec<Property>) -> Vec<Property> {
    for property in &mut properties {
        property.sort_images();
    }
    properties
}

#[async_trait]
impl PropertyStore for RestStore {
    async fn get_property(&self, id: Uuid) -> StoreResult<Option<Property>> {
        let property: Option<Property> = self
            .select_first(
                "properties",
                vec![("select", PROPERTY_SELECT.to_string()), ("id", eq(id))],
            )
            .await?;
        Ok(property.map(|mut p| {
            p.sort_images();
            p
        }))
    }

    async fn search_properties(&self, filter: &PropertyFilter) -> StoreResult<Vec<Property>> {
        let properties = self.select("properties", &filter_query(filter)).await?;
        Ok(sorted(properties))
    }

    async fn properties_by_provider(&self, provider_id: Uuid) -> StoreResult<Vec<Property>> {
        let query = vec![
            ("select", PROPERTY_SELECT.to_string()),
            ("rent_provider_id", eq(provider_id)),
            newest_first(),
        ];
        Ok(sorted(self.select("properties", &query).await?))
    }

    async fn insert_property(
        &self,
        property: NewProperty,
        images: Vec<String>,
    ) -> StoreResult<Property> {
        let mut created: Property = self.insert_one("properties", &property, &Vec::new()).await?;

        if !images.is_empty() {
            let rows: Vec<PropertyImageRow<'_>> = images
                .iter()
                .zip(0..)
                .map(|(image_url, display_order)| PropertyImageRow {
                    property_id: created.id,
                    image_url,
                    display_order,
                })
                .collect();
            created.images = self.insert("property_images", &rows, &Vec::new()).await?;
            created.sort_images();
        }

        Ok(created)
    }

    async fn update_availability(
        &self,
        id: Uuid,
        status: AvailabilityStatus,
    ) -> StoreResult<Property> {
        let mut property: Property = self
            .update_one(
                "properties",
                "property",
                id,
                vec![("select", PROPERTY_SELECT.to_string())],
                &json!({ "availability_status": status }),
            )
            .await?;
        property.sort_images();
        Ok(property)
    }

    async fn update_property(&self, id: Uuid, update: &PropertyUpdate) -> StoreResult<Property> {
        let mut property: Property = self
            .update_one(
                "properties",
                "property",
                id,
                vec![("select", PROPERTY_SELECT.to_string())],
                update,
            )
            .await?;
        property.sort_images();
        Ok(property)
    }

    async fn delete_property(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.delete("properties", &vec![("id", eq(id))]).await? > 0)
    }
}

#[async_trait]
impl ProfileStore for RestStore {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        self.select_first("profiles", vec![("id", eq(id))]).await
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<Profile> {
        self.update_one("profiles", "profile", id, Vec::new(), update)
            .await
    }
}

#[async_trait]
impl BookingStore for RestStore {
    async fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        self.insert_one("bookings", &booking, &Vec::new()).await
    }

    async fn overlapping_bookings(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Booking>> {
        let query = vec![
            ("property_id", eq(property_id)),
            ("status", format!("neq.{}", BookingStatus::Cancelled)),
            ("start_date", format!("lt.{end}")),
            ("end_date", format!("gt.{start}")),
        ];
        self.select("bookings", &query).await
    }

    async fn get_booking_details(&self, id: Uuid) -> StoreResult<Option<BookingDetails>> {
        self.select_first(
            "bookings",
            vec![("select", BOOKING_DETAILS_SELECT.to_string()), ("id", eq(id))],
        )
        .await
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Booking> {
        self.update_one("bookings", "booking", id, Vec::new(), &json!({ "status": status }))
            .await
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<BookingDetails>> {
        let query = vec![
            ("select", BOOKING_DETAILS_SELECT.to_string()),
            ("user_id", eq(user_id)),
            newest_first(),
        ];
        self.select("bookings", &query).await
    }

    async fn bookings_for_provider(&self, provider_id: Uuid) -> StoreResult<Vec<BookingDetails>> {
        let query = vec![
            ("select", BOOKING_DETAILS_SELECT.to_string()),
            ("rent_provider_id", eq(provider_id)),
            newest_first(),
        ];
        self.select("bookings", &query).await
    }
}

#[async_trait]
impl ReviewStore for RestStore {
    async fn find_review(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<Option<Review>> {
        self.select_first(
            "reviews",
            vec![("property_id", eq(property_id)), ("user_id", eq(user_id))],
        )
        .await
    }

    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        self.insert_one("reviews", &review, &Vec::new()).await
    }

    async fn update_review(
        &self,
        id: Uuid,
        rating: Rating,
        comment: Option<String>,
    ) -> StoreResult<Review> {
        let body = json!({
            "rating": rating,
            "comment": comment,
            "updated_at": Utc::now(),
        });
        self.update_one("reviews", "review", id, Vec::new(), &body)
            .await
    }

    async fn reviews_for_property(&self, property_id: Uuid) -> StoreResult<Vec<Review>> {
        let query = vec![("property_id", eq(property_id)), newest_first()];
        self.select("reviews", &query).await
    }
}

#[async_trait]
impl FavoriteStore for RestStore {
    async fn add_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<()> {
        let _: Favorite = self
            .insert_one(
                "favorites",
                &Favorite {
                    user_id,
                    property_id,
                },
                &Vec::new(),
            )
            .await?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<bool> {
        let query = vec![("user_id", eq(user_id)), ("property_id", eq(property_id))];
        Ok(self.delete("favorites", &query).await? > 0)
    }

    async fn is_favorite(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<bool> {
        let row: Option<Value> = self
            .select_first(
                "favorites",
                vec![
                    ("select", "property_id".to_string()),
                    ("user_id", eq(user_id)),
                    ("property_id", eq(property_id)),
                ],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn favorite_properties(&self, user_id: Uuid) -> StoreResult<Vec<Property>> {
        let query = vec![
            ("select", FAVORITE_SELECT.to_string()),
            ("user_id", eq(user_id)),
        ];
        let rows: Vec<FavoriteRow> = self.select("favorites", &query).await?;
        Ok(sorted(rows.into_iter().filter_map(|row| row.properties).collect()))
    }
}

#[async_trait]
impl NotificationStore for RestStore {
    async fn notifications_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Notification>> {
        let query = vec![("user_id", eq(user_id)), newest_first()];
        self.select("notifications", &query).await
    }

    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let query = vec![("id", eq(id)), ("user_id", eq(user_id))];
        let rows: Vec<Value> = self
            .update("notifications", &query, &json!({ "is_read": true }))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let query = vec![("user_id", eq(user_id)), ("is_read", eq(false))];
        let rows: Vec<Value> = self
            .update("notifications", &query, &json!({ "is_read": true }))
            .await?;
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl OutboxStore for RestStore {
    async fn enqueue_email(&self, message: NewOutboxMessage) -> StoreResult<OutboxMessage> {
        self.insert_one(OUTBOX_TABLE, &message, &Vec::new()).await
    }

    async fn due_emails(
        &self,
        limit: usize,
        max_attempts: u32,
        pending_before: DateTime<Utc>,
    ) -> StoreResult<Vec<OutboxMessage>> {
        let cutoff = pending_before.to_rfc3339_opts(SecondsFormat::Millis, true);
        let query = vec![
            ("attempts", format!("lt.{max_attempts}")),
            (
                "or",
                format!(
                    "(status.eq.{},and(status.eq.{},created_at.lt.\"{cutoff}\"))",
                    DeliveryStatus::Failed.as_str(),
                    DeliveryStatus::Pending.as_str(),
                ),
            ),
            ("order", "created_at.asc".to_string()),
            ("limit", limit.to_string()),
        ];
        self.select(OUTBOX_TABLE, &query).await
    }

    async fn mark_email_sent(&self, id: Uuid, attempts: u32) -> StoreResult<()> {
        let body = json!({
            "status": DeliveryStatus::Sent,
            "attempts": attempts,
            "last_error": null,
            "updated_at": Utc::now(),
        });
        let _: OutboxMessage = self
            .update_one(OUTBOX_TABLE, "outbox message", id, Vec::new(), &body)
            .await?;
        Ok(())
    }

    async fn mark_email_failed(&self, id: Uuid, attempts: u32, error: &str) -> StoreResult<()> {
        let body = json!({
            "status": DeliveryStatus::Failed,
            "attempts": attempts,
            "last_error": error,
            "updated_at": Utc::now(),
        });
        let _: OutboxMessage = self
            .update_one(OUTBOX_TABLE, "outbox message", id, Vec::new(), &body)
            .await?;
        Ok(())
    }
}
