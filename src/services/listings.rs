use crate::error::{Rejection, Result};
use crate::models::{
    AvailabilityStatus, NewProperty, Profile, Property, PropertyType, PropertyUpdate,
};
use crate::store::{PropertyFilter, PropertyStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// What a provider fills in to list a property
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,
    pub property_type: PropertyType,
    pub contact_phone: Option<String>,
    /// Image URLs in display order; the first becomes the cover image
    pub images: Vec<String>,
    pub professional_domains: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    pub lifestyle: BTreeSet<String>,
    pub amenities: BTreeSet<String>,
}

pub struct ListingService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: PropertyStore + ?Sized> ListingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn search(&self, filter: &PropertyFilter) -> Result<Vec<Property>> {
        Ok(self.store.search_properties(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Property> {
        Ok(self
            .store
            .get_property(id)
            .await?
            .ok_or(Rejection::PropertyNotFound(id))?)
    }

    pub async fn listings_for_provider(&self, provider: &Profile) -> Result<Vec<Property>> {
        if !provider.is_provider() {
            return Err(Rejection::NotAProvider.into());
        }
        Ok(self.store.properties_by_provider(provider.id).await?)
    }

    /// New listings start available and unverified.
    pub async fn create_listing(&self, provider: &Profile, draft: ListingDraft) -> Result<Property> {
        if !provider.is_provider() {
            return Err(Rejection::NotAProvider.into());
        }

        let images: Vec<String> = draft
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        let new_property = NewProperty {
            title: draft.title,
            description: draft.description,
            location: draft.location,
            price: draft.price,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            area: draft.area,
            property_type: draft.property_type,
            image_url: images.first().cloned(),
            contact_phone: draft.contact_phone.filter(|p| !p.trim().is_empty()),
            rent_provider_id: provider.id,
            availability_status: AvailabilityStatus::Available,
            is_verified: false,
            professional_domains: draft.professional_domains,
            interests: draft.interests,
            lifestyle: draft.lifestyle,
            amenities: draft.amenities,
        };

        let property = self.store.insert_property(new_property, images).await?;
        info!(
            property_id = %property.id,
            provider_id = %provider.id,
            images = property.images.len(),
            "Listed property"
        );
        Ok(property)
    }

    /// Edit a listing's details as its owner
    pub async fn update_listing(
        &self,
        provider: &Profile,
        property_id: Uuid,
        update: PropertyUpdate,
    ) -> Result<Property> {
        let current = self.owned(provider, property_id).await?;
        if update.is_empty() {
            return Ok(current);
        }
        let property = self.store.update_property(property_id, &update).await?;
        info!(%property_id, provider_id = %provider.id, "Listing updated");
        Ok(property)
    }

    pub async fn set_availability(
        &self,
        provider: &Profile,
        property_id: Uuid,
        status: AvailabilityStatus,
    ) -> Result<Property> {
        self.owned(provider, property_id).await?;
        let property = self.store.update_availability(property_id, status).await?;
        info!(%property_id, %status, "Availability updated");
        Ok(property)
    }

    pub async fn delete_listing(&self, provider: &Profile, property_id: Uuid) -> Result<()> {
        self.owned(provider, property_id).await?;
        if self.store.delete_property(property_id).await? {
            info!(%property_id, "Deleted listing");
        }
        Ok(())
    }

    async fn owned(&self, provider: &Profile, property_id: Uuid) -> Result<Property> {
        if !provider.is_provider() {
            return Err(Rejection::NotAProvider.into());
        }
        let property = self
            .store
            .get_property(property_id)
            .await?
            .ok_or(Rejection::PropertyNotFound(property_id))?;
        if property.rent_provider_id != Some(provider.id) {
            return Err(Rejection::NotOwner(property_id).into());
        }
        Ok(property)
    }
}
