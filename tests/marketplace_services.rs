mod common;

use chrono::{Duration, Utc};
use common::{date, property, Marketplace};
use rental_market::booking::{BookingPolicy, BookingRequest};
use rental_market::error::Rejection;
use rental_market::models::{
    AvailabilityStatus, Notification, ProfileUpdate, PropertyType, PropertyUpdate, UserRole,
};
use rental_market::services::{
    FavoriteService, InboxService, ListingDraft, ListingService, ProfileService, ReviewOutcome,
    ReviewService,
};
use rental_market::store::{BudgetRange, PropertyFilter};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

fn draft(images: &[&str]) -> ListingDraft {
    ListingDraft {
        title: "Sea-facing studio".to_string(),
        description: "Walk to the beach".to_string(),
        location: "Bandra, Mumbai".to_string(),
        price: 45000,
        bedrooms: 1,
        bathrooms: 1,
        area: 500,
        property_type: PropertyType::Studio,
        contact_phone: Some(" ".to_string()),
        images: images.iter().map(|s| s.to_string()).collect(),
        professional_domains: BTreeSet::from(["Finance".to_string()]),
        interests: BTreeSet::new(),
        lifestyle: BTreeSet::new(),
        amenities: BTreeSet::from(["Wifi".to_string(), "Gym".to_string()]),
    }
}

fn notification(user_id: Uuid, minutes_ago: i64, is_read: bool) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        user_id,
        kind: "booking_request".to_string(),
        title: "New booking".to_string(),
        message: "You have a new booking request".to_string(),
        link: Some("/dashboard/bookings".to_string()),
        is_read,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn error_rejection(err: rental_market::ServiceError) -> Rejection {
    err.rejection().cloned().expect("expected a rejection")
}

#[tokio::test]
async fn providers_create_listings_that_start_available() {
    let market = Marketplace::new();
    let listings = ListingService::new(Arc::clone(&market.store));

    let created = listings
        .create_listing(
            &market.provider,
            draft(&["https://img.example.com/1.jpg", "  ", "https://img.example.com/2.jpg"]),
        )
        .await
        .unwrap();

    assert_eq!(created.availability_status, AvailabilityStatus::Available);
    assert!(!created.is_verified);
    assert_eq!(created.rent_provider_id, Some(market.provider.id));
    assert_eq!(created.image_url.as_deref(), Some("https://img.example.com/1.jpg"));
    assert_eq!(created.contact_phone, None);
    let images: Vec<(&str, i32)> = created
        .images
        .iter()
        .map(|i| (i.image_url.as_str(), i.display_order))
        .collect();
    assert_eq!(
        images,
        vec![
            ("https://img.example.com/1.jpg", 0),
            ("https://img.example.com/2.jpg", 1)
        ]
    );

    let mine = listings.listings_for_provider(&market.provider).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].id, created.id);
}

#[tokio::test]
async fn users_cannot_list_or_manage_properties() {
    let market = Marketplace::new();
    let listings = ListingService::new(Arc::clone(&market.store));

    let err = listings
        .create_listing(&market.guest, draft(&[]))
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::NotAProvider);

    let err = listings
        .set_availability(&market.guest, market.property.id, AvailabilityStatus::Rented)
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::NotAProvider);
}

#[tokio::test]
async fn only_owners_change_availability_or_delete() {
    let market = Marketplace::new();
    let listings = ListingService::new(Arc::clone(&market.store));
    let other = common::profile(UserRole::RentProvider, "other@example.com", "Other Owner");

    let err = listings
        .set_availability(&other, market.property.id, AvailabilityStatus::Maintenance)
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::NotOwner(market.property.id));

    let updated = listings
        .set_availability(&market.provider, market.property.id, AvailabilityStatus::Rented)
        .await
        .unwrap();
    assert_eq!(updated.availability_status, AvailabilityStatus::Rented);

    let err = listings
        .delete_listing(&other, market.property.id)
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::NotOwner(market.property.id));

    listings
        .delete_listing(&market.provider, market.property.id)
        .await
        .unwrap();
    let err = listings.get(market.property.id).await.unwrap_err();
    assert_eq!(error_rejection(err), Rejection::PropertyNotFound(market.property.id));
}

#[tokio::test]
async fn owners_edit_listing_details() {
    let market = Marketplace::new();
    let listings = ListingService::new(Arc::clone(&market.store));

    let edited = listings
        .update_listing(
            &market.provider,
            market.property.id,
            PropertyUpdate {
                title: Some("Renovated 2BHK near the lake".to_string()),
                price: Some(32000),
                property_type: Some(PropertyType::ServicedApartment),
                contact_phone: Some("+91 90000 00000".to_string()),
                availability_status: Some(AvailabilityStatus::Maintenance),
                ..PropertyUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.title, "Renovated 2BHK near the lake");
    assert_eq!(edited.price, 32000);
    assert_eq!(edited.property_type, PropertyType::ServicedApartment);
    assert_eq!(edited.contact_phone.as_deref(), Some("+91 90000 00000"));
    assert_eq!(edited.availability_status, AvailabilityStatus::Maintenance);
    assert_eq!(edited.location, market.property.location);
    assert_eq!(edited.bedrooms, market.property.bedrooms);

    let stored = listings.get(market.property.id).await.unwrap();
    assert_eq!(stored.price, 32000);

    let unchanged = listings
        .update_listing(&market.provider, market.property.id, PropertyUpdate::default())
        .await
        .unwrap();
    assert_eq!(unchanged.title, "Renovated 2BHK near the lake");
}

#[tokio::test]
async fn only_owning_providers_edit_listings() {
    let market = Marketplace::new();
    let listings = ListingService::new(Arc::clone(&market.store));
    let update = PropertyUpdate {
        price: Some(1),
        ..PropertyUpdate::default()
    };
    let other = common::profile(UserRole::RentProvider, "other@example.com", "Other Owner");

    let err = listings
        .update_listing(&other, market.property.id, update.clone())
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::NotOwner(market.property.id));

    let err = listings
        .update_listing(&market.guest, market.property.id, update.clone())
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::NotAProvider);

    let missing = Uuid::new_v4();
    let err = listings
        .update_listing(&market.provider, missing, update)
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::PropertyNotFound(missing));

    assert_eq!(listings.get(market.property.id).await.unwrap().price, 30000);
}

#[tokio::test]
async fn search_applies_location_type_and_budget() {
    let market = Marketplace::new();
    let mut villa = property(Some(market.provider.id), 80000);
    villa.property_type = PropertyType::Villa;
    villa.location = "Whitefield, Bengaluru".to_string();
    villa.created_at = Utc::now() + Duration::seconds(1);
    market.store.add_property(villa.clone());
    let mut pune = property(Some(market.provider.id), 20000);
    pune.location = "Baner, Pune".to_string();
    market.store.add_property(pune);

    let listings = ListingService::new(Arc::clone(&market.store));

    let in_bengaluru = listings
        .search(&PropertyFilter {
            location: Some("BENGALURU".to_string()),
            ..PropertyFilter::default()
        })
        .await
        .unwrap();
    let ids: Vec<Uuid> = in_bengaluru.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![villa.id, market.property.id]);

    let budget: BudgetRange = "25000-50000".parse().unwrap();
    let affordable = listings
        .search(&PropertyFilter::default().with_budget(budget))
        .await
        .unwrap();
    assert_eq!(affordable.len(), 1);
    assert_eq!(affordable[0].id, market.property.id);

    let villas = listings
        .search(&PropertyFilter {
            property_type: Some(PropertyType::Villa),
            ..PropertyFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(villas.len(), 1);
}

#[tokio::test]
async fn second_review_replaces_the_first() {
    let market = Marketplace::new();
    let reviews = ReviewService::new(Arc::clone(&market.store));

    let first = reviews
        .submit(&market.guest, market.property.id, 4, Some("Lovely place".to_string()))
        .await
        .unwrap();
    assert!(matches!(first, ReviewOutcome::Created(_)));

    let second = reviews
        .submit(&market.guest, market.property.id, 2, Some("   ".to_string()))
        .await
        .unwrap();
    let ReviewOutcome::Updated(review) = second else {
        panic!("expected an update");
    };
    assert_eq!(review.id, first.review().id);
    assert_eq!(review.rating.get(), 2);
    assert_eq!(review.comment, None);

    let all = reviews.reviews_for_property(market.property.id).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn reviews_are_validated() {
    let market = Marketplace::new();
    let reviews = ReviewService::new(Arc::clone(&market.store));

    let err = reviews
        .submit(&market.guest, market.property.id, 6, None)
        .await
        .unwrap_err();
    assert!(matches!(error_rejection(err), Rejection::InvalidRating(_)));

    let err = reviews
        .submit(&market.provider, market.property.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(error_rejection(err), Rejection::ProvidersCannotReview);

    let missing = Uuid::new_v4();
    let err = reviews.submit(&market.guest, missing, 5, None).await.unwrap_err();
    assert_eq!(error_rejection(err), Rejection::PropertyNotFound(missing));
}

#[tokio::test]
async fn favorites_add_is_idempotent_and_toggle_flips() {
    let market = Marketplace::new();
    let favorites = FavoriteService::new(Arc::clone(&market.store));

    favorites.add(&market.guest, market.property.id).await.unwrap();
    favorites.add(&market.guest, market.property.id).await.unwrap();
    assert_eq!(favorites.list(&market.guest).await.unwrap().len(), 1);

    assert!(!favorites.toggle(&market.guest, market.property.id).await.unwrap());
    assert!(!favorites.is_favorite(&market.guest, market.property.id).await.unwrap());
    assert!(favorites.toggle(&market.guest, market.property.id).await.unwrap());

    favorites.remove(&market.guest, market.property.id).await.unwrap();
    assert!(favorites.list(&market.guest).await.unwrap().is_empty());
}

#[tokio::test]
async fn inbox_tracks_unread_notifications() {
    let market = Marketplace::new();
    let inbox = InboxService::new(Arc::clone(&market.store));
    let old = notification(market.guest.id, 30, false);
    let recent = notification(market.guest.id, 1, false);
    let seen = notification(market.guest.id, 60, true);
    let someone_elses = notification(market.provider.id, 5, false);
    for n in [&old, &recent, &seen, &someone_elses] {
        market.store.add_notification(n.clone());
    }

    let listed = inbox.list(&market.guest).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![recent.id, old.id, seen.id]);
    assert_eq!(inbox.unread_count(&market.guest).await.unwrap(), 2);

    assert!(!inbox.mark_read(&market.guest, someone_elses.id).await.unwrap());
    assert!(inbox.mark_read(&market.guest, old.id).await.unwrap());
    assert_eq!(inbox.unread_count(&market.guest).await.unwrap(), 1);

    assert_eq!(inbox.mark_all_read(&market.guest).await.unwrap(), 1);
    assert_eq!(inbox.unread_count(&market.guest).await.unwrap(), 0);
    assert_eq!(inbox.unread_count(&market.provider).await.unwrap(), 1);
}

#[tokio::test]
async fn profile_updates_touch_name_and_phone_only() {
    let market = Marketplace::new();
    let profiles = ProfileService::new(Arc::clone(&market.store));

    let updated = profiles
        .update(
            &market.guest,
            ProfileUpdate {
                full_name: None,
                phone: Some("+91 98765 43210".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("Asha Rao"));
    assert_eq!(updated.phone.as_deref(), Some("+91 98765 43210"));
    assert_eq!(updated.email, market.guest.email);

    let unchanged = profiles
        .update(&market.guest, ProfileUpdate::default())
        .await
        .unwrap();
    assert_eq!(unchanged, updated);
    assert_eq!(profiles.get(market.guest.id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn request_email_carries_the_guest_message_and_dates() {
    let market = Marketplace::new();
    let bookings = market.bookings(BookingPolicy::default());

    bookings
        .create(
            &market.guest,
            BookingRequest {
                property_id: market.property.id,
                start_date: date(2024, 6, 1),
                end_date: date(2024, 6, 4),
                message: Some("Can I bring a <cat>?".to_string()),
            },
        )
        .await
        .unwrap();

    let email = market.mailer.delivered().remove(0);
    let document = Html::parse_document(&email.html);

    let headings: Vec<String> = document
        .select(&Selector::parse("h2").unwrap())
        .map(|h| h.text().collect())
        .collect();
    assert_eq!(
        headings,
        vec![
            "Property Details",
            "Guest Information",
            "Booking Details",
            "Message from Guest"
        ]
    );

    let italic: String = document
        .select(&Selector::parse("p[style*=italic]").unwrap())
        .flat_map(|p| p.text())
        .collect();
    assert_eq!(italic, "Can I bring a <cat>?");

    let link = document
        .select(&Selector::parse("a").unwrap())
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap();
    assert_eq!(link, "http://localhost:3000/dashboard/bookings");

    let text = document.root_element().text().collect::<String>();
    assert!(text.contains("Saturday, 1 June 2024"));
    assert!(text.contains("Tuesday, 4 June 2024"));
}
