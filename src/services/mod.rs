//! Marketplace operations around the booking flow.

pub mod favorites;
pub mod inbox;
pub mod listings;
pub mod profiles;
pub mod reviews;

pub use favorites::FavoriteService;
pub use inbox::InboxService;
pub use listings::{ListingDraft, ListingService};
pub use profiles::ProfileService;
pub use reviews::{ReviewOutcome, ReviewService};
