pub mod memory;
pub mod rest;
pub mod traits;
pub mod types;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use traits::{
    BookingStore, FavoriteStore, NotificationStore, OutboxStore, ProfileStore, PropertyStore,
    ReviewStore, Store, StoreResult,
};
pub use types::{BudgetRange, PropertyFilter};
