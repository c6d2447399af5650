//! Normalized domain collections over the API client: one cached,
//! TTL-stamped collection per resource, optimistic writes with
//! dependent-cache invalidation, and a background poller that refetches
//! only what is both subscribed and stale.

pub mod cache;
pub mod models;
pub mod page;
pub mod poller;
pub mod store;

pub use cache::{CacheEntry, ResourceKind};
pub use models::*;
pub use page::{ListResponse, Page};
pub use poller::Poller;
pub use store::{DataStore, ResourceStatus};
