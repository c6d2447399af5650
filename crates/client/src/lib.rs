//! Resilient HTTP client for the Uni Control backend.
//!
//! One chokepoint (`ApiClient`) issues every request, stamps user
//! activity, transparently refreshes an expired access token at most once
//! per request, and surfaces a single terminal `SessionExpired` failure
//! when recovery is impossible. Token persistence sits behind the
//! `TokenStorage` trait so embedders can plug in whatever key-value
//! storage the platform offers.

mod activity;
mod auth;
mod endpoints;
mod http;
mod navigate;
mod refresh;
mod token_store;

pub use activity::{ActivityTracker, InactivityWatch, InteractionKind};
pub use auth::LoginResponse;
pub use http::{ApiClient, QueryParams, RequestOptions, SessionTasks};
pub use navigate::{Navigator, NoopNavigator};
pub use refresh::{ProactiveRefresh, RefreshCoordinator, TokenPair};
pub use token_store::{keys, FileTokenStorage, MemoryTokenStorage, TokenStorage, TokenStore};
