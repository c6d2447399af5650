use crate::token_store::TokenStore;
use common::SessionConfig;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

type SharedRefresh = Shared<BoxFuture<'static, bool>>;

/// Coordinates token refresh so concurrent 401s share one network call.
///
/// The first caller with no refresh in flight starts the real request and
/// parks it in the slot; every caller that arrives before it settles
/// awaits the same shared future. The slot is cleared once settled so a
/// later 401 can start a fresh attempt.
#[derive(Debug, Clone)]
pub struct RefreshCoordinator {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    inflight: Arc<Mutex<Option<SharedRefresh>>>,
}

impl RefreshCoordinator {
    pub fn new(http: reqwest::Client, base_url: String, tokens: TokenStore) -> Self {
        Self {
            http,
            base_url,
            tokens,
            inflight: Arc::new(Mutex::new(None)),
        }
    }

    /// `true` when a fresh pair was obtained and persisted; `false` when
    /// the refresh token is absent or the backend rejected it. Failure is
    /// terminal; the coordinator never retries by itself.
    pub async fn refresh(&self) -> bool {
        let fut = {
            let mut slot = self.inflight.lock();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    let Some(refresh_token) = self.tokens.refresh_token() else {
                        return false;
                    };
                    let fut = Self::do_refresh(
                        self.http.clone(),
                        self.base_url.clone(),
                        self.tokens.clone(),
                        refresh_token,
                    )
                    .boxed()
                    .shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let result = fut.clone().await;

        // Only clear the slot if it still holds the future we awaited; a
        // newer attempt may already have replaced it.
        let mut slot = self.inflight.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&fut)) {
            *slot = None;
        }
        result
    }

    async fn do_refresh(
        http: reqwest::Client,
        base_url: String,
        tokens: TokenStore,
        refresh_token: String,
    ) -> bool {
        let url = format!("{base_url}/auth/refresh");
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let response = match http.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("token refresh request failed: {e}");
                return false;
            }
        };
        if !response.status().is_success() {
            warn!("token refresh rejected: HTTP {}", response.status());
            return false;
        }
        let pair: TokenPair = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!("token refresh body was not a token pair: {e}");
                return false;
            }
        };
        match tokens.set_tokens(&pair.access_token, &pair.refresh_token) {
            Ok(()) => {
                info!("access token refreshed");
                true
            }
            Err(e) => {
                warn!("failed to persist refreshed tokens: {e}");
                false
            }
        }
    }

    /// Spawn the proactive refresh timer: renew the token shortly before
    /// its known lifetime ends so user-facing requests rarely see a 401.
    /// The reactive 401 path still handles whatever this timer misses.
    pub fn spawn_proactive(&self, config: &SessionConfig) -> ProactiveRefresh {
        let coordinator = self.clone();
        let lifetime_ms = config.token_lifetime_ms;
        let threshold_ms = config.refresh_threshold_ms;
        let check_interval = config.refresh_check_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if coordinator.tokens.access_token().is_none() {
                    continue;
                }
                if token_expiring_soon(&coordinator.tokens, lifetime_ms, threshold_ms) {
                    debug!("access token near expiry, refreshing proactively");
                    coordinator.refresh().await;
                }
            }
        });
        ProactiveRefresh { handle }
    }
}

/// A token with no recorded issuance timestamp counts as expiring.
fn token_expiring_soon(tokens: &TokenStore, lifetime_ms: u64, threshold_ms: u64) -> bool {
    match tokens.token_age() {
        Some(age) => age.as_millis() as u64 > lifetime_ms.saturating_sub(threshold_ms),
        None => true,
    }
}

/// Handle owning the proactive refresh task; aborted on drop.
#[derive(Debug)]
pub struct ProactiveRefresh {
    handle: JoinHandle<()>,
}

impl ProactiveRefresh {
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ProactiveRefresh {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
