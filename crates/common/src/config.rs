use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session lifecycle thresholds.
///
/// Defaults follow the production constants of the backend deployment:
/// access tokens live 480 minutes, the proactive refresh fires 3 minutes
/// before expiry, and an idle session is force-logged-out after 24 hours.
/// Everything here is a field, not a constant: deployments disagree on
/// these numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which the session is force-terminated.
    pub inactivity_timeout_ms: u64,
    /// How often the inactivity watchdog wakes up.
    pub activity_check_interval_ms: u64,
    /// Minimum spacing between persisted activity stamps.
    pub activity_throttle_ms: u64,
    /// Known access-token lifetime (must match the backend's
    /// ACCESS_TOKEN_EXPIRE_MINUTES).
    pub token_lifetime_ms: u64,
    /// Refresh proactively when the token is this close to expiry.
    pub refresh_threshold_ms: u64,
    /// How often the proactive refresh timer wakes up.
    pub refresh_check_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: 24 * 60 * 60 * 1000,
            activity_check_interval_ms: 60 * 1000,
            activity_throttle_ms: 30 * 1000,
            token_lifetime_ms: 480 * 60 * 1000,
            refresh_threshold_ms: 3 * 60 * 1000,
            refresh_check_interval_ms: 60 * 1000,
        }
    }
}

impl SessionConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn activity_check_interval(&self) -> Duration {
        Duration::from_millis(self.activity_check_interval_ms)
    }

    pub fn activity_throttle(&self) -> Duration {
        Duration::from_millis(self.activity_throttle_ms)
    }

    pub fn refresh_check_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_check_interval_ms)
    }

    /// Short-lived preset for tests that drive real timers.
    pub fn fast() -> Self {
        Self {
            inactivity_timeout_ms: 200,
            activity_check_interval_ms: 20,
            activity_throttle_ms: 50,
            token_lifetime_ms: 500,
            refresh_threshold_ms: 100,
            refresh_check_interval_ms: 20,
        }
    }
}

/// Poll loop cadence and cache TTL classes.
///
/// Resources fall into three freshness classes rather than per-resource
/// knobs: slow-changing reference data (groups, students, clubs, ...),
/// dashboard statistics, and session-sensitive counters (notifications,
/// unread count).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Main poll tick. A fast tick is cheap: only stale entries refetch.
    pub tick_interval_ms: u64,
    /// Dedicated fast tick for the unread-notification count.
    pub notification_tick_interval_ms: u64,
    /// TTL for heavy, slowly-changing collections.
    pub slow_ttl_ms: u64,
    /// TTL for dashboard statistics.
    pub stats_ttl_ms: u64,
    /// TTL for notifications and the unread count.
    pub fast_ttl_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 15 * 1000,
            notification_tick_interval_ms: 10 * 1000,
            slow_ttl_ms: 5 * 60 * 1000,
            stats_ttl_ms: 60 * 1000,
            fast_ttl_ms: 30 * 1000,
        }
    }
}

impl PollConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn notification_tick_interval(&self) -> Duration {
        Duration::from_millis(self.notification_tick_interval_ms)
    }

    pub fn slow_ttl(&self) -> Duration {
        Duration::from_millis(self.slow_ttl_ms)
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_millis(self.stats_ttl_ms)
    }

    pub fn fast_ttl(&self) -> Duration {
        Duration::from_millis(self.fast_ttl_ms)
    }

    pub fn fast() -> Self {
        Self {
            tick_interval_ms: 20,
            notification_tick_interval_ms: 10,
            slow_ttl_ms: 100,
            stats_ttl_ms: 50,
            fast_ttl_ms: 30,
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://uni.example/api/v1`.
    pub base_url: String,
    /// Whole-request timeout applied by the HTTP client.
    pub request_timeout_ms: u64,
    pub session: SessionConfig,
    pub poll: PollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            request_timeout_ms: 30 * 1000,
            session: SessionConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment.
    ///
    /// `UNICONTROL_API_URL` overrides the base URL; a trailing slash is
    /// stripped so path concatenation stays predictable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();
        if let Ok(url) = std::env::var("UNICONTROL_API_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url: String = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
