use crate::navigate::Navigator;
use crate::token_store::TokenStore;
use common::SessionConfig;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// User interaction signals that count as activity. The set is fixed;
/// embedders translate their platform events into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    PointerPress,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

/// Tracks user presence and enforces the inactivity timeout.
///
/// Stamps are throttled: pointer movement can fire hundreds of times a
/// second, but the session only needs coarse (30 s) activity resolution,
/// so at most one stamp per throttle window reaches the token store. The
/// request executor routes every authenticated call through the same
/// gate, so steady API usage keeps a session alive without UI input.
#[derive(Debug)]
pub struct ActivityTracker {
    tokens: TokenStore,
    throttle_ms: i64,
    last_write: AtomicI64,
}

impl ActivityTracker {
    pub fn new(tokens: TokenStore, config: &SessionConfig) -> Self {
        // Initialization itself counts as activity.
        tokens.stamp_activity();
        let now = tokens.clock().now_millis();
        Self {
            tokens,
            throttle_ms: config.activity_throttle_ms as i64,
            last_write: AtomicI64::new(now),
        }
    }

    pub fn record(&self, _kind: InteractionKind) {
        self.touch();
    }

    /// Stamp activity, subject to the shared throttle window.
    pub fn touch(&self) {
        let now = self.tokens.clock().now_millis();
        let last = self.last_write.load(Ordering::Relaxed);
        if now - last <= self.throttle_ms {
            return;
        }
        // A lost race just means a peer stamped for us.
        if self
            .last_write
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            self.tokens.stamp_activity();
        }
    }

    fn idle_for_ms(&self) -> i64 {
        let now = self.tokens.clock().now_millis();
        now.saturating_sub(self.tokens.last_activity())
    }

    /// Spawn the periodic inactivity check. The returned handle owns the
    /// task; dropping it (or calling `stop`) cancels the watchdog.
    pub fn spawn_inactivity_watch(
        self: &Arc<Self>,
        config: &SessionConfig,
        navigator: Arc<dyn Navigator>,
    ) -> InactivityWatch {
        let tracker = Arc::clone(self);
        let timeout_ms = config.inactivity_timeout_ms as i64;
        let check_interval = config.activity_check_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            // The first tick of tokio's interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tracker.tokens.access_token().is_none() {
                    continue;
                }
                let idle = tracker.idle_for_ms();
                if idle >= timeout_ms {
                    info!("session idle for {idle} ms, forcing logout");
                    force_logout(&tracker.tokens, navigator.as_ref());
                } else {
                    debug!("inactivity check: idle {idle} ms");
                }
            }
        });
        InactivityWatch { handle }
    }
}

/// Clear the session, record the reason and send the user to login.
pub(crate) fn force_logout(tokens: &TokenStore, navigator: &dyn Navigator) {
    if let Err(e) = tokens.clear_tokens() {
        tracing::warn!("failed to clear tokens during forced logout: {e}");
    }
    tokens.clear_user();
    tokens.set_logout_reason("inactivity");
    navigator.redirect_to_login();
}

/// Handle for the watchdog task. Aborting on drop guarantees no
/// half-stopped state where the timer outlives its owner.
#[derive(Debug)]
pub struct InactivityWatch {
    handle: JoinHandle<()>,
}

impl InactivityWatch {
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for InactivityWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigate::NoopNavigator;
    use crate::token_store::MemoryTokenStorage;
    use common::{Clock, ManualClock};
    use std::time::Duration;

    fn tracker() -> (Arc<ActivityTracker>, Arc<ManualClock>, TokenStore) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let tokens = TokenStore::new(
            Arc::new(MemoryTokenStorage::new()),
            clock.clone() as Arc<dyn Clock>,
        );
        let config = SessionConfig::default();
        (
            Arc::new(ActivityTracker::new(tokens.clone(), &config)),
            clock,
            tokens,
        )
    }

    #[test]
    fn stamps_are_throttled() {
        let (tracker, clock, tokens) = tracker();
        let initial = tokens.last_activity();

        // Inside the 30 s window: no new stamp.
        clock.advance(Duration::from_secs(10));
        tracker.record(InteractionKind::PointerMove);
        assert_eq!(tokens.last_activity(), initial);

        // Past the window: one stamp goes through.
        clock.advance(Duration::from_secs(25));
        tracker.record(InteractionKind::KeyPress);
        assert_eq!(tokens.last_activity(), clock.now_millis());
    }

    #[test]
    fn api_calls_share_the_throttle_gate() {
        let (tracker, clock, tokens) = tracker();
        clock.advance(Duration::from_secs(31));
        tracker.touch();
        let stamped = tokens.last_activity();
        clock.advance(Duration::from_secs(5));
        tracker.touch();
        assert_eq!(tokens.last_activity(), stamped);
    }

    #[tokio::test]
    async fn watchdog_forces_logout_after_timeout() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let tokens = TokenStore::new(
            Arc::new(MemoryTokenStorage::new()),
            clock.clone() as Arc<dyn Clock>,
        );
        tokens.set_tokens("acc", "ref").unwrap();
        let config = SessionConfig {
            activity_check_interval_ms: 10,
            ..SessionConfig::default()
        };
        let tracker = Arc::new(ActivityTracker::new(tokens.clone(), &config));
        let watch = tracker.spawn_inactivity_watch(&config, Arc::new(NoopNavigator));

        // Push last activity beyond the 24 h timeout.
        clock.advance(Duration::from_millis(config.inactivity_timeout_ms + 1));
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(tokens.access_token().is_none());
        assert_eq!(tokens.take_logout_reason().as_deref(), Some("inactivity"));
        watch.stop();
    }

    #[tokio::test]
    async fn watchdog_leaves_active_session_alone() {
        let (tracker, _clock, tokens) = tracker();
        tokens.set_tokens("acc", "ref").unwrap();
        let config = SessionConfig {
            activity_check_interval_ms: 10,
            ..SessionConfig::default()
        };
        let watch = tracker.spawn_inactivity_watch(&config, Arc::new(NoopNavigator));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(tokens.access_token().is_some());
        watch.stop();
    }
}
