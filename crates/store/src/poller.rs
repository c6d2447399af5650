//! Background refresh loop over the data store.
//!
//! One tick walks the subscribed resources and refetches only the ones
//! whose cache has gone stale; a faster tick keeps the unread
//! notification count current. Ticks are skipped while the UI is
//! hidden, and a hidden-to-visible transition triggers an immediate
//! refresh pass instead of waiting out the interval.

use crate::cache::ResourceKind;
use crate::store::DataStore;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct Poller {
    store: DataStore,
    subscriptions: Arc<RwLock<HashSet<ResourceKind>>>,
    visible: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    // One slot, not a list: visibility can toggle any number of times
    // over the poller's lifetime.
    visibility_refresh: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            subscriptions: Arc::new(RwLock::new(HashSet::new())),
            visible: Arc::new(AtomicBool::new(true)),
            running: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
            visibility_refresh: Mutex::new(None),
        }
    }

    pub fn subscribe(&self, kind: ResourceKind) {
        self.subscriptions.write().insert(kind);
    }

    pub fn unsubscribe(&self, kind: ResourceKind) {
        self.subscriptions.write().remove(&kind);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the main tick and the notification tick. Calling `start`
    /// on a running poller is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let poll = &self.store.api().config().poll;
        let mut handles = self.handles.lock();

        {
            let store = self.store.clone();
            let subscriptions = Arc::clone(&self.subscriptions);
            let visible = Arc::clone(&self.visible);
            let mut tick = tokio::time::interval(poll.tick_interval());
            handles.push(tokio::spawn(async move {
                loop {
                    tick.tick().await;
                    if !visible.load(Ordering::SeqCst) {
                        continue;
                    }
                    refresh_pass(&store, &subscriptions).await;
                }
            }));
        }

        {
            let store = self.store.clone();
            let subscriptions = Arc::clone(&self.subscriptions);
            let visible = Arc::clone(&self.visible);
            let mut tick = tokio::time::interval(poll.notification_tick_interval());
            handles.push(tokio::spawn(async move {
                loop {
                    tick.tick().await;
                    if !visible.load(Ordering::SeqCst) {
                        continue;
                    }
                    if !subscriptions.read().contains(&ResourceKind::UnreadCount) {
                        continue;
                    }
                    if let Err(e) = store.refresh(ResourceKind::UnreadCount).await {
                        warn!("unread count poll failed: {e}");
                    }
                }
            }));
        }
    }

    /// Gate ticks on UI visibility. Coming back to the foreground kicks
    /// off a refresh pass right away rather than waiting for the next
    /// interval.
    pub fn set_visible(&self, visible: bool) {
        let was_visible = self.visible.swap(visible, Ordering::SeqCst);
        if visible && !was_visible && self.is_running() {
            debug!("visible again, refreshing subscribed resources");
            let store = self.store.clone();
            let subscriptions = Arc::clone(&self.subscriptions);
            let handle = tokio::spawn(async move {
                refresh_pass(&store, &subscriptions).await;
            });
            if let Some(previous) = self.visibility_refresh.lock().replace(handle) {
                previous.abort();
            }
        }
    }

    /// Abort every polling task. No fetch is issued on behalf of the
    /// subscriptions once this returns.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
        if let Some(handle) = self.visibility_refresh.lock().take() {
            handle.abort();
        }
    }
}

/// One pass over the subscription set; only stale caches reach the
/// network, `DataStore::refresh` serves fresh ones locally.
async fn refresh_pass(store: &DataStore, subscriptions: &RwLock<HashSet<ResourceKind>>) {
    let kinds: Vec<ResourceKind> = subscriptions
        .read()
        .iter()
        .copied()
        .filter(|kind| *kind != ResourceKind::UnreadCount)
        .collect();
    for kind in kinds {
        if let Err(e) = store.refresh(kind).await {
            warn!(?kind, "poll refresh failed: {e}");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("running", &self.is_running())
            .field("visible", &self.visible.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::{ApiClient, MemoryTokenStorage, NoopNavigator};
    use common::{ClientConfig, PollConfig, SystemClock};
    use std::time::Duration;

    fn fast_store(url: String) -> DataStore {
        let mut config = ClientConfig::default().with_base_url(url);
        config.poll = PollConfig::fast();
        let api = ApiClient::new(
            config,
            Arc::new(MemoryTokenStorage::new()),
            Arc::new(NoopNavigator),
            Arc::new(SystemClock),
        )
        .unwrap();
        api.tokens().set_tokens("t", "r").unwrap();
        DataStore::new(Arc::new(api))
    }

    #[tokio::test]
    async fn only_subscribed_resources_are_polled() {
        let mut server = mockito::Server::new_async().await;
        let groups = server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body("[]")
            .expect_at_least(1)
            .create_async()
            .await;
        let students = server
            .mock("GET", "/students")
            .with_status(200)
            .with_body("[]")
            .expect(0)
            .create_async()
            .await;

        let poller = Poller::new(fast_store(server.url()));
        poller.subscribe(ResourceKind::Groups);
        poller.start();
        tokio::time::sleep(Duration::from_millis(80)).await;
        poller.stop();

        groups.assert_async().await;
        students.assert_async().await;
    }

    #[tokio::test]
    async fn stop_prevents_any_further_fetch() {
        let mut server = mockito::Server::new_async().await;
        let before = server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body("[]")
            .expect_at_least(1)
            .create_async()
            .await;

        let poller = Poller::new(fast_store(server.url()));
        poller.subscribe(ResourceKind::Groups);
        poller.start();
        tokio::time::sleep(Duration::from_millis(60)).await;
        poller.stop();

        before.assert_async().await;

        // A newer mock takes precedence, so any request issued past
        // this point would land here.
        let after = server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body("[]")
            .expect(0)
            .create_async()
            .await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        after.assert_async().await;
    }

    #[tokio::test]
    async fn hidden_poller_skips_ticks_until_visible_again() {
        let mut server = mockito::Server::new_async().await;
        let unread = server
            .mock("GET", "/notifications/unread-count")
            .with_status(200)
            .with_body(r#"{"count": 1}"#)
            .expect(0)
            .create_async()
            .await;

        let poller = Poller::new(fast_store(server.url()));
        poller.subscribe(ResourceKind::UnreadCount);
        poller.set_visible(false);
        poller.start();
        tokio::time::sleep(Duration::from_millis(80)).await;
        unread.assert_async().await;

        let visible_again = server
            .mock("GET", "/notifications/unread-count")
            .with_status(200)
            .with_body(r#"{"count": 1}"#)
            .expect_at_least(1)
            .create_async()
            .await;
        poller.set_visible(true);
        tokio::time::sleep(Duration::from_millis(80)).await;
        poller.stop();
        visible_again.assert_async().await;
    }

    #[tokio::test]
    async fn visibility_toggles_leave_nothing_running_after_stop() {
        let mut server = mockito::Server::new_async().await;
        let before = server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body("[]")
            .expect_at_least(1)
            .create_async()
            .await;

        let poller = Poller::new(fast_store(server.url()));
        poller.subscribe(ResourceKind::Groups);
        poller.start();
        for _ in 0..5 {
            poller.set_visible(false);
            poller.set_visible(true);
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        poller.stop();

        before.assert_async().await;

        let after = server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body("[]")
            .expect(0)
            .create_async()
            .await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        after.assert_async().await;
    }

    #[tokio::test]
    async fn dropping_the_poller_stops_it() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let poller = Poller::new(fast_store(server.url()));
        poller.subscribe(ResourceKind::Groups);
        poller.start();
        tokio::time::sleep(Duration::from_millis(40)).await;
        drop(poller);

        let after = server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body("[]")
            .expect(0)
            .create_async()
            .await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        after.assert_async().await;
    }
}
