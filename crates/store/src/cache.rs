use std::time::Duration;

/// Cached collections the store manages and the poller can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Groups,
    Students,
    Schedule,
    Attendance,
    Notifications,
    Reports,
    Clubs,
    Subjects,
    Directions,
    Tournaments,
    Stats,
    UnreadCount,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Groups,
            ResourceKind::Students,
            ResourceKind::Schedule,
            ResourceKind::Attendance,
            ResourceKind::Notifications,
            ResourceKind::Reports,
            ResourceKind::Clubs,
            ResourceKind::Subjects,
            ResourceKind::Directions,
            ResourceKind::Tournaments,
            ResourceKind::Stats,
            ResourceKind::UnreadCount,
        ]
    }
}

/// A collection with a freshness stamp.
///
/// `data` and `timestamp` move independently on purpose: invalidation
/// drops only the stamp, so optimistic local data keeps rendering while
/// the next read refetches.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    data: Option<T>,
    timestamp: Option<i64>,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: None,
            timestamp: None,
            ttl,
        }
    }

    /// Fresh iff a fetch has been stamped and its age is strictly below
    /// the TTL.
    pub fn is_fresh(&self, now_millis: i64) -> bool {
        match self.timestamp {
            Some(stamp) => now_millis.saturating_sub(stamp) < self.ttl.as_millis() as i64,
            None => false,
        }
    }

    pub fn store(&mut self, data: T, now_millis: i64) {
        self.data = Some(data);
        self.timestamp = Some(now_millis);
    }

    /// Mark stale without dropping the data.
    pub fn invalidate(&mut self) {
        self.timestamp = None;
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.data.as_mut()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
