//! Change notification between sessions sharing one store.
//!
//! This is notification, not synchronization: a notice says "reload this
//! collection", delivery is at-most-once and unordered, and concurrent writers to
//! the same collection still overwrite each other.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use innkeep_events::{ChangeNotice, EventBus, InMemoryEventBus, SessionId, Subscription};

use crate::snapshot::Collection;

/// Publishing side, owned by one session.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    session: SessionId,
    bus: Arc<InMemoryEventBus<ChangeNotice>>,
}

impl ChangeFeed {
    /// A new session on `bus`.
    pub fn new(bus: Arc<InMemoryEventBus<ChangeNotice>>) -> Self {
        Self {
            session: SessionId::new(),
            bus,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus<ChangeNotice>> {
        &self.bus
    }

    pub fn publish(&self, collection: Collection, written_at: DateTime<Utc>) {
        let notice = ChangeNotice::new(self.session, collection.key(), written_at);
        if let Err(error) = self.bus.publish(notice) {
            tracing::warn!(?error, collection = %collection, "change notice dropped");
        }
    }

    /// Subscribe to notices from other sessions.
    pub fn listen(&self) -> ChangeListener {
        ChangeListener {
            session: self.session,
            subscription: self.bus.subscribe(),
        }
    }
}

/// Receiving side. Skips notices this session published itself.
#[derive(Debug)]
pub struct ChangeListener {
    session: SessionId,
    subscription: Subscription<ChangeNotice>,
}

impl ChangeListener {
    /// Collections changed by other sessions since the last call, deduplicated.
    pub fn pending(&self) -> Vec<Collection> {
        let mut changed = Vec::new();
        for notice in self.subscription.drain() {
            if let Some(collection) = self.accept(&notice) {
                if !changed.contains(&collection) {
                    changed.push(collection);
                }
            }
        }
        changed
    }

    /// Block up to `timeout` for the next foreign notice.
    pub fn wait(&self, timeout: Duration) -> Option<Collection> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(std::time::Instant::now())?;
            let notice = self.subscription.recv_timeout(remaining).ok()?;
            if let Some(collection) = self.accept(&notice) {
                return Some(collection);
            }
        }
    }

    fn accept(&self, notice: &ChangeNotice) -> Option<Collection> {
        if notice.is_from(self.session) {
            return None;
        }
        let collection = Collection::from_key(&notice.collection);
        if collection.is_none() {
            tracing::debug!(key = %notice.collection, "ignoring notice for unknown collection");
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_notices_are_skipped() {
        let bus = Arc::new(InMemoryEventBus::new());
        let a = ChangeFeed::new(bus.clone());
        let b = ChangeFeed::new(bus);

        let a_listener = a.listen();
        let b_listener = b.listen();

        a.publish(Collection::Items, Utc::now());
        a.publish(Collection::Items, Utc::now());
        a.publish(Collection::Transactions, Utc::now());

        assert!(a_listener.pending().is_empty());
        assert_eq!(
            b_listener.pending(),
            vec![Collection::Items, Collection::Transactions]
        );
    }

    #[test]
    fn wait_times_out_quietly() {
        let feed = ChangeFeed::new(Arc::new(InMemoryEventBus::new()));
        let listener = feed.listen();
        feed.publish(Collection::Users, Utc::now());
        assert_eq!(listener.wait(Duration::from_millis(10)), None);
    }
}
