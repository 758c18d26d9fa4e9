//! Change notices: "this collection was rewritten, reload it".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one running session (one open dashboard, one process).
///
/// Sessions ignore notices they published themselves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Published after a collection snapshot has been written.
///
/// A notice carries no data. Receivers re-read the whole collection from storage.
/// Two sessions writing the same collection race; the later write wins and the
/// earlier one is lost without any signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub notice_id: Uuid,
    pub origin: SessionId,
    /// Storage key of the rewritten collection.
    pub collection: String,
    pub written_at: DateTime<Utc>,
}

impl ChangeNotice {
    pub fn new(origin: SessionId, collection: impl Into<String>, written_at: DateTime<Utc>) -> Self {
        Self {
            notice_id: Uuid::now_v7(),
            origin,
            collection: collection.into(),
            written_at,
        }
    }

    pub fn is_from(&self, session: SessionId) -> bool {
        self.origin == session
    }
}
