//! Offline cache and background sync records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue a visitor event is parked in while the network is down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStore {
    Searches,
    Navigation,
}

impl SyncStore {
    pub const ALL: [SyncStore; 2] = [SyncStore::Searches, SyncStore::Navigation];

    pub fn as_str(self) -> &'static str {
        match self {
            SyncStore::Searches => "searches",
            SyncStore::Navigation => "navigation",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "searches" => Some(SyncStore::Searches),
            "navigation" => Some(SyncStore::Navigation),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response body kept for offline use
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub cache_name: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

/// An event waiting in a sync queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedItem {
    pub id: i64,
    pub store: SyncStore,
    pub payload: serde_json::Value,
    pub queued_at: DateTime<Utc>,
}

/// Visitor directory hits across buildings, rooms and staff
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub buildings: Vec<super::Building>,
    pub rooms: Vec<super::Room>,
    pub staff: Vec<super::Staff>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty() && self.rooms.is_empty() && self.staff.is_empty()
    }
}
