//! Server-side sink for synced visitor events

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;

use crate::error::Result;
use crate::models::SyncStore;

pub struct AnalyticsStore<'a> {
    conn: &'a Connection,
}

impl<'a> AnalyticsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, payload))]
    pub fn record(&self, store: SyncStore, payload: &serde_json::Value) -> Result<()> {
        self.conn.execute(
            "INSERT INTO analytics_events (store, payload_json, received_at) VALUES (?1, ?2, ?3)",
            params![
                store.as_str(),
                serde_json::to_string(payload)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn count(&self, store: SyncStore) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM analytics_events WHERE store = ?1",
            params![store.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::models::SyncStore;
    use crate::storage::Database;

    #[test]
    fn test_counts_per_store() {
        let db = Database::open_in_memory().unwrap();
        db.analytics().record(SyncStore::Searches, &json!({"q": "kirjasto"})).unwrap();
        db.analytics().record(SyncStore::Searches, &json!({"q": "sali"})).unwrap();
        assert_eq!(db.analytics().count(SyncStore::Searches).unwrap(), 2);
        assert_eq!(db.analytics().count(SyncStore::Navigation).unwrap(), 0);
    }
}
