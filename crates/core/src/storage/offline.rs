//! Offline response cache and background sync queue

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::{debug, instrument};

use super::parse::{parse_datetime, parse_json, OptionalExt};
use crate::error::Result;
use crate::models::{CachedResponse, QueuedItem, SyncStore};

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<CachedResponse> {
    Ok(CachedResponse {
        cache_name: row.get(0)?,
        url: row.get(1)?,
        status: row.get(2)?,
        content_type: row.get(3)?,
        body: row.get(4)?,
        stored_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

fn queued_from_row(row: &Row<'_>) -> rusqlite::Result<QueuedItem> {
    let tag: String = row.get(1)?;
    let store = SyncStore::from_tag(&tag).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown sync store {:?}", tag).into(),
        )
    })?;
    Ok(QueuedItem {
        id: row.get(0)?,
        store,
        payload: parse_json(&row.get::<_, String>(2)?)?,
        queued_at: parse_datetime(&row.get::<_, String>(3)?)?,
    })
}

pub struct OfflineStore<'a> {
    conn: &'a Connection,
}

impl<'a> OfflineStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Store or replace the cached response for `(cache_name, url)`
    #[instrument(skip(self, response), fields(cache = %response.cache_name, url = %response.url))]
    pub fn put_response(&self, response: &CachedResponse) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO offline_responses
                (cache_name, url, status, content_type, body, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                response.cache_name,
                response.url,
                response.status,
                response.content_type,
                response.body,
                response.stored_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn get_response(&self, cache_name: &str, url: &str) -> Result<Option<CachedResponse>> {
        let response = self
            .conn
            .query_row(
                "SELECT cache_name, url, status, content_type, body, stored_at
                 FROM offline_responses WHERE cache_name = ?1 AND url = ?2",
                params![cache_name, url],
                response_from_row,
            )
            .optional()?;
        Ok(response)
    }

    /// Look `url` up across every cache, most recently stored first
    #[instrument(skip(self))]
    pub fn match_any(&self, url: &str) -> Result<Option<CachedResponse>> {
        let response = self
            .conn
            .query_row(
                "SELECT cache_name, url, status, content_type, body, stored_at
                 FROM offline_responses WHERE url = ?1 ORDER BY stored_at DESC LIMIT 1",
                params![url],
                response_from_row,
            )
            .optional()?;
        Ok(response)
    }

    /// Drop every cache whose name is not in `keep`, returning the rows removed
    #[instrument(skip(self))]
    pub fn retain_caches(&self, keep: &[&str]) -> Result<u64> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT cache_name FROM offline_responses")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut removed = 0;
        for name in names.iter().filter(|n| !keep.contains(&n.as_str())) {
            debug!(cache = %name, "Deleting stale cache");
            removed += self.conn.execute(
                "DELETE FROM offline_responses WHERE cache_name = ?1",
                params![name],
            )? as u64;
        }
        Ok(removed)
    }

    /// Park an event until the next sync run
    #[instrument(skip(self, payload))]
    pub fn enqueue(&self, store: SyncStore, payload: &serde_json::Value) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO offline_queue (store, payload_json, queued_at) VALUES (?1, ?2, ?3)",
            params![
                store.as_str(),
                serde_json::to_string(payload)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    #[instrument(skip(self))]
    pub fn queued(&self, store: SyncStore) -> Result<Vec<QueuedItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, store, payload_json, queued_at FROM offline_queue
             WHERE store = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![store.as_str()], queued_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn remove_queued(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM offline_queue WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn queue_len(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM offline_queue", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use crate::models::{CachedResponse, SyncStore};
    use crate::storage::Database;

    fn response(cache: &str, url: &str, body: &str) -> CachedResponse {
        CachedResponse {
            cache_name: cache.to_string(),
            url: url.to_string(),
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
            stored_at: Utc::now(),
        }
    }

    #[test]
    fn test_put_replaces_same_url() {
        let db = Database::open_in_memory().unwrap();
        db.offline().put_response(&response("api", "/api/rooms", "[]")).unwrap();
        db.offline().put_response(&response("api", "/api/rooms", "[1]")).unwrap();

        let found = db.offline().get_response("api", "/api/rooms").unwrap().unwrap();
        assert_eq!(found.body, b"[1]");
        assert!(db.offline().get_response("static", "/api/rooms").unwrap().is_none());
        assert!(db.offline().match_any("/api/rooms").unwrap().is_some());
    }

    #[test]
    fn test_retain_caches_drops_old_versions() {
        let db = Database::open_in_memory().unwrap();
        db.offline().put_response(&response("ksyk-static-v0", "/app.js", "old")).unwrap();
        db.offline().put_response(&response("ksyk-static-v1", "/app.js", "new")).unwrap();

        assert_eq!(db.offline().retain_caches(&["ksyk-static-v1"]).unwrap(), 1);
        assert_eq!(db.offline().match_any("/app.js").unwrap().unwrap().body, b"new");
    }

    #[test]
    fn test_queue_per_store() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .offline()
            .enqueue(SyncStore::Searches, &json!({"query": "gym"}))
            .unwrap();
        db.offline()
            .enqueue(SyncStore::Navigation, &json!({"to": "A101"}))
            .unwrap();

        let searches = db.offline().queued(SyncStore::Searches).unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].payload["query"], "gym");
        assert_eq!(db.offline().queue_len().unwrap(), 2);

        db.offline().remove_queued(id).unwrap();
        assert!(db.offline().queued(SyncStore::Searches).unwrap().is_empty());
    }
}
