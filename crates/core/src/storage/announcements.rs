//! Announcement storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_datetime_opt, parse_uuid, priority_from_u8, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Announcement, LocalizedText};

const COLUMNS: &str = "id, title_en, title_fi, content_en, content_fi, priority, \
                       published_at, expires_at, is_active, created_at";

fn announcement_from_row(row: &Row<'_>) -> rusqlite::Result<Announcement> {
    Ok(Announcement {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        title: LocalizedText {
            en: row.get(1)?,
            fi: row.get(2)?,
        },
        content: LocalizedText {
            en: row.get(3)?,
            fi: row.get(4)?,
        },
        priority: priority_from_u8(row.get(5)?),
        published_at: parse_datetime(&row.get::<_, String>(6)?)?,
        expires_at: parse_datetime_opt(row.get(7)?)?,
        is_active: row.get::<_, i32>(8)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(9)?)?,
    })
}

pub struct AnnouncementStore<'a> {
    conn: &'a Connection,
}

impl<'a> AnnouncementStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, announcement), fields(announcement_id = %announcement.id))]
    pub fn create(&self, announcement: &Announcement) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO announcements ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                announcement.id.to_string(),
                announcement.title.en,
                announcement.title.fi,
                announcement.content.en,
                announcement.content.fi,
                announcement.priority as u8,
                announcement.published_at.to_rfc3339(),
                announcement.expires_at.map(|t| t.to_rfc3339()),
                announcement.is_active as i32,
                announcement.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let announcement = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM announcements WHERE id = ?1"),
                params![id.to_string()],
                announcement_from_row,
            )
            .optional()?;
        Ok(announcement)
    }

    /// All announcements, most pressing and newest first
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Announcement>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM announcements ORDER BY priority DESC, published_at DESC"
        ))?;
        let announcements = stmt
            .query_map([], announcement_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(announcements)
    }

    /// Announcements visitors should see at `now`
    #[instrument(skip(self))]
    pub fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM announcements WHERE is_active = 1
             ORDER BY priority DESC, published_at DESC"
        ))?;
        let announcements = stmt
            .query_map([], announcement_from_row)?
            .filter(|row| row.as_ref().map_or(true, |a| a.is_visible_at(now)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(announcements)
    }

    #[instrument(skip(self, announcement), fields(announcement_id = %announcement.id))]
    pub fn update(&self, announcement: &Announcement) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE announcements SET title_en = ?1, title_fi = ?2,
                    content_en = ?3, content_fi = ?4, priority = ?5,
                    published_at = ?6, expires_at = ?7, is_active = ?8
             WHERE id = ?9",
            params![
                announcement.title.en,
                announcement.title.fi,
                announcement.content.en,
                announcement.content.fi,
                announcement.priority as u8,
                announcement.published_at.to_rfc3339(),
                announcement.expires_at.map(|t| t.to_rfc3339()),
                announcement.is_active as i32,
                announcement.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("announcement", announcement.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, announcement_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM announcements WHERE id = ?1",
            params![announcement_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("announcement", announcement_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::models::{Announcement, LocalizedText, Priority};
    use crate::storage::Database;

    fn notice(title: &str, priority: Priority) -> Announcement {
        let mut a = Announcement::new(
            LocalizedText::new(title, title),
            LocalizedText::new("Body", "Sisältö"),
        );
        a.priority = priority;
        a
    }

    #[test]
    fn test_active_ordered_by_priority() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();

        let normal = notice("Lunch", Priority::Normal);
        let urgent = notice("Water leak", Priority::Urgent);
        let mut expired = notice("Old", Priority::High);
        expired.published_at = now - Duration::days(2);
        expired.expires_at = Some(now - Duration::days(1));
        let mut hidden = notice("Draft", Priority::High);
        hidden.is_active = false;
        let mut scheduled = notice("Next week", Priority::High);
        scheduled.published_at = now + Duration::days(7);

        for a in [&normal, &urgent, &expired, &hidden, &scheduled] {
            db.announcements().create(a).unwrap();
        }

        let active = db.announcements().list_active(now).unwrap();
        let ids: Vec<_> = active.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![urgent.id, normal.id]);
        assert_eq!(db.announcements().list().unwrap().len(), 5);
    }

    #[test]
    fn test_roundtrip_priority() {
        let db = Database::open_in_memory().unwrap();
        let a = notice("Exam", Priority::High);
        db.announcements().create(&a).unwrap();
        let found = db.announcements().find_by_id(a.id).unwrap().unwrap();
        assert_eq!(found.priority, Priority::High);
        assert_eq!(found.title, a.title);
    }
}
