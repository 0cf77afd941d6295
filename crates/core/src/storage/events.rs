//! Event storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, parse_uuid_opt, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Event, LocalizedText};

const COLUMNS: &str = "id, title_en, title_fi, description, room_id, starts_at, ends_at";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        title: LocalizedText {
            en: row.get(1)?,
            fi: row.get(2)?,
        },
        description: row.get(3)?,
        room_id: parse_uuid_opt(row.get(4)?)?,
        starts_at: parse_datetime(&row.get::<_, String>(5)?)?,
        ends_at: parse_datetime(&row.get::<_, String>(6)?)?,
    })
}

pub struct EventStore<'a> {
    conn: &'a Connection,
}

impl<'a> EventStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub fn create(&self, event: &Event) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO events ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                event.id.to_string(),
                event.title.en,
                event.title.fi,
                event.description,
                event.room_id.map(|id| id.to_string()),
                event.starts_at.to_rfc3339(),
                event.ends_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM events WHERE id = ?1"),
                params![id.to_string()],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM events ORDER BY starts_at"))?;
        let events = stmt
            .query_map([], event_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub fn update(&self, event: &Event) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE events SET title_en = ?1, title_fi = ?2, description = ?3, room_id = ?4,
                    starts_at = ?5, ends_at = ?6
             WHERE id = ?7",
            params![
                event.title.en,
                event.title.fi,
                event.description,
                event.room_id.map(|id| id.to_string()),
                event.starts_at.to_rfc3339(),
                event.ends_at.to_rfc3339(),
                event.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("event", event.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, event_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM events WHERE id = ?1",
            params![event_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("event", event_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::models::{Building, Event, LocalizedText, Room, RoomType};
    use crate::storage::Database;

    #[test]
    fn test_room_delete_keeps_event() {
        let db = Database::open_in_memory().unwrap();
        let building = Building::new("A".to_string(), LocalizedText::new("Arts", "Taide"));
        db.buildings().create(&building).unwrap();
        let room = Room::new(building.id, 1, "A101".to_string(), RoomType::Auditorium);
        db.rooms().create(&room).unwrap();

        let start = Utc::now();
        let mut event = Event::new(
            LocalizedText::new("Concert", "Konsertti"),
            start,
            start + Duration::hours(2),
        );
        event.room_id = Some(room.id);
        db.events().create(&event).unwrap();

        db.rooms().delete(room.id).unwrap();
        let found = db.events().find_by_id(event.id).unwrap().unwrap();
        assert_eq!(found.room_id, None);
    }

    #[test]
    fn test_missing_event_update_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let event = Event::new(LocalizedText::new("X", ""), now, now);
        assert!(matches!(
            db.events().update(&event),
            Err(crate::Error::NotFound(_))
        ));
    }
}
