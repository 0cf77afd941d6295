//! Room storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{like_pattern, localized_opt, parse_json, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Accessibility, Position, Room, RoomType, Size};

const COLUMNS: &str = "id, building_id, floor, room_number, name_en, name_fi, room_type, capacity,
     map_x, map_y, width, height, equipment_json, wheelchair, hearing_loop, elevator_access";

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        building_id: parse_uuid(&row.get::<_, String>(1)?)?,
        floor: row.get(2)?,
        room_number: row.get(3)?,
        name: localized_opt(row.get(4)?, row.get(5)?),
        room_type: RoomType::from_tag(&row.get::<_, String>(6)?),
        capacity: row.get(7)?,
        position: Position::new(row.get(8)?, row.get(9)?),
        size: Size::new(row.get(10)?, row.get(11)?),
        equipment: parse_json(&row.get::<_, String>(12)?)?,
        accessibility: Accessibility {
            wheelchair: row.get::<_, i32>(13)? != 0,
            hearing_loop: row.get::<_, i32>(14)? != 0,
            elevator_access: row.get::<_, i32>(15)? != 0,
        },
    })
}

pub struct RoomStore<'a> {
    conn: &'a Connection,
}

impl<'a> RoomStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, room), fields(room_number = %room.room_number))]
    pub fn create(&self, room: &Room) -> Result<()> {
        let equipment_json = serde_json::to_string(&room.equipment)?;
        self.conn.execute(
            &format!(
                "INSERT INTO rooms ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            params![
                room.id.to_string(),
                room.building_id.to_string(),
                room.floor,
                room.room_number,
                room.name.as_ref().map(|n| n.en.as_str()),
                room.name.as_ref().map(|n| n.fi.as_str()),
                room.room_type.as_str(),
                room.capacity,
                room.position.x,
                room.position.y,
                room.size.width,
                room.size.height,
                equipment_json,
                room.accessibility.wheelchair as i32,
                room.accessibility.hearing_loop as i32,
                room.accessibility.elevator_access as i32,
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Room>> {
        let room = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM rooms WHERE id = ?1"),
                params![id.to_string()],
                room_from_row,
            )
            .optional()?;
        Ok(room)
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Room>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM rooms ORDER BY room_number"))?;
        let rooms = stmt
            .query_map([], room_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    /// List the rooms of one building ordered by floor and number
    #[instrument(skip(self))]
    pub fn list_for_building(&self, building_id: Uuid) -> Result<Vec<Room>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM rooms WHERE building_id = ?1 ORDER BY floor, room_number"
        ))?;
        let rooms = stmt
            .query_map(params![building_id.to_string()], room_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    /// Rooms whose number or name contains `needle` (case-insensitive)
    #[instrument(skip(self))]
    pub fn search(&self, needle: &str, limit: u32) -> Result<Vec<Room>> {
        let pattern = like_pattern(needle);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM rooms
             WHERE lower(room_number) LIKE ?1 ESCAPE '\\'
                OR lower(name_en) LIKE ?1 ESCAPE '\\'
                OR lower(name_fi) LIKE ?1 ESCAPE '\\'
             ORDER BY room_number LIMIT ?2"
        ))?;
        let rooms = stmt
            .query_map(params![pattern, limit], room_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    #[instrument(skip(self, room), fields(room_id = %room.id))]
    pub fn update(&self, room: &Room) -> Result<()> {
        let equipment_json = serde_json::to_string(&room.equipment)?;
        let changed = self.conn.execute(
            "UPDATE rooms SET floor = ?1, room_number = ?2, name_en = ?3, name_fi = ?4,
                    room_type = ?5, capacity = ?6, map_x = ?7, map_y = ?8, width = ?9,
                    height = ?10, equipment_json = ?11,
                    wheelchair = ?12, hearing_loop = ?13, elevator_access = ?14
             WHERE id = ?15",
            params![
                room.floor,
                room.room_number,
                room.name.as_ref().map(|n| n.en.as_str()),
                room.name.as_ref().map(|n| n.fi.as_str()),
                room.room_type.as_str(),
                room.capacity,
                room.position.x,
                room.position.y,
                room.size.width,
                room.size.height,
                equipment_json,
                room.accessibility.wheelchair as i32,
                room.accessibility.hearing_loop as i32,
                room.accessibility.elevator_access as i32,
                room.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("room", room.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, room_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM rooms WHERE id = ?1",
            params![room_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("room", room_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::models::{Building, LocalizedText, Room, RoomType, Staff};
    use crate::storage::Database;

    fn create_test_building(db: &Database) -> Uuid {
        let building = Building::new("M".to_string(), LocalizedText::new("Main", "Pää"));
        db.buildings().create(&building).unwrap();
        building.id
    }

    #[test]
    fn test_room_roundtrip_keeps_equipment_and_flags() {
        let db = Database::open_in_memory().unwrap();
        let building_id = create_test_building(&db);

        let mut room = Room::new(building_id, 2, "M201".to_string(), RoomType::Laboratory);
        room.equipment = vec!["Fume hood".to_string(), "Projector".to_string()];
        room.accessibility.wheelchair = true;
        room.capacity = Some(24);
        db.rooms().create(&room).unwrap();

        let found = db.rooms().find_by_id(room.id).unwrap().unwrap();
        assert_eq!(found, room);
    }

    #[test]
    fn test_search_matches_number_and_name() {
        let db = Database::open_in_memory().unwrap();
        let building_id = create_test_building(&db);

        let mut library = Room::new(building_id, 1, "M110".to_string(), RoomType::Library);
        library.name = Some(LocalizedText::new("Library", "Kirjasto"));
        db.rooms().create(&library).unwrap();
        db.rooms()
            .create(&Room::new(building_id, 2, "M201".to_string(), RoomType::Classroom))
            .unwrap();

        assert_eq!(db.rooms().search("kirja", 10).unwrap().len(), 1);
        assert_eq!(db.rooms().search("m2", 10).unwrap()[0].room_number, "M201");
        assert_eq!(db.rooms().search("m", 10).unwrap().len(), 2);
        assert_eq!(db.rooms().search("m", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_room_delete_clears_staff_office() {
        let db = Database::open_in_memory().unwrap();
        let building_id = create_test_building(&db);
        let room = Room::new(building_id, 1, "M101".to_string(), RoomType::Office);
        db.rooms().create(&room).unwrap();

        let staff = Staff::new(
            "Matti Virtanen".to_string(),
            "Principal".to_string(),
            "Administration".to_string(),
        )
        .with_office(room.id);
        db.staff().create(&staff).unwrap();

        db.rooms().delete(room.id).unwrap();
        let found = db.staff().find_by_id(staff.id).unwrap().unwrap();
        assert_eq!(found.office_room_id, None);
    }
}
