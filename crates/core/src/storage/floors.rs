//! Floor storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{localized_opt, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Floor;

const COLUMNS: &str = "id, building_id, floor_number, name_en, name_fi";

fn floor_from_row(row: &Row<'_>) -> rusqlite::Result<Floor> {
    Ok(Floor {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        building_id: parse_uuid(&row.get::<_, String>(1)?)?,
        floor_number: row.get(2)?,
        name: localized_opt(row.get(3)?, row.get(4)?),
    })
}

pub struct FloorStore<'a> {
    conn: &'a Connection,
}

impl<'a> FloorStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(
        skip(self, floor),
        fields(building_id = %floor.building_id, floor = floor.floor_number)
    )]
    pub fn create(&self, floor: &Floor) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO floors ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![
                floor.id.to_string(),
                floor.building_id.to_string(),
                floor.floor_number,
                floor.name.as_ref().map(|n| n.en.as_str()),
                floor.name.as_ref().map(|n| n.fi.as_str()),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Floor>> {
        let floor = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM floors WHERE id = ?1"),
                params![id.to_string()],
                floor_from_row,
            )
            .optional()?;
        Ok(floor)
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Floor>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM floors ORDER BY building_id, floor_number"
        ))?;
        let floors = stmt
            .query_map([], floor_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(floors)
    }

    /// List the floors of one building, lowest first
    #[instrument(skip(self))]
    pub fn list_for_building(&self, building_id: Uuid) -> Result<Vec<Floor>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM floors WHERE building_id = ?1 ORDER BY floor_number"
        ))?;
        let floors = stmt
            .query_map(params![building_id.to_string()], floor_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(floors)
    }

    #[instrument(skip(self, floor), fields(floor_id = %floor.id))]
    pub fn update(&self, floor: &Floor) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE floors SET floor_number = ?1, name_en = ?2, name_fi = ?3 WHERE id = ?4",
            params![
                floor.floor_number,
                floor.name.as_ref().map(|n| n.en.as_str()),
                floor.name.as_ref().map(|n| n.fi.as_str()),
                floor.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("floor", floor.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, floor_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM floors WHERE id = ?1",
            params![floor_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("floor", floor_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::models::{Building, Floor, LocalizedText};
    use crate::storage::Database;

    fn create_test_building(db: &Database) -> Uuid {
        let building = Building::new("U".to_string(), LocalizedText::new("Upper", "Ylä"));
        db.buildings().create(&building).unwrap();
        building.id
    }

    #[test]
    fn test_floors_ordered_per_building() {
        let db = Database::open_in_memory().unwrap();
        let building_id = create_test_building(&db);

        for n in [2, -1, 1] {
            db.floors().create(&Floor::new(building_id, n)).unwrap();
        }

        let numbers: Vec<i32> = db
            .floors()
            .list_for_building(building_id)
            .unwrap()
            .iter()
            .map(|f| f.floor_number)
            .collect();
        assert_eq!(numbers, vec![-1, 1, 2]);
    }

    #[test]
    fn test_duplicate_floor_number_rejected() {
        let db = Database::open_in_memory().unwrap();
        let building_id = create_test_building(&db);
        db.floors().create(&Floor::new(building_id, 1)).unwrap();
        let err = db.floors().create(&Floor::new(building_id, 1)).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_floor_requires_existing_building() {
        let db = Database::open_in_memory().unwrap();
        let err = db.floors().create(&Floor::new(Uuid::new_v4(), 1)).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_building_delete_cascades() {
        let db = Database::open_in_memory().unwrap();
        let building_id = create_test_building(&db);
        let floor = Floor::new(building_id, 1).with_name(LocalizedText::new("Ground", "Pohja"));
        db.floors().create(&floor).unwrap();

        db.buildings().delete(building_id).unwrap();
        assert!(db.floors().find_by_id(floor.id).unwrap().is_none());
    }
}
