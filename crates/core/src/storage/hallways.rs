//! Hallway storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Hallway, Position};

const COLUMNS: &str =
    "id, building_id, floor_id, name, start_x, start_y, end_x, end_y, width, emergency_route";

fn hallway_from_row(row: &Row<'_>) -> rusqlite::Result<Hallway> {
    Ok(Hallway {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        building_id: parse_uuid(&row.get::<_, String>(1)?)?,
        floor_id: parse_uuid(&row.get::<_, String>(2)?)?,
        name: row.get(3)?,
        start: Position::new(row.get(4)?, row.get(5)?),
        end: Position::new(row.get(6)?, row.get(7)?),
        width: row.get(8)?,
        emergency_route: row.get::<_, i32>(9)? != 0,
    })
}

pub struct HallwayStore<'a> {
    conn: &'a Connection,
}

impl<'a> HallwayStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, hallway), fields(floor_id = %hallway.floor_id))]
    pub fn create(&self, hallway: &Hallway) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO hallways ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                hallway.id.to_string(),
                hallway.building_id.to_string(),
                hallway.floor_id.to_string(),
                hallway.name,
                hallway.start.x,
                hallway.start.y,
                hallway.end.x,
                hallway.end.y,
                hallway.width,
                hallway.emergency_route as i32,
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Hallway>> {
        let hallway = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM hallways WHERE id = ?1"),
                params![id.to_string()],
                hallway_from_row,
            )
            .optional()?;
        Ok(hallway)
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Hallway>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM hallways ORDER BY building_id, floor_id"))?;
        let hallways = stmt
            .query_map([], hallway_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(hallways)
    }

    #[instrument(skip(self))]
    pub fn list_for_building(&self, building_id: Uuid) -> Result<Vec<Hallway>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM hallways WHERE building_id = ?1 ORDER BY floor_id"
        ))?;
        let hallways = stmt
            .query_map(params![building_id.to_string()], hallway_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(hallways)
    }

    #[instrument(skip(self, hallway), fields(hallway_id = %hallway.id))]
    pub fn update(&self, hallway: &Hallway) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE hallways SET name = ?1, start_x = ?2, start_y = ?3, end_x = ?4, end_y = ?5,
                    width = ?6, emergency_route = ?7
             WHERE id = ?8",
            params![
                hallway.name,
                hallway.start.x,
                hallway.start.y,
                hallway.end.x,
                hallway.end.y,
                hallway.width,
                hallway.emergency_route as i32,
                hallway.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("hallway", hallway.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, hallway_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM hallways WHERE id = ?1",
            params![hallway_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("hallway", hallway_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Building, Floor, Hallway, LocalizedText, Position};
    use crate::storage::Database;

    #[test]
    fn test_hallway_follows_floor_delete() {
        let db = Database::open_in_memory().unwrap();
        let building = Building::new("K".to_string(), LocalizedText::new("Kitchen", "Keittiö"));
        db.buildings().create(&building).unwrap();
        let floor = Floor::new(building.id, 1);
        db.floors().create(&floor).unwrap();

        let mut hallway = Hallway::new(
            building.id,
            floor.id,
            Position::new(0.0, 0.0),
            Position::new(30.0, 40.0),
        );
        hallway.emergency_route = true;
        db.hallways().create(&hallway).unwrap();

        let found = db.hallways().find_by_id(hallway.id).unwrap().unwrap();
        assert!(found.emergency_route);
        assert_eq!(found.length(), 50.0);
        assert_eq!(db.hallways().list_for_building(building.id).unwrap().len(), 1);

        db.floors().delete(floor.id).unwrap();
        assert!(db.hallways().find_by_id(hallway.id).unwrap().is_none());
    }
}
