//! Building storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{like_pattern, localized_opt, parse_datetime, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Building, LocalizedText, Position};

const COLUMNS: &str = "id, code, name_en, name_fi, description_en, description_fi, \
                       floors, color, map_x, map_y, created_at";

fn building_from_row(row: &Row<'_>) -> rusqlite::Result<Building> {
    Ok(Building {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        code: row.get(1)?,
        name: LocalizedText {
            en: row.get(2)?,
            fi: row.get(3)?,
        },
        description: localized_opt(row.get(4)?, row.get(5)?),
        floors: row.get(6)?,
        color: row.get(7)?,
        position: Position::new(row.get(8)?, row.get(9)?),
        created_at: parse_datetime(&row.get::<_, String>(10)?)?,
    })
}

pub struct BuildingStore<'a> {
    conn: &'a Connection,
}

impl<'a> BuildingStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new building
    #[instrument(skip(self, building), fields(code = %building.code))]
    pub fn create(&self, building: &Building) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO buildings ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                building.id.to_string(),
                building.code,
                building.name.en,
                building.name.fi,
                building.description.as_ref().map(|d| d.en.as_str()),
                building.description.as_ref().map(|d| d.fi.as_str()),
                building.floors,
                building.color,
                building.position.x,
                building.position.y,
                building.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find building by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Building>> {
        let building = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM buildings WHERE id = ?1"),
                params![id.to_string()],
                building_from_row,
            )
            .optional()?;
        Ok(building)
    }

    /// Find building by its map code
    #[instrument(skip(self))]
    pub fn find_by_code(&self, code: &str) -> Result<Option<Building>> {
        let building = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM buildings WHERE code = ?1"),
                params![code],
                building_from_row,
            )
            .optional()?;
        Ok(building)
    }

    /// List all buildings ordered by code
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Building>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM buildings ORDER BY code"))?;
        let buildings = stmt
            .query_map([], building_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(buildings)
    }

    /// Buildings whose code or name contains `needle` (case-insensitive)
    #[instrument(skip(self))]
    pub fn search(&self, needle: &str, limit: u32) -> Result<Vec<Building>> {
        let pattern = like_pattern(needle);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM buildings
             WHERE lower(code) LIKE ?1 ESCAPE '\\'
                OR lower(name_en) LIKE ?1 ESCAPE '\\'
                OR lower(name_fi) LIKE ?1 ESCAPE '\\'
             ORDER BY code LIMIT ?2"
        ))?;
        let buildings = stmt
            .query_map(params![pattern, limit], building_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(buildings)
    }

    /// Update building
    #[instrument(skip(self, building), fields(building_id = %building.id))]
    pub fn update(&self, building: &Building) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE buildings SET code = ?1, name_en = ?2, name_fi = ?3,
                    description_en = ?4, description_fi = ?5, floors = ?6,
                    color = ?7, map_x = ?8, map_y = ?9
             WHERE id = ?10",
            params![
                building.code,
                building.name.en,
                building.name.fi,
                building.description.as_ref().map(|d| d.en.as_str()),
                building.description.as_ref().map(|d| d.fi.as_str()),
                building.floors,
                building.color,
                building.position.x,
                building.position.y,
                building.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("building", building.id));
        }
        Ok(())
    }

    /// Delete building together with its floors, rooms, hallways and outlines
    #[instrument(skip(self))]
    pub fn delete(&self, building_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM buildings WHERE id = ?1",
            params![building_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("building", building_id));
        }
        Ok(())
    }
}
