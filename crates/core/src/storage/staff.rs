//! Staff directory storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{like_pattern, parse_uuid, parse_uuid_opt, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Staff;

const COLUMNS: &str = "id, name, email, phone, position, department, office_room_id, is_active";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        position: row.get(4)?,
        department: row.get(5)?,
        office_room_id: parse_uuid_opt(row.get(6)?)?,
        is_active: row.get::<_, i32>(7)? != 0,
    })
}

pub struct StaffStore<'a> {
    conn: &'a Connection,
}

impl<'a> StaffStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, staff), fields(name = %staff.name))]
    pub fn create(&self, staff: &Staff) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO staff ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                staff.id.to_string(),
                staff.name,
                staff.email,
                staff.phone,
                staff.position,
                staff.department,
                staff.office_room_id.map(|id| id.to_string()),
                staff.is_active as i32,
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Staff>> {
        let staff = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM staff WHERE id = ?1"),
                params![id.to_string()],
                staff_from_row,
            )
            .optional()?;
        Ok(staff)
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Staff>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM staff ORDER BY department, name"))?;
        let staff = stmt
            .query_map([], staff_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(staff)
    }

    /// Active staff whose name, position or department contains `needle`
    #[instrument(skip(self))]
    pub fn search(&self, needle: &str, limit: u32) -> Result<Vec<Staff>> {
        let pattern = like_pattern(needle);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM staff
             WHERE is_active = 1
               AND (lower(name) LIKE ?1 ESCAPE '\\'
                    OR lower(position) LIKE ?1 ESCAPE '\\'
                    OR lower(department) LIKE ?1 ESCAPE '\\')
             ORDER BY name LIMIT ?2"
        ))?;
        let staff = stmt
            .query_map(params![pattern, limit], staff_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(staff)
    }

    #[instrument(skip(self, staff), fields(staff_id = %staff.id))]
    pub fn update(&self, staff: &Staff) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE staff SET name = ?1, email = ?2, phone = ?3, position = ?4, department = ?5,
                    office_room_id = ?6, is_active = ?7
             WHERE id = ?8",
            params![
                staff.name,
                staff.email,
                staff.phone,
                staff.position,
                staff.department,
                staff.office_room_id.map(|id| id.to_string()),
                staff.is_active as i32,
                staff.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("staff", staff.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, staff_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM staff WHERE id = ?1",
            params![staff_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("staff", staff_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Staff;
    use crate::storage::Database;

    #[test]
    fn test_search_skips_inactive() {
        let db = Database::open_in_memory().unwrap();
        let active = Staff::new(
            "Liisa Korhonen".to_string(),
            "Teacher".to_string(),
            "Physics".to_string(),
        );
        let mut retired = Staff::new(
            "Pekka Korhonen".to_string(),
            "Teacher".to_string(),
            "Physics".to_string(),
        );
        retired.is_active = false;
        db.staff().create(&active).unwrap();
        db.staff().create(&retired).unwrap();

        let found = db.staff().search("korhonen", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, active.id);
        assert_eq!(db.staff().list().unwrap().len(), 2);
    }

    #[test]
    fn test_office_must_exist() {
        let db = Database::open_in_memory().unwrap();
        let staff = Staff::new("A".to_string(), "B".to_string(), "C".to_string())
            .with_office(uuid::Uuid::new_v4());
        assert!(db.staff().create(&staff).unwrap_err().is_constraint_violation());
    }
}
