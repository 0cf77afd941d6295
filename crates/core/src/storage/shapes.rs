//! Drawn shape storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_json, parse_uuid, parse_uuid_opt, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Shape, ShapeKind};

const COLUMNS: &str = "id, kind, label, color, points_json, closed, building_id, floor, created_at";

fn shape_from_row(row: &Row<'_>) -> rusqlite::Result<Shape> {
    Ok(Shape {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        kind: ShapeKind::from_tag(&row.get::<_, String>(1)?),
        label: row.get(2)?,
        color: row.get(3)?,
        points: parse_json(&row.get::<_, String>(4)?)?,
        closed: row.get::<_, i32>(5)? != 0,
        building_id: parse_uuid_opt(row.get(6)?)?,
        floor: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

pub struct ShapeStore<'a> {
    conn: &'a Connection,
}

impl<'a> ShapeStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(
        skip(self, shape),
        fields(kind = shape.kind.as_str(), points = shape.points.len())
    )]
    pub fn create(&self, shape: &Shape) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO shapes ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                shape.id.to_string(),
                shape.kind.as_str(),
                shape.label,
                shape.color,
                serde_json::to_string(&shape.points)?,
                shape.closed as i32,
                shape.building_id.map(|id| id.to_string()),
                shape.floor,
                shape.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Shape>> {
        let shape = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM shapes WHERE id = ?1"),
                params![id.to_string()],
                shape_from_row,
            )
            .optional()?;
        Ok(shape)
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Shape>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM shapes ORDER BY created_at"))?;
        let shapes = stmt
            .query_map([], shape_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(shapes)
    }

    #[instrument(skip(self, shape), fields(shape_id = %shape.id))]
    pub fn update(&self, shape: &Shape) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE shapes SET kind = ?1, label = ?2, color = ?3, points_json = ?4, closed = ?5,
                    building_id = ?6, floor = ?7
             WHERE id = ?8",
            params![
                shape.kind.as_str(),
                shape.label,
                shape.color,
                serde_json::to_string(&shape.points)?,
                shape.closed as i32,
                shape.building_id.map(|id| id.to_string()),
                shape.floor,
                shape.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("shape", shape.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete(&self, shape_id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM shapes WHERE id = ?1",
            params![shape_id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("shape", shape_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::drawing::{Click, Point, ShapeEditor};
    use crate::models::{Shape, ShapeKind, ShapeMeta};
    use crate::storage::Database;

    #[test]
    fn test_editor_outline_persists() {
        let db = Database::open_in_memory().unwrap();
        let mut editor = ShapeEditor::new(20).unwrap();
        editor.click(Point::new(21.0, 19.0));
        editor.click(Point::new(101.0, 5.0));
        let outline = match editor.click(Point::new(22.0, 18.0)) {
            Click::Closed(outline) => outline,
            other => panic!("expected auto-close, got {:?}", other),
        };

        let shape = Shape::from_outline(
            outline,
            ShapeMeta {
                kind: ShapeKind::Wall,
                label: "North wall".to_string(),
                color: "#374151".to_string(),
                building_id: None,
                floor: Some(2),
            },
        );
        db.shapes().create(&shape).unwrap();

        let found = db.shapes().find_by_id(shape.id).unwrap().unwrap();
        assert_eq!(found.points, vec![Point::new(20.0, 20.0), Point::new(100.0, 0.0)]);
        assert!(found.closed);
        assert_eq!(found.kind, ShapeKind::Wall);
        assert_eq!(found.floor, Some(2));
    }
}
