//! Shape model - an outline drawn in one of the map builders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Resource;
use crate::drawing::{Outline, Point};
use crate::error::Result;
use crate::invariants;

/// What a drawn outline represents on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Wall,
    Room,
    #[default]
    Building,
    Hallway,
    Area,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Wall => "wall",
            ShapeKind::Room => "room",
            ShapeKind::Building => "building",
            ShapeKind::Hallway => "hallway",
            ShapeKind::Area => "area",
        }
    }

    /// Parse a stored tag; unknown tags map to `Area`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "wall" => ShapeKind::Wall,
            "room" => ShapeKind::Room,
            "building" => ShapeKind::Building,
            "hallway" => ShapeKind::Hallway,
            _ => ShapeKind::Area,
        }
    }
}

/// Caller-supplied metadata attached to a finished outline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeMeta {
    #[serde(default)]
    pub kind: ShapeKind,
    pub label: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub building_id: Option<Uuid>,
    #[serde(default)]
    pub floor: Option<i32>,
}

fn default_color() -> String {
    "#6B7280".to_string()
}

/// A persisted outline with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: Uuid,
    pub kind: ShapeKind,
    pub label: String,
    pub color: String,
    pub points: Vec<Point>,
    pub closed: bool,
    pub building_id: Option<Uuid>,
    pub floor: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Shape {
    /// Attach metadata to an outline produced by the editor
    pub fn from_outline(outline: Outline, meta: ShapeMeta) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: meta.kind,
            label: meta.label,
            color: meta.color,
            points: outline.points,
            closed: outline.closed,
            building_id: meta.building_id,
            floor: meta.floor,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeCreate {
    pub points: Vec<Point>,
    #[serde(default)]
    pub closed: bool,
    #[serde(flatten)]
    pub meta: ShapeMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeUpdate {
    pub kind: Option<ShapeKind>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub points: Option<Vec<Point>>,
    pub closed: Option<bool>,
    /// `Some(None)` detaches the outline from its building
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::nullable::deserialize"
    )]
    pub building_id: Option<Option<Uuid>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::nullable::deserialize"
    )]
    pub floor: Option<Option<i32>>,
}

impl Resource for Shape {
    type Create = ShapeCreate;
    type Update = ShapeUpdate;

    const KIND: &'static str = "shape";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: ShapeCreate) -> Result<Self> {
        let outline = Outline {
            points: input.points,
            closed: input.closed,
        };
        let shape = Shape::from_outline(outline, input.meta);
        invariants::validate_shape(&shape)?;
        Ok(shape)
    }

    fn apply(&mut self, update: ShapeUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(kind) = update.kind {
            next.kind = kind;
        }
        if let Some(label) = update.label {
            next.label = label;
        }
        if let Some(color) = update.color {
            next.color = color;
        }
        if let Some(points) = update.points {
            next.points = points;
        }
        if let Some(closed) = update.closed {
            next.closed = closed;
        }
        if let Some(building_id) = update.building_id {
            next.building_id = building_id;
        }
        if let Some(floor) = update.floor {
            next.floor = floor;
        }
        invariants::validate_shape(&next)?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed_shape() -> Shape {
        Shape::from_outline(
            Outline {
                points: vec![Point::new(0.0, 0.0), Point::new(40.0, 0.0)],
                closed: false,
            },
            ShapeMeta {
                kind: ShapeKind::Wall,
                label: "North wall".to_string(),
                color: "#374151".to_string(),
                building_id: Some(Uuid::new_v4()),
                floor: Some(2),
            },
        )
    }

    #[test]
    fn test_update_can_clear_placement() {
        let mut shape = placed_shape();
        let building_id = shape.building_id;

        let keep: ShapeUpdate = serde_json::from_str(r#"{"label":"Wall"}"#).unwrap();
        shape.apply(keep).unwrap();
        assert_eq!(shape.building_id, building_id);
        assert_eq!(shape.floor, Some(2));

        let clear: ShapeUpdate =
            serde_json::from_str(r#"{"building_id":null,"floor":null}"#).unwrap();
        shape.apply(clear).unwrap();
        assert_eq!(shape.building_id, None);
        assert_eq!(shape.floor, None);

        let place: ShapeUpdate = serde_json::from_str(r#"{"floor":3}"#).unwrap();
        shape.apply(place).unwrap();
        assert_eq!(shape.floor, Some(3));
    }

    #[test]
    fn test_cleared_fields_serialize_as_null() {
        let update = ShapeUpdate {
            floor: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert!(json["floor"].is_null());
        assert!(json.get("floor").is_some());
        assert!(json.get("building_id").is_none());

        let back: ShapeUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(back.floor, Some(None));
        assert_eq!(back.building_id, None);
    }
}
