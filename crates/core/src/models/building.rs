//! Building model - a campus building shown on the map

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LocalizedText, Position, Resource};
use crate::error::Result;
use crate::invariants;

/// Default fill color for new buildings
pub const DEFAULT_BUILDING_COLOR: &str = "#3B82F6";

/// A campus building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: Uuid,
    /// Short unique code shown on the map (e.g. "M", "U", "K")
    pub code: String,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    /// Number of floors, at least one
    pub floors: u32,
    /// Map fill color as `#rrggbb`
    pub color: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
}

impl Building {
    pub fn new(code: String, name: LocalizedText) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            name,
            description: None,
            floors: 1,
            color: DEFAULT_BUILDING_COLOR.to_string(),
            position: Position::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_floors(mut self, floors: u32) -> Self {
        self.floors = floors;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

fn default_floors() -> u32 {
    1
}

fn default_color() -> String {
    DEFAULT_BUILDING_COLOR.to_string()
}

/// Payload for creating a building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingCreate {
    pub code: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default = "default_floors")]
    pub floors: u32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub position: Position,
}

/// Payload for updating a building
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingUpdate {
    pub code: Option<String>,
    pub name: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub floors: Option<u32>,
    pub color: Option<String>,
    pub position: Option<Position>,
}

impl Resource for Building {
    type Create = BuildingCreate;
    type Update = BuildingUpdate;

    const KIND: &'static str = "building";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: BuildingCreate) -> Result<Self> {
        let building = Building {
            description: input.description,
            ..Building::new(input.code, input.name)
                .with_floors(input.floors)
                .with_color(input.color)
                .with_position(input.position)
        };
        invariants::validate_building(&building)?;
        Ok(building)
    }

    fn apply(&mut self, update: BuildingUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(code) = update.code {
            next.code = code;
        }
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(description) = update.description {
            next.description = Some(description);
        }
        if let Some(floors) = update.floors {
            next.floors = floors;
        }
        if let Some(color) = update.color {
            next.color = color;
        }
        if let Some(position) = update.position {
            next.position = position;
        }
        invariants::validate_building(&next)?;
        *self = next;
        Ok(())
    }
}
