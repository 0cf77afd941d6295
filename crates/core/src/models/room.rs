//! Room model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LocalizedText, Position, Resource, Size};
use crate::error::Result;
use crate::invariants;

/// Room categories used for map coloring and directory filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    #[default]
    Classroom,
    Office,
    Laboratory,
    Library,
    Cafeteria,
    Gym,
    Auditorium,
    Restroom,
    Storage,
    Other,
}

impl RoomType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Classroom => "classroom",
            RoomType::Office => "office",
            RoomType::Laboratory => "laboratory",
            RoomType::Library => "library",
            RoomType::Cafeteria => "cafeteria",
            RoomType::Gym => "gym",
            RoomType::Auditorium => "auditorium",
            RoomType::Restroom => "restroom",
            RoomType::Storage => "storage",
            RoomType::Other => "other",
        }
    }

    /// Parse a stored tag; unknown tags map to `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "classroom" => RoomType::Classroom,
            "office" => RoomType::Office,
            "laboratory" => RoomType::Laboratory,
            "library" => RoomType::Library,
            "cafeteria" => RoomType::Cafeteria,
            "gym" => RoomType::Gym,
            "auditorium" => RoomType::Auditorium,
            "restroom" => RoomType::Restroom,
            "storage" => RoomType::Storage,
            _ => RoomType::Other,
        }
    }
}

/// Accessibility flags shown in the visitor directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessibility {
    #[serde(default)]
    pub wheelchair: bool,
    #[serde(default)]
    pub hearing_loop: bool,
    #[serde(default)]
    pub elevator_access: bool,
}

/// A room inside a building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub building_id: Uuid,
    pub floor: i32,
    /// Unique per building (e.g. "M201")
    pub room_number: String,
    pub name: Option<LocalizedText>,
    pub room_type: RoomType,
    pub capacity: Option<u32>,
    pub position: Position,
    pub size: Size,
    pub equipment: Vec<String>,
    pub accessibility: Accessibility,
}

impl Room {
    pub fn new(building_id: Uuid, floor: i32, room_number: String, room_type: RoomType) -> Self {
        Self {
            id: Uuid::new_v4(),
            building_id,
            floor,
            room_number,
            name: None,
            room_type,
            capacity: None,
            position: Position::default(),
            size: Size::new(40.0, 30.0),
            equipment: Vec::new(),
            accessibility: Accessibility::default(),
        }
    }
}

fn default_size() -> Size {
    Size::new(40.0, 30.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreate {
    pub building_id: Uuid,
    #[serde(default)]
    pub floor: i32,
    pub room_number: String,
    #[serde(default)]
    pub name: Option<LocalizedText>,
    #[serde(default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub position: Position,
    #[serde(default = "default_size")]
    pub size: Size,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub accessibility: Accessibility,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomUpdate {
    pub floor: Option<i32>,
    pub room_number: Option<String>,
    pub name: Option<LocalizedText>,
    pub room_type: Option<RoomType>,
    pub capacity: Option<u32>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub equipment: Option<Vec<String>>,
    pub accessibility: Option<Accessibility>,
}

impl Resource for Room {
    type Create = RoomCreate;
    type Update = RoomUpdate;

    const KIND: &'static str = "room";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: RoomCreate) -> Result<Self> {
        let room = Room {
            name: input.name,
            capacity: input.capacity,
            position: input.position,
            size: input.size,
            equipment: input.equipment,
            accessibility: input.accessibility,
            ..Room::new(
                input.building_id,
                input.floor,
                input.room_number,
                input.room_type,
            )
        };
        invariants::validate_room(&room)?;
        Ok(room)
    }

    fn apply(&mut self, update: RoomUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(floor) = update.floor {
            next.floor = floor;
        }
        if let Some(room_number) = update.room_number {
            next.room_number = room_number;
        }
        if let Some(name) = update.name {
            next.name = Some(name);
        }
        if let Some(room_type) = update.room_type {
            next.room_type = room_type;
        }
        if let Some(capacity) = update.capacity {
            next.capacity = Some(capacity);
        }
        if let Some(position) = update.position {
            next.position = position;
        }
        if let Some(size) = update.size {
            next.size = size;
        }
        if let Some(equipment) = update.equipment {
            next.equipment = equipment;
        }
        if let Some(accessibility) = update.accessibility {
            next.accessibility = accessibility;
        }
        invariants::validate_room(&next)?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_type_tags() {
        for room_type in [
            RoomType::Classroom,
            RoomType::Laboratory,
            RoomType::Restroom,
            RoomType::Other,
        ] {
            assert_eq!(RoomType::from_tag(room_type.as_str()), room_type);
        }
        assert_eq!(RoomType::from_tag("boiler"), RoomType::Other);
    }

    #[test]
    fn test_update_rejected_keeps_room() {
        let mut room = Room::new(Uuid::new_v4(), 2, "M201".to_string(), RoomType::Classroom);
        let err = room.apply(RoomUpdate {
            room_number: Some("  ".to_string()),
            ..Default::default()
        });
        assert!(err.is_err());
        assert_eq!(room.room_number, "M201");
    }
}
