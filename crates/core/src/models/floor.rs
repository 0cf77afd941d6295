//! Floor model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LocalizedText, Resource};
use crate::error::Result;
use crate::invariants;

/// One floor of a building. Floor numbers are unique per building and may
/// be negative for basements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub id: Uuid,
    pub building_id: Uuid,
    pub floor_number: i32,
    pub name: Option<LocalizedText>,
}

impl Floor {
    pub fn new(building_id: Uuid, floor_number: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            building_id,
            floor_number,
            name: None,
        }
    }

    pub fn with_name(mut self, name: LocalizedText) -> Self {
        self.name = Some(name);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorCreate {
    pub building_id: Uuid,
    pub floor_number: i32,
    #[serde(default)]
    pub name: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloorUpdate {
    pub floor_number: Option<i32>,
    pub name: Option<LocalizedText>,
}

impl Resource for Floor {
    type Create = FloorCreate;
    type Update = FloorUpdate;

    const KIND: &'static str = "floor";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: FloorCreate) -> Result<Self> {
        let floor = Floor {
            name: input.name,
            ..Floor::new(input.building_id, input.floor_number)
        };
        invariants::validate_floor(&floor)?;
        Ok(floor)
    }

    fn apply(&mut self, update: FloorUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(floor_number) = update.floor_number {
            next.floor_number = floor_number;
        }
        if let Some(name) = update.name {
            next.name = Some(name);
        }
        invariants::validate_floor(&next)?;
        *self = next;
        Ok(())
    }
}
