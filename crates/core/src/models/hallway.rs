//! Hallway model - a corridor segment drawn on a floor plan

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Position, Resource};
use crate::error::Result;
use crate::invariants;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hallway {
    pub id: Uuid,
    pub building_id: Uuid,
    pub floor_id: Uuid,
    pub name: Option<String>,
    pub start: Position,
    pub end: Position,
    pub width: f64,
    /// Part of a marked evacuation route
    pub emergency_route: bool,
}

impl Hallway {
    pub fn new(building_id: Uuid, floor_id: Uuid, start: Position, end: Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            building_id,
            floor_id,
            name: None,
            start,
            end,
            width: 2.0,
            emergency_route: false,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }
}

fn default_width() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallwayCreate {
    pub building_id: Uuid,
    pub floor_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    pub start: Position,
    pub end: Position,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default)]
    pub emergency_route: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HallwayUpdate {
    pub name: Option<String>,
    pub start: Option<Position>,
    pub end: Option<Position>,
    pub width: Option<f64>,
    pub emergency_route: Option<bool>,
}

impl Resource for Hallway {
    type Create = HallwayCreate;
    type Update = HallwayUpdate;

    const KIND: &'static str = "hallway";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: HallwayCreate) -> Result<Self> {
        let hallway = Hallway {
            name: input.name,
            width: input.width,
            emergency_route: input.emergency_route,
            ..Hallway::new(input.building_id, input.floor_id, input.start, input.end)
        };
        invariants::validate_hallway(&hallway)?;
        Ok(hallway)
    }

    fn apply(&mut self, update: HallwayUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = Some(name);
        }
        if let Some(start) = update.start {
            next.start = start;
        }
        if let Some(end) = update.end {
            next.end = end;
        }
        if let Some(width) = update.width {
            next.width = width;
        }
        if let Some(emergency_route) = update.emergency_route {
            next.emergency_route = emergency_route;
        }
        invariants::validate_hallway(&next)?;
        *self = next;
        Ok(())
    }
}
