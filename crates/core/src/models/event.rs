//! Campus event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LocalizedText, Resource};
use crate::error::Result;
use crate::invariants;

/// A scheduled event, optionally held in a specific room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: LocalizedText,
    pub description: Option<String>,
    pub room_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Event {
    pub fn new(title: LocalizedText, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description: None,
            room_id: None,
            starts_at,
            ends_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCreate {
    pub title: LocalizedText,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    pub title: Option<LocalizedText>,
    pub description: Option<String>,
    pub room_id: Option<Uuid>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl Resource for Event {
    type Create = EventCreate;
    type Update = EventUpdate;

    const KIND: &'static str = "event";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: EventCreate) -> Result<Self> {
        let event = Event {
            description: input.description,
            room_id: input.room_id,
            ..Event::new(input.title, input.starts_at, input.ends_at)
        };
        invariants::validate_event(&event)?;
        Ok(event)
    }

    fn apply(&mut self, update: EventUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(title) = update.title {
            next.title = title;
        }
        if let Some(description) = update.description {
            next.description = Some(description);
        }
        if let Some(room_id) = update.room_id {
            next.room_id = Some(room_id);
        }
        if let Some(starts_at) = update.starts_at {
            next.starts_at = starts_at;
        }
        if let Some(ends_at) = update.ends_at {
            next.ends_at = ends_at;
        }
        invariants::validate_event(&next)?;
        *self = next;
        Ok(())
    }
}
