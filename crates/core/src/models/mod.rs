//! Data models for the campus map

mod announcement;
mod building;
mod event;
mod floor;
mod hallway;
mod offline;
mod room;
mod settings;
mod shape;
mod staff;
mod user;

pub use announcement::*;
pub use building::*;
pub use event::*;
pub use floor::*;
pub use hallway::*;
pub use offline::*;
pub use room::*;
pub use settings::*;
pub use shape::*;
pub use staff::*;
pub use user::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Text shown in both UI locales (English and Finnish)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub fi: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, fi: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            fi: fi.into(),
        }
    }

    /// True when neither locale carries any text
    pub fn is_blank(&self) -> bool {
        self.en.trim().is_empty() && self.fi.trim().is_empty()
    }

    /// Case-insensitive substring match against either locale
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.en.to_lowercase().contains(needle_lower)
            || self.fi.to_lowercase().contains(needle_lower)
    }
}

/// Position on the campus map canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Footprint size on the campus map canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Update fields that can be cleared: a missing field deserializes to
/// `None`, an explicit `null` to `Some(None)`
pub(crate) mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// A persisted entity exposed through the generic CRUD surface.
///
/// `Create` carries everything needed for a new record; `Update` carries
/// optional replacements. Both paths validate the resulting record.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Create: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Update: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Singular name used in logs and error messages
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    /// Build and validate a new record
    fn from_create(input: Self::Create) -> Result<Self>;

    /// Apply a partial update, leaving `self` untouched on validation failure
    fn apply(&mut self, update: Self::Update) -> Result<()>;
}
