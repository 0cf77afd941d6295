//! Staff directory model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Resource;
use crate::error::Result;
use crate::invariants;

/// A staff member listed in the visitor directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: String,
    pub department: String,
    /// Room the staff member's office is in, cleared when the room is deleted
    pub office_room_id: Option<Uuid>,
    pub is_active: bool,
}

impl Staff {
    pub fn new(name: String, position: String, department: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: None,
            phone: None,
            position,
            department,
            office_room_id: None,
            is_active: true,
        }
    }

    pub fn with_office(mut self, room_id: Uuid) -> Self {
        self.office_room_id = Some(room_id);
        self
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCreate {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub position: String,
    pub department: String,
    #[serde(default)]
    pub office_room_id: Option<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub office_room_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl Resource for Staff {
    type Create = StaffCreate;
    type Update = StaffUpdate;

    const KIND: &'static str = "staff";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: StaffCreate) -> Result<Self> {
        let staff = Staff {
            email: input.email,
            phone: input.phone,
            office_room_id: input.office_room_id,
            is_active: input.is_active,
            ..Staff::new(input.name, input.position, input.department)
        };
        invariants::validate_staff(&staff)?;
        Ok(staff)
    }

    fn apply(&mut self, update: StaffUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(email) = update.email {
            next.email = Some(email);
        }
        if let Some(phone) = update.phone {
            next.phone = Some(phone);
        }
        if let Some(position) = update.position {
            next.position = position;
        }
        if let Some(department) = update.department {
            next.department = department;
        }
        if let Some(room_id) = update.office_room_id {
            next.office_room_id = Some(room_id);
        }
        if let Some(is_active) = update.is_active {
            next.is_active = is_active;
        }
        invariants::validate_staff(&next)?;
        *self = next;
        Ok(())
    }
}
