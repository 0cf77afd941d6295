//! Announcement model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LocalizedText, Resource};
use crate::error::Result;
use crate::invariants;

/// Announcement priority, ordered from least to most pressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Urgent = 3,
}

/// A bilingual notice shown on the visitor screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: LocalizedText,
    pub content: LocalizedText,
    pub priority: Priority,
    pub published_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    pub fn new(title: LocalizedText, content: LocalizedText) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            priority: Priority::Normal,
            published_at: now,
            expires_at: None,
            is_active: true,
            created_at: now,
        }
    }

    /// Whether visitors should see this announcement at `now`
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.published_at <= now
            && self.expires_at.map_or(true, |expires| now < expires)
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementCreate {
    pub title: LocalizedText,
    pub content: LocalizedText,
    #[serde(default)]
    pub priority: Priority,
    /// Defaults to the creation time
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnouncementUpdate {
    pub title: Option<LocalizedText>,
    pub content: Option<LocalizedText>,
    pub priority: Option<Priority>,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl Resource for Announcement {
    type Create = AnnouncementCreate;
    type Update = AnnouncementUpdate;

    const KIND: &'static str = "announcement";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: AnnouncementCreate) -> Result<Self> {
        let mut announcement = Announcement::new(input.title, input.content);
        announcement.priority = input.priority;
        if let Some(published_at) = input.published_at {
            announcement.published_at = published_at;
        }
        announcement.expires_at = input.expires_at;
        announcement.is_active = input.is_active;
        invariants::validate_announcement(&announcement)?;
        Ok(announcement)
    }

    fn apply(&mut self, update: AnnouncementUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(title) = update.title {
            next.title = title;
        }
        if let Some(content) = update.content {
            next.content = content;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        if let Some(published_at) = update.published_at {
            next.published_at = published_at;
        }
        if let Some(expires_at) = update.expires_at {
            next.expires_at = Some(expires_at);
        }
        if let Some(is_active) = update.is_active {
            next.is_active = is_active;
        }
        invariants::validate_announcement(&next)?;
        *self = next;
        Ok(())
    }
}
