//! App branding settings (singleton record)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LocalizedText;
use crate::error::Result;
use crate::invariants;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub app_name: String,
    pub title: LocalizedText,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub contact_email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: "KSYK Map".to_string(),
            title: LocalizedText::new("Campus Map", "Kampuskartta"),
            logo_url: None,
            primary_color: "#1E40AF".to_string(),
            secondary_color: "#F59E0B".to_string(),
            contact_email: None,
            updated_at: Utc::now(),
        }
    }
}

impl AppSettings {
    /// Apply a partial update, leaving `self` untouched on validation failure
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(app_name) = update.app_name {
            next.app_name = app_name;
        }
        if let Some(title) = update.title {
            next.title = title;
        }
        if let Some(logo_url) = update.logo_url {
            next.logo_url = Some(logo_url);
        }
        if let Some(primary_color) = update.primary_color {
            next.primary_color = primary_color;
        }
        if let Some(secondary_color) = update.secondary_color {
            next.secondary_color = secondary_color;
        }
        if let Some(contact_email) = update.contact_email {
            next.contact_email = Some(contact_email);
        }
        invariants::validate_settings(&next)?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub app_name: Option<String>,
    pub title: Option<LocalizedText>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub contact_email: Option<String>,
}
