//! Branding settings storage (singleton row)

use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, OptionalExt};
use crate::error::Result;
use crate::models::{AppSettings, LocalizedText};

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<AppSettings> {
    Ok(AppSettings {
        app_name: row.get(0)?,
        title: LocalizedText {
            en: row.get(1)?,
            fi: row.get(2)?,
        },
        logo_url: row.get(3)?,
        primary_color: row.get(4)?,
        secondary_color: row.get(5)?,
        contact_email: row.get(6)?,
        updated_at: parse_datetime(&row.get::<_, String>(7)?)?,
    })
}

pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Stored settings, or the built-in defaults when none were saved yet
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<AppSettings> {
        let settings = self
            .conn
            .query_row(
                "SELECT app_name, title_en, title_fi, logo_url, primary_color, secondary_color,
                        contact_email, updated_at
                 FROM app_settings WHERE id = 1",
                [],
                settings_from_row,
            )
            .optional()?;
        Ok(settings.unwrap_or_default())
    }

    #[instrument(skip(self, settings))]
    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        self.conn.execute(
            "INSERT INTO app_settings (id, app_name, title_en, title_fi, logo_url, primary_color,
                                       secondary_color, contact_email, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                app_name = excluded.app_name,
                title_en = excluded.title_en,
                title_fi = excluded.title_fi,
                logo_url = excluded.logo_url,
                primary_color = excluded.primary_color,
                secondary_color = excluded.secondary_color,
                contact_email = excluded.contact_email,
                updated_at = excluded.updated_at",
            params![
                settings.app_name,
                settings.title.en,
                settings.title.fi,
                settings.logo_url,
                settings.primary_color,
                settings.secondary_color,
                settings.contact_email,
                settings.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{AppSettings, SettingsUpdate};
    use crate::storage::Database;

    #[test]
    fn test_defaults_until_saved() {
        let db = Database::open_in_memory().unwrap();
        let settings = db.settings().load().unwrap();
        assert_eq!(settings.app_name, AppSettings::default().app_name);
    }

    #[test]
    fn test_save_overwrites_single_row() {
        let db = Database::open_in_memory().unwrap();
        let mut settings = db.settings().load().unwrap();
        settings
            .apply(SettingsUpdate {
                app_name: Some("KSYK Opas".to_string()),
                primary_color: Some("#111827".to_string()),
                ..Default::default()
            })
            .unwrap();
        db.settings().save(&settings).unwrap();

        settings
            .apply(SettingsUpdate {
                contact_email: Some("info@ksyk.fi".to_string()),
                ..Default::default()
            })
            .unwrap();
        db.settings().save(&settings).unwrap();

        let loaded = db.settings().load().unwrap();
        assert_eq!(loaded.app_name, "KSYK Opas");
        assert_eq!(loaded.primary_color, "#111827");
        assert_eq!(loaded.contact_email.as_deref(), Some("info@ksyk.fi"));
    }
}
