//! Server configuration loaded from `ksyk.toml`
//!
//! Every section is optional and falls back to its defaults. A handful of
//! `KSYK_*` environment variables override the file so deployments can keep
//! secrets out of it.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::drawing;
use crate::error::{Error, Result};
use crate::models::MAX_SESSION_HOURS;

pub const CONFIG_FILE_NAME: &str = "ksyk.toml";
pub const DATABASE_FILE_NAME: &str = "ksyk.db";

pub const ENV_BIND: &str = "KSYK_BIND";
pub const ENV_DATABASE: &str = "KSYK_DATABASE";
pub const ENV_ADMIN_PASSWORD: &str = "KSYK_ADMIN_PASSWORD";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub drawing: DrawingConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; the platform data directory when unset
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_hours: i64,
    /// Account created on first start when no account exists
    pub admin_username: String,
    /// Password for the bootstrap account; generated when unset
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_hours: 24 * 7,
            admin_username: "admin".to_string(),
            admin_password: None,
        }
    }
}

/// Defaults handed to the polygon editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    pub grid_size: u32,
    pub snap: bool,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            grid_size: drawing::DEFAULT_GRID_SIZE,
            snap: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Populate an empty database with the sample campus
    pub sample_data: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { sample_data: true }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the platform config
    /// directory is tried and a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Reading config file");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Apply `KSYK_*` overrides looked up through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.storage.database = Some(PathBuf::from(database));
        }
        if let Some(password) = lookup(ENV_ADMIN_PASSWORD) {
            self.auth.admin_password = Some(password);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(Error::Config("server.bind must not be empty".into()));
        }
        if !(1..=MAX_SESSION_HOURS).contains(&self.auth.session_hours) {
            return Err(Error::Config(format!(
                "auth.session_hours must be between 1 and {}",
                MAX_SESSION_HOURS
            )));
        }
        if self.auth.admin_username.trim().is_empty() {
            return Err(Error::Config("auth.admin_username must not be empty".into()));
        }
        drawing::validate_grid_size(self.drawing.grid_size)
            .map_err(|e| Error::Config(format!("drawing.grid_size: {}", e)))
    }

    /// `ksyk.toml` in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Configured database file, or `ksyk.db` in the platform data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.database {
            return Ok(path.clone());
        }
        let dirs = project_dirs().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })?;
        Ok(dirs.data_dir().join(DATABASE_FILE_NAME))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("fi", "ksyk", "ksyk-map")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.drawing.grid_size, 20);
        assert!(config.seed.sample_data);
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            bind = "0.0.0.0:3000"

            [drawing]
            grid_size = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.drawing.grid_size, 40);
        assert!(config.drawing.snap);
        assert_eq!(config.auth.admin_username, "admin");
    }

    #[test]
    fn test_grid_size_out_of_range() {
        let err = AppConfig::from_toml("[drawing]\ngrid_size = 5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_session_hours_bounds() {
        for hours in ["0", "-1", "9000000000000000"] {
            let err = AppConfig::from_toml(&format!("[auth]\nsession_hours = {}\n", hours))
                .unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{} hours accepted", hours);
        }
        let config = AppConfig::from_toml("[auth]\nsession_hours = 8760\n").unwrap();
        assert_eq!(config.auth.session_hours, MAX_SESSION_HOURS);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            ENV_BIND => Some("0.0.0.0:9000".to_string()),
            ENV_ADMIN_PASSWORD => Some("hunter22".to_string()),
            _ => None,
        });
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.auth.admin_password.as_deref(), Some("hunter22"));
        assert_eq!(config.storage.database, None);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[seed]\nsample_data = false\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert!(!config.seed.sample_data);
    }
}
