//! Startup state: the campus database, ready to serve

use ksyk_core::{auth, seed, AccountRepository, AppConfig, Database, Result};
use tracing::{info, warn};

/// Open the configured database, creating its directory on first run
pub fn open_database(config: &AppConfig) -> Result<Database> {
    let db_path = config.database_path()?;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(&db_path)?;
    info!(
        path = %db_path.display(),
        schema_version = db.schema_version(),
        "Opened campus database"
    );
    Ok(db)
}

/// Create the first admin account and seed sample content when asked to
pub fn prepare(db: &Database, config: &AppConfig) -> Result<()> {
    let username = &config.auth.admin_username;
    if let Some(password) =
        auth::bootstrap_admin(db, username, config.auth.admin_password.as_deref())?
    {
        warn!(
            username = %username,
            password = %password,
            "Created admin account with a generated password, change it after signing in"
        );
    }

    let removed = db.cleanup_expired_sessions()?;
    if removed > 0 {
        info!(removed, "Removed expired admin sessions");
    }

    if config.seed.sample_data && seed::seed_sample_campus(db)? {
        info!("Seeded sample campus");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksyk_core::Repository;
    use ksyk_core::models::Building;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.database = Some(dir.join("data").join("ksyk.db"));
        config.auth.admin_password = Some("first-admin".to_string());
        config
    }

    #[test]
    fn test_open_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        open_database(&config).unwrap();
        assert!(dir.path().join("data").join("ksyk.db").exists());
    }

    #[test]
    fn test_prepare_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let db = open_database(&config).unwrap();

        prepare(&db, &config).unwrap();
        prepare(&db, &config).unwrap();

        assert_eq!(db.count_users().unwrap(), 1);
        let (user, _) = auth::login(&db, "admin", "first-admin", 1).unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(Repository::<Building>::list(&db).unwrap().len(), 4);
    }

    #[test]
    fn test_prepare_without_sample_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.seed.sample_data = false;
        let db = open_database(&config).unwrap();

        prepare(&db, &config).unwrap();
        assert!(Repository::<Building>::list(&db).unwrap().is_empty());
    }
}
