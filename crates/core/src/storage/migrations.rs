//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial campus schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS buildings (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name_en TEXT NOT NULL,
                name_fi TEXT NOT NULL,
                description_en TEXT,
                description_fi TEXT,
                floors INTEGER NOT NULL DEFAULT 1,
                color TEXT NOT NULL,
                map_x REAL NOT NULL DEFAULT 0,
                map_y REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS floors (
                id TEXT PRIMARY KEY,
                building_id TEXT NOT NULL,
                floor_number INTEGER NOT NULL,
                name_en TEXT,
                name_fi TEXT,
                FOREIGN KEY (building_id) REFERENCES buildings(id) ON DELETE CASCADE,
                UNIQUE(building_id, floor_number)
            );

            CREATE TABLE IF NOT EXISTS rooms (
                id TEXT PRIMARY KEY,
                building_id TEXT NOT NULL,
                floor INTEGER NOT NULL,
                room_number TEXT NOT NULL,
                name_en TEXT,
                name_fi TEXT,
                room_type TEXT NOT NULL,
                capacity INTEGER,
                map_x REAL NOT NULL DEFAULT 0,
                map_y REAL NOT NULL DEFAULT 0,
                width REAL NOT NULL,
                height REAL NOT NULL,
                equipment_json TEXT NOT NULL DEFAULT '[]',
                wheelchair INTEGER NOT NULL DEFAULT 0,
                hearing_loop INTEGER NOT NULL DEFAULT 0,
                elevator_access INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (building_id) REFERENCES buildings(id) ON DELETE CASCADE,
                UNIQUE(building_id, room_number)
            );

            CREATE TABLE IF NOT EXISTS hallways (
                id TEXT PRIMARY KEY,
                building_id TEXT NOT NULL,
                floor_id TEXT NOT NULL,
                name TEXT,
                start_x REAL NOT NULL,
                start_y REAL NOT NULL,
                end_x REAL NOT NULL,
                end_y REAL NOT NULL,
                width REAL NOT NULL,
                emergency_route INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (building_id) REFERENCES buildings(id) ON DELETE CASCADE,
                FOREIGN KEY (floor_id) REFERENCES floors(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS staff (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                position TEXT NOT NULL,
                department TEXT NOT NULL,
                office_room_id TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (office_room_id) REFERENCES rooms(id) ON DELETE SET NULL
            );

            CREATE TABLE IF NOT EXISTS announcements (
                id TEXT PRIMARY KEY,
                title_en TEXT NOT NULL,
                title_fi TEXT NOT NULL,
                content_en TEXT NOT NULL,
                content_fi TEXT NOT NULL,
                priority INTEGER NOT NULL,
                published_at TEXT NOT NULL,
                expires_at TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title_en TEXT NOT NULL,
                title_fi TEXT NOT NULL,
                description TEXT,
                room_id TEXT,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL,
                FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE SET NULL
            );

            -- Branding singleton, pinned to id 1
            CREATE TABLE IF NOT EXISTS app_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                app_name TEXT NOT NULL,
                title_en TEXT NOT NULL,
                title_fi TEXT NOT NULL,
                logo_url TEXT,
                primary_color TEXT NOT NULL,
                secondary_color TEXT NOT NULL,
                contact_email TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shapes (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                label TEXT NOT NULL,
                color TEXT NOT NULL,
                points_json TEXT NOT NULL,
                closed INTEGER NOT NULL DEFAULT 0,
                building_id TEXT,
                floor INTEGER,
                created_at TEXT NOT NULL,
                FOREIGN KEY (building_id) REFERENCES buildings(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for per-building lookups",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_floors_building ON floors(building_id);
            CREATE INDEX IF NOT EXISTS idx_rooms_building ON rooms(building_id, floor);
            CREATE INDEX IF NOT EXISTS idx_hallways_building ON hallways(building_id);
            CREATE INDEX IF NOT EXISTS idx_hallways_floor ON hallways(floor_id);
            CREATE INDEX IF NOT EXISTS idx_staff_office ON staff(office_room_id);
            CREATE INDEX IF NOT EXISTS idx_announcements_published ON announcements(published_at);
            CREATE INDEX IF NOT EXISTS idx_events_starts ON events(starts_at);
            CREATE INDEX IF NOT EXISTS idx_shapes_building ON shapes(building_id);
        "#,
    },
    Migration {
        version: 3,
        description: "Add admin accounts and sessions",
        sql: r#"
            CREATE TABLE IF NOT EXISTS admin_users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                last_login TEXT
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES admin_users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 4,
        description: "Add offline response cache, sync queues and analytics",
        sql: r#"
            -- Responses kept for offline use, one row per cache and URL
            CREATE TABLE IF NOT EXISTS offline_responses (
                cache_name TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                content_type TEXT,
                body BLOB NOT NULL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY (cache_name, url)
            );

            -- Events waiting for connectivity
            CREATE TABLE IF NOT EXISTS offline_queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                store TEXT NOT NULL CHECK (store IN ('searches', 'navigation')),
                payload_json TEXT NOT NULL,
                queued_at TEXT NOT NULL
            );

            -- Events received by the server from syncing clients
            CREATE TABLE IF NOT EXISTS analytics_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                store TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                received_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_offline_queue_store ON offline_queue(store);
            CREATE INDEX IF NOT EXISTS idx_analytics_store ON analytics_events(store);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)?;
            record_migration(&tx, migration)?;
            tx.commit()?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Get the latest migration version (test helper)
    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run twice
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_settings_table_is_singleton() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let insert = "INSERT INTO app_settings
                          (id, app_name, title_en, title_fi, primary_color,
                           secondary_color, updated_at)
                      VALUES (?1, 'KSYK', 'Map', 'Kartta', '#000', '#fff', '2024-01-01T00:00:00Z')";
        conn.execute(insert, [1]).unwrap();
        assert!(conn.execute(insert, [2]).is_err());
    }

    #[test]
    fn test_offline_queue_rejects_unknown_store() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO offline_queue (store, payload_json, queued_at)
             VALUES ('clicks', '{}', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_migrations_sequential() {
        // Verify migrations are numbered sequentially
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }
}
