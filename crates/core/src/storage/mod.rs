//! SQLite storage layer for the campus map

mod analytics;
mod announcements;
mod buildings;
mod events;
mod floors;
mod hallways;
mod migrations;
mod offline;
mod parse;
mod rooms;
mod settings;
mod shapes;
mod staff;
mod traits;
mod users;

use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AdminUser, Announcement, Building, Event, Floor, Hallway, Room, SearchResults, Session, Shape,
    Staff,
};

pub use analytics::AnalyticsStore;
pub use announcements::AnnouncementStore;
pub use buildings::BuildingStore;
pub use events::EventStore;
pub use floors::FloorStore;
pub use hallways::HallwayStore;
pub use offline::OfflineStore;
pub use rooms::RoomStore;
pub use settings::SettingsStore;
pub use shapes::ShapeStore;
pub use staff::StaffStore;
pub use traits::{AccountRepository, CampusStorage, Repository};
pub use users::UserStore;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Run `f` inside a transaction, committing only when it succeeds
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn buildings(&self) -> BuildingStore<'_> {
        BuildingStore::new(&self.conn)
    }

    pub fn floors(&self) -> FloorStore<'_> {
        FloorStore::new(&self.conn)
    }

    pub fn rooms(&self) -> RoomStore<'_> {
        RoomStore::new(&self.conn)
    }

    pub fn hallways(&self) -> HallwayStore<'_> {
        HallwayStore::new(&self.conn)
    }

    pub fn staff(&self) -> StaffStore<'_> {
        StaffStore::new(&self.conn)
    }

    pub fn announcements(&self) -> AnnouncementStore<'_> {
        AnnouncementStore::new(&self.conn)
    }

    pub fn events(&self) -> EventStore<'_> {
        EventStore::new(&self.conn)
    }

    pub fn shapes(&self) -> ShapeStore<'_> {
        ShapeStore::new(&self.conn)
    }

    /// Get the branding settings store
    pub fn settings(&self) -> SettingsStore<'_> {
        SettingsStore::new(&self.conn)
    }

    /// Get the admin account store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get the offline cache and sync queue store
    pub fn offline(&self) -> OfflineStore<'_> {
        OfflineStore::new(&self.conn)
    }

    /// Get the analytics sink for synced visitor events
    pub fn analytics(&self) -> AnalyticsStore<'_> {
        AnalyticsStore::new(&self.conn)
    }

    /// Visitor directory search over buildings, rooms and active staff.
    ///
    /// A blank query matches nothing.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str, limit: u32) -> Result<SearchResults> {
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(SearchResults::default());
        }
        Ok(SearchResults {
            buildings: self.buildings().search(needle, limit)?,
            rooms: self.rooms().search(needle, limit)?,
            staff: self.staff().search(needle, limit)?,
        })
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

macro_rules! impl_repository {
    ($model:ty, $store:ident) => {
        impl Repository<$model> for Database {
            fn list(&self) -> Result<Vec<$model>> {
                self.$store().list()
            }

            fn find(&self, id: Uuid) -> Result<Option<$model>> {
                self.$store().find_by_id(id)
            }

            fn insert(&self, record: &$model) -> Result<()> {
                self.$store().create(record)
            }

            fn update(&self, record: &$model) -> Result<()> {
                self.$store().update(record)
            }

            fn delete(&self, id: Uuid) -> Result<()> {
                self.$store().delete(id)
            }
        }
    };
}

impl_repository!(Building, buildings);
impl_repository!(Floor, floors);
impl_repository!(Room, rooms);
impl_repository!(Hallway, hallways);
impl_repository!(Staff, staff);
impl_repository!(Announcement, announcements);
impl_repository!(Event, events);
impl_repository!(Shape, shapes);

impl AccountRepository for Database {
    fn create_user(&self, user: &AdminUser) -> Result<()> {
        self.users().create(user)
    }

    fn find_user_by_id(&self, id: Uuid) -> Result<Option<AdminUser>> {
        self.users().find_by_id(id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        self.users().find_by_username(username)
    }

    fn count_users(&self) -> Result<u64> {
        self.users().count()
    }

    fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        self.users().update_password(user_id, password_hash)
    }

    fn update_last_login(&self, user_id: Uuid) -> Result<()> {
        self.users().update_last_login(user_id)
    }

    fn create_session(&self, session: &Session) -> Result<()> {
        self.users().create_session(session)
    }

    fn find_valid_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        self.users().find_valid_session(session_id)
    }

    fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.users().delete_session(session_id)
    }

    fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        self.users().delete_user_sessions(user_id)
    }

    fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.users().cleanup_expired_sessions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocalizedText, RoomType};

    fn assert_campus_storage<S: CampusStorage>(_: &S) {}

    #[test]
    fn test_database_is_campus_storage() {
        let db = Database::open_in_memory().unwrap();
        assert_campus_storage(&db);
        assert!(db.schema_version() >= 4);
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ksyk.db");
        {
            let db = Database::open(&path).unwrap();
            let building = Building::new("B".to_string(), LocalizedText::new("Gym", "Sali"));
            Repository::insert(&db, &building).unwrap();
        }
        let db = Database::open(&path).unwrap();
        let buildings: Vec<Building> = Repository::list(&db).unwrap();
        assert_eq!(buildings.len(), 1);
    }

    #[test]
    fn test_search_spans_directory() {
        let db = Database::open_in_memory().unwrap();
        let building = Building::new("L".to_string(), LocalizedText::new("Library", "Kirjasto"));
        db.buildings().create(&building).unwrap();
        let mut room = Room::new(building.id, 1, "L12".to_string(), RoomType::Library);
        room.name = Some(LocalizedText::new("Reading room", "Lukusali"));
        db.rooms().create(&room).unwrap();
        let staff = Staff::new(
            "Kirsi Lahti".to_string(),
            "Librarian".to_string(),
            "Library".to_string(),
        );
        db.staff().create(&staff).unwrap();

        let results = db.search("  kirja ", 10).unwrap();
        assert_eq!(results.buildings.len(), 1);
        assert!(results.rooms.is_empty());
        assert!(results.staff.is_empty());

        let results = db.search("libr", 10).unwrap();
        assert_eq!(results.buildings.len(), 1);
        assert_eq!(results.staff.len(), 1);

        assert!(db.search("   ", 10).unwrap().is_empty());
    }
}
