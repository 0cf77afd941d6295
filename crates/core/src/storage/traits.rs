//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock).

use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AdminUser, Announcement, Building, Event, Floor, Hallway, Resource, Room, Session, Shape,
    Staff,
};

/// CRUD operations for one campus record type
pub trait Repository<T: Resource> {
    /// List every record in the table's natural order
    fn list(&self) -> Result<Vec<T>>;

    fn find(&self, id: Uuid) -> Result<Option<T>>;

    fn insert(&self, record: &T) -> Result<()>;

    /// Overwrite a stored record; `NotFound` when it does not exist
    fn update(&self, record: &T) -> Result<()>;

    /// Delete by ID; `NotFound` when it does not exist
    fn delete(&self, id: Uuid) -> Result<()>;
}

/// Admin account repository operations
pub trait AccountRepository {
    /// Create a new account
    fn create_user(&self, user: &AdminUser) -> Result<()>;

    /// Find account by ID
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<AdminUser>>;

    /// Find account by username
    fn find_user_by_username(&self, username: &str) -> Result<Option<AdminUser>>;

    /// Number of accounts
    fn count_users(&self) -> Result<u64>;

    /// Replace an account's password hash
    fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()>;

    /// Update account's last login time
    fn update_last_login(&self, user_id: Uuid) -> Result<()>;

    /// Create a session
    fn create_session(&self, session: &Session) -> Result<()>;

    /// Find a valid (non-expired) session
    fn find_valid_session(&self, session_id: Uuid) -> Result<Option<Session>>;

    /// Delete a session
    fn delete_session(&self, session_id: Uuid) -> Result<()>;

    /// Delete all sessions for an account
    fn delete_user_sessions(&self, user_id: Uuid) -> Result<()>;

    /// Clean up expired sessions
    fn cleanup_expired_sessions(&self) -> Result<u64>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
pub trait CampusStorage:
    Repository<Building>
    + Repository<Floor>
    + Repository<Room>
    + Repository<Hallway>
    + Repository<Staff>
    + Repository<Announcement>
    + Repository<Event>
    + Repository<Shape>
    + AccountRepository
{
}

// Blanket implementation: any type implementing all traits implements CampusStorage
impl<T> CampusStorage for T where
    T: Repository<Building>
        + Repository<Floor>
        + Repository<Room>
        + Repository<Hallway>
        + Repository<Staff>
        + Repository<Announcement>
        + Repository<Event>
        + Repository<Shape>
        + AccountRepository
{
}
