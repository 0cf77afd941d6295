//! Wire types shared by the HTTP server and client

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ksyk_core::drawing::{DraftFinish, DraftStep};
use ksyk_core::models::{
    AdminRole, AdminUser, Announcement, Building, Event, Floor, Hallway, Resource, Room, Shape,
    ShapeMeta, Staff, SyncStore,
};

/// Cookie carrying the admin session ID
pub const SESSION_COOKIE: &str = "ksyk_session";

pub const API_PREFIX: &str = "/api";
pub const HEALTH_PATH: &str = "/healthz";
pub const SETTINGS_PATH: &str = "/api/settings";
pub const SEARCH_PATH: &str = "/api/search";
pub const ACTIVE_ANNOUNCEMENTS_PATH: &str = "/api/announcements/active";
pub const SHAPE_DRAFT_PATH: &str = "/api/shapes/draft";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const ME_PATH: &str = "/api/auth/me";
pub const PASSWORD_PATH: &str = "/api/auth/password";
pub const USERS_PATH: &str = "/api/users";

/// Where synced visitor events for `store` are posted
pub fn analytics_path(store: SyncStore) -> String {
    format!("{}/analytics/{}", API_PREFIX, store.as_str())
}

/// A record type served under its own collection path
pub trait ApiResource: Resource {
    /// Collection path, e.g. `/api/buildings`
    const PATH: &'static str;

    fn item_path(id: Uuid) -> String {
        format!("{}/{}", Self::PATH, id)
    }
}

impl ApiResource for Building {
    const PATH: &'static str = "/api/buildings";
}

impl ApiResource for Floor {
    const PATH: &'static str = "/api/floors";
}

impl ApiResource for Room {
    const PATH: &'static str = "/api/rooms";
}

impl ApiResource for Hallway {
    const PATH: &'static str = "/api/hallways";
}

impl ApiResource for Staff {
    const PATH: &'static str = "/api/staff";
}

impl ApiResource for Announcement {
    const PATH: &'static str = "/api/announcements";
}

impl ApiResource for Event {
    const PATH: &'static str = "/api/events";
}

impl ApiResource for Shape {
    const PATH: &'static str = "/api/shapes";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account details safe to show to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub role: AdminRole,
}

impl From<&AdminUser> for AdminProfile {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Password change for the signed-in account; every session ends on success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: AdminRole,
}

/// A recorded map-builder session to replay and save.
///
/// `grid_size` and `snap` fall back to the server's drawing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeDraftRequest {
    #[serde(default)]
    pub grid_size: Option<u32>,
    #[serde(default)]
    pub snap: Option<bool>,
    pub steps: Vec<DraftStep>,
    #[serde(default)]
    pub finish: DraftFinish,
    pub meta: ShapeMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub schema_version: u32,
}

/// Error payload: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let id = Uuid::nil();
        assert_eq!(
            Room::item_path(id),
            "/api/rooms/00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(analytics_path(SyncStore::Navigation), "/api/analytics/navigation");
    }

    #[test]
    fn test_draft_request_defaults() {
        let request: ShapeDraftRequest = serde_json::from_str(
            r#"{"steps":[{"op":"click","x":5.0,"y":5.0}],"meta":{"label":"Hall"}}"#,
        )
        .unwrap();
        assert_eq!(request.grid_size, None);
        assert_eq!(request.finish, DraftFinish::Open);
        assert_eq!(request.meta.color, "#6B7280");
    }
}
