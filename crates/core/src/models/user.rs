//! Admin user and session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Longest session a login may open (one year)
pub const MAX_SESSION_HOURS: i64 = 24 * 365;

/// Role of an administrator account, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum AdminRole {
    /// Edits map content
    Editor = 1,
    /// Edits content, branding and accounts
    Admin = 2,
}

/// An administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl AdminUser {
    pub fn new(username: String, password_hash: String, role: AdminRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

/// Active session for a logged-in administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Open a session lasting `duration_hours`, at most [`MAX_SESSION_HOURS`]
    pub fn new(user_id: Uuid, duration_hours: i64) -> Result<Self> {
        let out_of_range = || {
            Error::Validation(format!(
                "Session length must be between 1 and {} hours",
                MAX_SESSION_HOURS
            ))
        };
        if !(1..=MAX_SESSION_HOURS).contains(&duration_hours) {
            return Err(out_of_range());
        }
        let now = Utc::now();
        let expires_at = chrono::Duration::try_hours(duration_hours)
            .and_then(|duration| now.checked_add_signed(duration))
            .ok_or_else(out_of_range)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at,
        })
    }

    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_length_is_bounded() {
        let user_id = Uuid::new_v4();
        let session = Session::new(user_id, 8).unwrap();
        assert_eq!(session.expires_at - session.created_at, chrono::Duration::hours(8));
        assert!(session.is_valid());

        assert!(matches!(Session::new(user_id, 0), Err(Error::Validation(_))));
        assert!(matches!(
            Session::new(user_id, 9_000_000_000_000_000),
            Err(Error::Validation(_))
        ));
        assert!(Session::new(user_id, MAX_SESSION_HOURS).is_ok());
    }
}
