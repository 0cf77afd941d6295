//! Admin session extraction from the `ksyk_session` cookie

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use uuid::Uuid;

use ksyk_core::models::AdminUser;
use ksyk_core::permissions::{AdminAction, PermissionMatrix};
use ksyk_core::{auth, Error};

use crate::protocol::SESSION_COOKIE;
use crate::response::ApiError;
use crate::server::AppState;

/// Read the session ID out of a `Cookie` header
pub fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Read the session ID out of a `Set-Cookie` header
pub fn session_from_set_cookie(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value opening a session for `hours`
pub fn session_cookie(session_id: Uuid, hours: i64) -> HeaderValue {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        hours.saturating_mul(3600)
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value clearing the session
pub fn cleared_session_cookie() -> HeaderValue {
    HeaderValue::from_static("ksyk_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// A logged-in administrator
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session_id: Uuid,
    pub user: AdminUser,
}

impl AdminSession {
    pub fn require(&self, action: AdminAction) -> Result<(), ApiError> {
        PermissionMatrix::require(self.user.role, action)?;
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = session_from_headers(&parts.headers)
            .ok_or_else(|| Error::Authentication("Sign in required".into()))?;
        let user = state.with_db(|db| auth::authenticate(db, session_id))?;
        Ok(AdminSession { session_id, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );
        assert_eq!(session_from_headers(&headers), Some(id));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("ksyk_session=garbage"));
        assert_eq!(session_from_headers(&headers), None);
    }

    #[test]
    fn test_set_cookie_roundtrip() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, session_cookie(id, 2));
        assert_eq!(session_from_set_cookie(&headers), Some(id));
        assert!(session_cookie(id, 2).to_str().unwrap().contains("Max-Age=7200"));
    }
}
