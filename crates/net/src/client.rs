//! Typed HTTP client for the campus map API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use ksyk_core::models::{
    Announcement, AppSettings, Floor, Hallway, Room, SearchResults, SettingsUpdate, Shape,
    SyncStore,
};

use crate::error::{Error, Result};
use crate::offline::{FetchedResponse, Fetcher};
use crate::protocol::{
    self, AdminProfile, ApiResource, ChangePasswordRequest, CreateUserRequest, ErrorBody,
    HealthStatus, LoginRequest, ShapeDraftRequest, SESSION_COOKIE,
};
use crate::session::session_from_set_cookie;

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Client handle; clones share the session
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<RwLock<Option<Uuid>>>,
}

impl ApiClient {
    /// Create a client for a server such as `http://127.0.0.1:8080`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn session_id(&self) -> Option<Uuid> {
        *self.session.read().await
    }

    pub async fn set_session(&self, session_id: Option<Uuid>) {
        *self.session.write().await = session_id;
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match *self.session.read().await {
            Some(id) => builder.header(COOKIE, format!("{}={}", SESSION_COOKIE, id)),
            None => builder,
        }
    }

    /// Turn non-2xx responses into `Error::Status`
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    text
                }
            });
        Err(Error::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path).await.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.request(method, path).await.json(body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json(protocol::HEALTH_PATH).await
    }

    /// Sign in and keep the session cookie for later requests
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AdminProfile> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .request(Method::POST, protocol::LOGIN_PATH)
            .await
            .json(&request)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let session_id = session_from_set_cookie(response.headers())
            .ok_or_else(|| Error::Protocol("Login response carried no session cookie".into()))?;
        self.set_session(Some(session_id)).await;
        debug!(%session_id, "Stored admin session");
        Ok(response.json().await?)
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self
            .request(Method::POST, protocol::LOGOUT_PATH)
            .await
            .send()
            .await?;
        Self::check(response).await?;
        self.set_session(None).await;
        Ok(())
    }

    pub async fn me(&self) -> Result<AdminProfile> {
        self.get_json(protocol::ME_PATH).await
    }

    /// Change the signed-in account's password. The server ends every
    /// session of the account, so the client is signed out afterwards.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        let request = ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        let response = self
            .request(Method::PUT, protocol::PASSWORD_PATH)
            .await
            .json(&request)
            .send()
            .await?;
        Self::check(response).await?;
        self.set_session(None).await;
        Ok(())
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<AdminProfile> {
        self.send_json(Method::POST, protocol::USERS_PATH, request)
            .await
    }

    pub async fn list<T: ApiResource>(&self) -> Result<Vec<T>> {
        self.get_json(T::PATH).await
    }

    pub async fn get<T: ApiResource>(&self, id: Uuid) -> Result<T> {
        self.get_json(&T::item_path(id)).await
    }

    pub async fn create<T: ApiResource>(&self, input: &T::Create) -> Result<T> {
        self.send_json(Method::POST, T::PATH, input).await
    }

    pub async fn update<T: ApiResource>(&self, id: Uuid, changes: &T::Update) -> Result<T> {
        self.send_json(Method::PUT, &T::item_path(id), changes)
            .await
    }

    pub async fn delete<T: ApiResource>(&self, id: Uuid) -> Result<()> {
        let response = self
            .request(Method::DELETE, &T::item_path(id))
            .await
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn building_floors(&self, building_id: Uuid) -> Result<Vec<Floor>> {
        self.get_json(&format!("/api/buildings/{}/floors", building_id))
            .await
    }

    pub async fn building_rooms(&self, building_id: Uuid) -> Result<Vec<Room>> {
        self.get_json(&format!("/api/buildings/{}/rooms", building_id))
            .await
    }

    pub async fn building_hallways(&self, building_id: Uuid) -> Result<Vec<Hallway>> {
        self.get_json(&format!("/api/buildings/{}/hallways", building_id))
            .await
    }

    pub async fn active_announcements(&self) -> Result<Vec<Announcement>> {
        self.get_json(protocol::ACTIVE_ANNOUNCEMENTS_PATH).await
    }

    pub async fn settings(&self) -> Result<AppSettings> {
        self.get_json(protocol::SETTINGS_PATH).await
    }

    pub async fn update_settings(&self, changes: &SettingsUpdate) -> Result<AppSettings> {
        self.send_json(Method::PUT, protocol::SETTINGS_PATH, changes)
            .await
    }

    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let response = self
            .request(Method::GET, protocol::SEARCH_PATH)
            .await
            .query(&[("q", query)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn draft_shape(&self, request: &ShapeDraftRequest) -> Result<Shape> {
        self.send_json(Method::POST, protocol::SHAPE_DRAFT_PATH, request)
            .await
    }

    pub async fn send_analytics(
        &self,
        store: SyncStore,
        payload: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .request(Method::POST, &protocol::analytics_path(store))
            .await
            .json(payload)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Fetcher for ApiClient {
    async fn fetch(&self, url: &str) -> Result<FetchedResponse> {
        let response = self.request(Method::GET, url).await.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        Ok(FetchedResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<()> {
        let response = self.request(Method::POST, url).await.json(body).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
