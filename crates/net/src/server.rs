//! HTTP server for the campus map API
//!
//! Reads are public. Mutations need an admin session; branding and
//! account management need the admin role.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, Instrument};

use ksyk_core::models::{Announcement, Building, Event, Floor, Hallway, Room, Shape, Staff};
use ksyk_core::{AppConfig, Database, Repository};

use crate::error::Result;
use crate::handlers;
use crate::protocol::{self, ApiResource};
use crate::response::ApiError;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run `f` with the database locked. The lock is released before
    /// returning, so callers never hold it across an await.
    pub fn with_db<T>(
        &self,
        f: impl FnOnce(&Database) -> ksyk_core::Result<T>,
    ) -> std::result::Result<T, ApiError> {
        let db = self
            .db
            .lock()
            .map_err(|_| ApiError::internal("Database lock poisoned"))?;
        Ok(f(&db)?)
    }
}

/// Add the five CRUD routes for `T` under its collection path
fn with_resource<T>(router: Router<AppState>) -> Router<AppState>
where
    T: ApiResource,
    Database: Repository<T>,
{
    router
        .route(
            T::PATH,
            get(handlers::list::<T>).post(handlers::create::<T>),
        )
        .route(
            &format!("{}/:id", T::PATH),
            get(handlers::fetch::<T>)
                .put(handlers::update::<T>)
                .delete(handlers::remove::<T>),
        )
}

async fn trace_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = tracing::info_span!("http.request", method = %method, path = %path);

    let started = Instant::now();
    let response = next.run(request).instrument(span).await;
    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

/// Build the full API router
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(protocol::HEALTH_PATH, get(handlers::health))
        .route(
            protocol::SETTINGS_PATH,
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route(protocol::SEARCH_PATH, get(handlers::search))
        .route(
            protocol::ACTIVE_ANNOUNCEMENTS_PATH,
            get(handlers::active_announcements),
        )
        .route(protocol::SHAPE_DRAFT_PATH, post(handlers::draft_shape))
        .route("/api/buildings/:id/floors", get(handlers::building_floors))
        .route("/api/buildings/:id/rooms", get(handlers::building_rooms))
        .route("/api/buildings/:id/hallways", get(handlers::building_hallways))
        .route(protocol::LOGIN_PATH, post(handlers::login))
        .route(protocol::LOGOUT_PATH, post(handlers::logout))
        .route(protocol::ME_PATH, get(handlers::me))
        .route(protocol::PASSWORD_PATH, put(handlers::change_password))
        .route(protocol::USERS_PATH, post(handlers::create_user))
        .route("/api/analytics/:store", post(handlers::record_analytics));

    router = with_resource::<Building>(router);
    router = with_resource::<Floor>(router);
    router = with_resource::<Room>(router);
    router = with_resource::<Hallway>(router);
    router = with_resource::<Staff>(router);
    router = with_resource::<Announcement>(router);
    router = with_resource::<Event>(router);
    router = with_resource::<Shape>(router);

    router
        .layer(middleware::from_fn(trace_requests))
        .with_state(state)
}

/// Bind a listener for `addr` (e.g. `127.0.0.1:8080`)
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| crate::Error::Protocol(format!("Invalid bind address {}: {}", addr, e)))?;
    Ok(TcpListener::bind(addr).await?)
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    info!(addr = %listener.local_addr()?, "Campus map API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}
