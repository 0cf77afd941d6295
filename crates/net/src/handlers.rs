//! Request handlers

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use ksyk_core::drawing::{self, ShapeEditor};
use ksyk_core::models::{
    Announcement, AppSettings, Floor, Hallway, Room, SearchResults, SettingsUpdate, Shape,
    SyncStore,
};
use ksyk_core::permissions::AdminAction;
use ksyk_core::{auth, Database, Error, Repository, Resource};

use crate::protocol::{
    AdminProfile, ApiResource, ChangePasswordRequest, CreateUserRequest, HealthStatus,
    LoginRequest, SearchParams, ShapeDraftRequest,
};
use crate::response::ApiError;
use crate::server::AppState;
use crate::session::{cleared_session_cookie, session_cookie, AdminSession};

type ApiResult<T> = std::result::Result<T, ApiError>;

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 100;

/// Which permission mutating a record of `kind` needs
fn action_for(kind: &str) -> AdminAction {
    match kind {
        "announcement" | "event" => AdminAction::PublishNotices,
        "shape" => AdminAction::DrawShapes,
        _ => AdminAction::EditContent,
    }
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthStatus>> {
    let schema_version = state.with_db(|db| Ok(db.schema_version()))?;
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        schema_version,
    }))
}

pub async fn list<T>(State(state): State<AppState>) -> ApiResult<Json<Vec<T>>>
where
    T: ApiResource,
    Database: Repository<T>,
{
    let records = state.with_db(|db| Repository::<T>::list(db))?;
    Ok(Json(records))
}

pub async fn fetch<T>(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<T>>
where
    T: ApiResource,
    Database: Repository<T>,
{
    let Path(id) = id?;
    let record = state
        .with_db(|db| Repository::<T>::find(db, id))?
        .ok_or_else(|| Error::not_found(T::KIND, id))?;
    Ok(Json(record))
}

pub async fn create<T>(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<T::Create>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<T>)>
where
    T: ApiResource,
    Database: Repository<T>,
{
    session.require(action_for(T::KIND))?;
    let Json(input) = payload?;
    let record = T::from_create(input)?;
    state.with_db(|db| Repository::<T>::insert(db, &record))?;
    info!(kind = T::KIND, id = %record.id(), by = %session.user.username, "Created record");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<T>(
    State(state): State<AppState>,
    session: AdminSession,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<T::Update>, JsonRejection>,
) -> ApiResult<Json<T>>
where
    T: ApiResource,
    Database: Repository<T>,
{
    session.require(action_for(T::KIND))?;
    let Path(id) = id?;
    let Json(changes) = payload?;
    let record = state.with_db(|db| {
        let mut record = Repository::<T>::find(db, id)?
            .ok_or_else(|| Error::not_found(T::KIND, id))?;
        record.apply(changes)?;
        Repository::<T>::update(db, &record)?;
        Ok(record)
    })?;
    info!(kind = T::KIND, %id, by = %session.user.username, "Updated record");
    Ok(Json(record))
}

pub async fn remove<T>(
    State(state): State<AppState>,
    session: AdminSession,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode>
where
    T: ApiResource,
    Database: Repository<T>,
{
    session.require(action_for(T::KIND))?;
    let Path(id) = id?;
    state.with_db(|db| Repository::<T>::delete(db, id))?;
    info!(kind = T::KIND, %id, by = %session.user.username, "Deleted record");
    Ok(StatusCode::NO_CONTENT)
}

/// Run `f` for an existing building, `NotFound` otherwise
fn for_building<T>(
    state: &AppState,
    building_id: Uuid,
    f: impl FnOnce(&Database) -> ksyk_core::Result<T>,
) -> ApiResult<T> {
    state.with_db(|db| {
        db.buildings()
            .find_by_id(building_id)?
            .ok_or_else(|| Error::not_found("building", building_id))?;
        f(db)
    })
}

pub async fn building_floors(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Floor>>> {
    let Path(id) = id?;
    let floors = for_building(&state, id, |db| db.floors().list_for_building(id))?;
    Ok(Json(floors))
}

pub async fn building_rooms(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Room>>> {
    let Path(id) = id?;
    let rooms = for_building(&state, id, |db| db.rooms().list_for_building(id))?;
    Ok(Json(rooms))
}

pub async fn building_hallways(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Hallway>>> {
    let Path(id) = id?;
    let hallways = for_building(&state, id, |db| db.hallways().list_for_building(id))?;
    Ok(Json(hallways))
}

pub async fn active_announcements(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Announcement>>> {
    let now = Utc::now();
    let announcements = state.with_db(|db| db.announcements().list_active(now))?;
    Ok(Json(announcements))
}

pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<AppSettings>> {
    let settings = state.with_db(|db| db.settings().load())?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> ApiResult<Json<AppSettings>> {
    session.require(AdminAction::EditSettings)?;
    let Json(changes) = payload?;
    let settings = state.with_db(|db| {
        let mut settings = db.settings().load()?;
        settings.apply(changes)?;
        db.settings().save(&settings)?;
        Ok(settings)
    })?;
    info!(by = %session.user.username, "Updated app settings");
    Ok(Json(settings))
}

#[instrument(skip(state, params))]
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<SearchResults>> {
    let Query(params) = params?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let results = state.with_db(|db| db.search(&params.q, limit))?;
    Ok(Json(results))
}

/// Replay a recorded map-builder session and save the resulting outline
pub async fn draft_shape(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<ShapeDraftRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Shape>)> {
    session.require(AdminAction::DrawShapes)?;
    let Json(request) = payload?;

    let defaults = &state.config().drawing;
    let mut editor = ShapeEditor::new(request.grid_size.unwrap_or(defaults.grid_size))?
        .with_snap(request.snap.unwrap_or(defaults.snap));
    let outline = drawing::replay(&mut editor, &request.steps, request.finish)?;

    let shape = Shape::from_outline(outline, request.meta);
    ksyk_core::invariants::validate_shape(&shape)?;
    state.with_db(|db| db.shapes().create(&shape))?;
    info!(
        id = %shape.id,
        points = shape.points.len(),
        closed = shape.closed,
        by = %session.user.username,
        "Saved drawn shape"
    );
    Ok((StatusCode::CREATED, Json(shape)))
}

/// Run argon2 work on the blocking pool, outside the database lock
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ksyk_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("Password task failed: {}", e)))?;
    Ok(result?)
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let hours = state.config().auth.session_hours;
    let account = state.with_db(|db| db.users().find_by_username(request.username.trim()))?;
    let user = blocking(move || auth::check_credentials(account, &request.password)).await?;
    let session = state.with_db(|db| auth::open_session(db, &user, hours))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie(session.id, hours));
    Ok((headers, Json(AdminProfile::from(&user))).into_response())
}

pub async fn logout(State(state): State<AppState>, session: AdminSession) -> ApiResult<Response> {
    state.with_db(|db| auth::logout(db, session.session_id))?;
    info!(user = %session.user.username, "Admin logged out");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cleared_session_cookie());
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

pub async fn me(session: AdminSession) -> Json<AdminProfile> {
    Json(AdminProfile::from(&session.user))
}

pub async fn change_password(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let user = session.user;
    let user_id = user.id;
    let hash = blocking(move || {
        auth::rehash_password(&user, &request.current_password, &request.new_password)
    })
    .await?;
    state.with_db(|db| db.in_transaction(|db| auth::replace_password(db, user_id, &hash)))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cleared_session_cookie());
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

pub async fn create_user(
    State(state): State<AppState>,
    session: AdminSession,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AdminProfile>)> {
    session.require(AdminAction::ManageAccounts)?;
    let Json(request) = payload?;
    let user = blocking(move || {
        auth::new_account(&request.username, &request.password, request.role)
    })
    .await?;
    state.with_db(|db| auth::store_account(db, &user))?;
    Ok((StatusCode::CREATED, Json(AdminProfile::from(&user))))
}

/// Accept one synced visitor event from an offline client
pub async fn record_analytics(
    State(state): State<AppState>,
    store: Result<Path<String>, PathRejection>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Path(store) = store?;
    let store = SyncStore::from_tag(&store)
        .ok_or_else(|| ApiError::not_found(format!("Unknown sync store {:?}", store)))?;
    let Json(payload) = payload?;
    state.with_db(|db| db.analytics().record(store, &payload))?;
    Ok(StatusCode::ACCEPTED)
}
