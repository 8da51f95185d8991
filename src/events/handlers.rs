use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::CurrentUser,
    clients,
    error::ApiError,
    events::{
        dto::{EventRequest, EventResponse, Pagination},
        repo::{self, EventChanges},
    },
    state::AppState,
};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

/// Field checks plus the ownership check on `client_id`: linking an event to
/// another user's client reads the same as linking to a nonexistent one.
async fn validated(
    state: &AppState,
    user_id: i64,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<EventChanges, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "event request body rejected");
        ApiError::malformed()
    })?;
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        warn!("event title is empty");
        return Err(ApiError::malformed());
    }
    if let Some(client_id) = payload.client_id {
        if clients::repo::get(&state.db, user_id, client_id).await?.is_none() {
            warn!(user_id = %user_id, client_id = %client_id, "event references unknown client");
            return Err(ApiError::not_found());
        }
    }
    Ok(EventChanges {
        client_id: payload.client_id,
        title,
        description: payload.description.filter(|d| !d.trim().is_empty()),
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
    })
}

#[instrument(skip(state, user))]
pub async fn list_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let (limit, offset) = p.clamped();
    let events = repo::list_by_user(&state.db, user.id, limit, offset).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

#[instrument(skip(state, user))]
pub async fn get_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = repo::get(&state.db, user.id, id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(EventResponse::from(event)))
}

#[instrument(skip(state, user, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let changes = validated(&state, user.id, payload).await?;
    let event = repo::insert(&state.db, user.id, changes).await?;
    info!(user_id = %user.id, event_id = %event.id, "event created");
    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

#[instrument(skip(state, user, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    let changes = validated(&state, user.id, payload).await?;
    let event = repo::update(&state.db, user.id, id, changes)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(EventResponse::from(event)))
}

#[instrument(skip(state, user))]
pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete(&state.db, user.id, id).await? {
        return Err(ApiError::not_found());
    }
    info!(user_id = %user.id, event_id = %id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
