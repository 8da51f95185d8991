use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::CurrentUser,
    clients::{
        dto::{ClientRequest, ClientResponse, Pagination},
        repo::{self, ClientChanges},
    },
    error::ApiError,
    state::AppState,
};

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

fn validated(payload: Result<Json<ClientRequest>, JsonRejection>) -> Result<ClientChanges, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "client request body rejected");
        ApiError::malformed()
    })?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        warn!("client name is empty");
        return Err(ApiError::malformed());
    }
    Ok(ClientChanges {
        name,
        email: payload.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
        phone: payload.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
    })
}

#[instrument(skip(state, user))]
pub async fn list_clients(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<ClientResponse>>, ApiError> {
    let (limit, offset) = p.clamped();
    let clients = repo::list_by_user(&state.db, user.id, limit, offset).await?;
    Ok(Json(clients.into_iter().map(ClientResponse::from).collect()))
}

#[instrument(skip(state, user))]
pub async fn get_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ClientResponse>, ApiError> {
    let client = repo::get(&state.db, user.id, id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(ClientResponse::from(client)))
}

#[instrument(skip(state, user, payload))]
pub async fn create_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientResponse>), ApiError> {
    let changes = validated(payload)?;
    let client = repo::insert(&state.db, user.id, changes).await?;
    info!(user_id = %user.id, client_id = %client.id, "client created");
    Ok((StatusCode::CREATED, Json(ClientResponse::from(client))))
}

#[instrument(skip(state, user, payload))]
pub async fn update_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    payload: Result<Json<ClientRequest>, JsonRejection>,
) -> Result<Json<ClientResponse>, ApiError> {
    let changes = validated(payload)?;
    let client = repo::update(&state.db, user.id, id, changes)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(ClientResponse::from(client)))
}

#[instrument(skip(state, user))]
pub async fn delete_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete(&state.db, user.id, id).await? {
        return Err(ApiError::not_found());
    }
    info!(user_id = %user.id, client_id = %id, "client deleted");
    Ok(StatusCode::NO_CONTENT)
}
