use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use time::Duration;
use tracing::{instrument, warn};

use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    state::AppState,
    users::{
        dto::{CodeRequest, ConfirmRequest, RegisterRequest, UpdateUserRequest, UserSummary},
        services::{self, is_valid_email},
    },
};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/verification", post(request_verification))
        .route("/users/confirmation", post(confirm_account))
        .route("/users/me", get(get_me))
        .route("/users", put(update_user).delete(delete_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let Json(mut payload) = payload.map_err(|e| {
        warn!(error = %e, "register request body rejected");
        ApiError::malformed()
    })?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::malformed());
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::malformed());
    }
    let username = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let user = services::register(
        state.users.as_ref(),
        &payload.email,
        username,
        &payload.password,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(UserSummary::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn request_verification(
    State(state): State<AppState>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "verification request body rejected");
        ApiError::malformed()
    })?;
    let email = payload.email.trim().to_lowercase();
    let window = Duration::minutes(state.config.auth.verification_ttl_minutes);
    services::request_code(
        state.users.as_ref(),
        state.codes.as_ref(),
        state.mailer.as_ref(),
        &email,
        window,
    )
    .await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, payload))]
pub async fn confirm_account(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<Json<UserSummary>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "confirmation request body rejected");
        ApiError::malformed()
    })?;
    let user = services::consume_code(state.codes.as_ref(), payload.token.trim()).await?;
    Ok(Json(UserSummary::from(user)))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserSummary> {
    Json(UserSummary::from(user))
}

#[instrument(skip(state, user, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserSummary>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "profile update body rejected");
        ApiError::malformed()
    })?;
    let email = match payload.email {
        Some(raw) => {
            let email = raw.trim().to_lowercase();
            if !is_valid_email(&email) {
                warn!(email = %email, "invalid email");
                return Err(ApiError::malformed());
            }
            Some(email)
        }
        None => None,
    };
    if let Some(password) = &payload.password {
        if password.len() < 8 {
            warn!("password too short");
            return Err(ApiError::malformed());
        }
    }
    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let updated =
        services::update_profile(state.users.as_ref(), &user, email, username, payload.password)
            .await?;
    Ok(Json(UserSummary::from(updated)))
}

#[instrument(skip(state, user))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    services::delete_account(state.users.as_ref(), &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
