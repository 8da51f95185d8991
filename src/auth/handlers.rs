use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{header, HeaderMap, HeaderValue},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, SessionUser},
        services,
        token::{JwtKeys, BEARER_PREFIX},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/users/login", post(login))
}

/// Exchanges credentials for a signed token. The token rides back in the
/// `Authorization` response header; the body is the identity summary.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<SessionUser>), ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "login request body rejected");
        ApiError::login_malformed()
    })?;

    let user = services::authenticate(state.users.as_ref(), &payload.principal, &payload.password)
        .await
        .map_err(ApiError::login_failure)?;

    let token = JwtKeys::from_ref(&state)
        .issue(&user.email)
        .map_err(|e| ApiError::login_failure(e.into()))?;

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("{BEARER_PREFIX}{token}"))
        .map_err(|e| ApiError::login_failure(anyhow::Error::from(e).into()))?;
    headers.insert(header::AUTHORIZATION, value);

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((headers, Json(SessionUser::from(user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::users::repo::memory::MemoryStore;
    use crate::users::repo::UserStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn seeded_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let hash = hash_password("longenough1").expect("hash password");
        let user = store
            .insert("ada@example.com", Some("ada"), &hash)
            .await
            .expect("insert user");
        store.set_enabled(user.id, true).await.expect("enable user");
        AppState::fake_with_store(store)
    }

    fn app(state: AppState) -> Router {
        Router::new().merge(auth_routes()).with_state(state)
    }

    fn login_request(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/users/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    #[tokio::test]
    async fn login_returns_bearer_header_and_identity_summary() {
        let state = seeded_state().await;
        let keys = JwtKeys::from_ref(&state);
        let res = app(state)
            .oneshot(login_request(&serde_json::json!({
                "principal": "ada@example.com",
                "password": "longenough1",
            })))
            .await
            .expect("run request");

        assert_eq!(res.status(), StatusCode::OK);
        let value = res
            .headers()
            .get(header::AUTHORIZATION)
            .expect("authorization header is set")
            .to_str()
            .expect("ascii header")
            .to_string();
        assert!(value.starts_with(BEARER_PREFIX));
        let subject = keys.verify(&value).expect("issued token verifies");
        assert_eq!(subject, "ada@example.com");

        let bytes = res.into_body().collect().await.expect("read body").to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(
            body,
            serde_json::json!({ "email": "ada@example.com", "username": "ada" })
        );
    }

    #[tokio::test]
    async fn failed_login_carries_no_token_and_lists_codes() {
        let state = seeded_state().await;
        let res = app(state)
            .oneshot(login_request(&serde_json::json!({
                "principal": "ada@example.com",
                "password": "wrong",
            })))
            .await
            .expect("run request");

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(header::AUTHORIZATION).is_none());
        let bytes = res.into_body().collect().await.expect("read body").to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(
            body,
            serde_json::json!({ "errors": ["INVALID_LOGIN", "BAD_CREDENTIALS"] })
        );
    }

    #[tokio::test]
    async fn unparseable_login_body_is_malformed() {
        let state = seeded_state().await;
        let req = Request::builder()
            .method("POST")
            .uri("/users/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{"))
            .expect("build request");
        let res = app(state).oneshot(req).await.expect("run request");

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = res.into_body().collect().await.expect("read body").to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(
            body,
            serde_json::json!({ "errors": ["INVALID_LOGIN", "MALFORMED_DATA"] })
        );
    }
}
