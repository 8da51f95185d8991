use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, users::repo::User};

/// The identity attached by the authorization middleware. Extracting it is
/// what makes a route protected: an unauthenticated request is rejected here
/// with `401 UNAUTHORIZED`, not in the middleware.
#[derive(Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use time::OffsetDateTime;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "ada@example.com".into(),
            username: Some("ada".into()),
            password_hash: "irrelevant".into(),
            enabled: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn rejects_when_no_identity_attached() {
        let (mut parts, _) = Request::new(()).into_parts();
        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn returns_attached_identity() {
        let mut req = Request::new(());
        req.extensions_mut().insert(CurrentUser(sample_user()));
        let (mut parts, _) = req.into_parts();
        let got = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .expect("extract should succeed");
        assert_eq!(got.0.email, "ada@example.com");
    }
}
