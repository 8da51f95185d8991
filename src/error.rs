use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Machine-readable codes returned to clients in `{"errors": [...]}` bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidLogin,
    BadCredentials,
    UserIsDisabled,
    UserNotFound,
    UserIsNotDisabled,
    UserAlreadyExists,
    TokenIsNotValid,
    TokenIsExpired,
    MalformedData,
    Unauthorized,
    ItemNotFound,
    InternalServerError,
}

/// Failures produced by the auth services. Clients only ever see the mapped
/// `ErrorCode`; the `Internal` payload stays in the logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("bad credentials")]
    BadCredentials,
    #[error("account is disabled")]
    Disabled,
    #[error("token is not valid")]
    InvalidToken,
    #[error("verification code not found")]
    CodeNotFound,
    #[error("verification code expired")]
    CodeExpired,
    #[error("user not found")]
    UserNotFound,
    #[error("account is already enabled")]
    NotDisabled,
    #[error("email or username already taken")]
    AlreadyExists,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// The failure-to-code registry. Everything unmapped collapses to
    /// `INTERNAL_SERVER_ERROR` via the `Internal` arm.
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::BadCredentials => ErrorCode::BadCredentials,
            AuthError::Disabled => ErrorCode::UserIsDisabled,
            AuthError::InvalidToken => ErrorCode::Unauthorized,
            AuthError::CodeNotFound => ErrorCode::TokenIsNotValid,
            AuthError::CodeExpired => ErrorCode::TokenIsExpired,
            AuthError::UserNotFound => ErrorCode::UserNotFound,
            AuthError::NotDisabled => ErrorCode::UserIsNotDisabled,
            AuthError::AlreadyExists => ErrorCode::UserAlreadyExists,
            AuthError::Internal(_) => ErrorCode::InternalServerError,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::BadCredentials | AuthError::Disabled | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::CodeNotFound
            | AuthError::CodeExpired
            | AuthError::UserNotFound
            | AuthError::NotDisabled => StatusCode::BAD_REQUEST,
            AuthError::AlreadyExists => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    errors: Vec<ErrorCode>,
}

/// HTTP-facing error: a status plus the code list for the response body.
/// Never carries internals; those are logged where the error is converted.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    errors: Vec<ErrorCode>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode) -> Self {
        Self {
            status,
            errors: vec![code],
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)
    }

    pub fn malformed() -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::MalformedData)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::ItemNotFound)
    }

    /// Login failures always carry the generic code first, then the cause.
    pub fn login_failure(err: AuthError) -> Self {
        if let AuthError::Internal(e) = &err {
            error!(error = %e, "login failed with internal error");
        }
        Self {
            status: err.status(),
            errors: vec![ErrorCode::InvalidLogin, err.code()],
        }
    }

    /// Login attempt whose body could not be parsed at all.
    pub fn login_malformed() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            errors: vec![ErrorCode::InvalidLogin, ErrorCode::MalformedData],
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let AuthError::Internal(e) = &err {
            error!(error = %e, "internal error");
        }
        Self::new(err.status(), err.code())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %err, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalServerError)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { errors: self.errors })).into_response()
    }
}
