use serde::{Deserialize, Serialize};

use crate::users::repo::User;

/// Request body for registration. `username` is optional but unique when
/// given.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
}

/// Partial profile update; absent fields stay as they are.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body for requesting a verification code.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub email: String,
}

/// Body for redeeming a verification code.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub token: String,
}

/// Public view of a user record.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub enabled: bool,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            enabled: user.enabled,
        }
    }
}
