use serde::{Deserialize, Serialize};

use crate::users::repo::User;

/// Request body for login. Missing fields deserialize to empty strings and
/// fall through the credential check instead of rejecting the body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub principal: String,
    #[serde(default)]
    pub password: String,
}

/// Minimal identity summary returned after a successful login.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub email: String,
    pub username: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            username: user.username,
        }
    }
}
