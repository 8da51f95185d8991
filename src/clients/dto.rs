use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clients::repo::Client;

/// `limit`/`offset` query parameters shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    /// Bounds the raw query values before they reach the database: negative
    /// numbers read as zero, `limit` is capped at 100.
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(0, 100), self.offset.max(0))
    }
}

/// Body for creating or replacing a client.
#[derive(Debug, Deserialize)]
pub struct ClientRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            created_at: client.created_at,
        }
    }
}
