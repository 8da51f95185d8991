use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::events::repo::Event;

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

/// Body for creating or replacing an event. Timestamps are RFC 3339.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub client_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ends_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub client_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ends_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            client_id: event.client_id,
            title: event.title,
            description: event.description,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            created_at: event.created_at,
        }
    }
}
