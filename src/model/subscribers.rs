use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

/// Stored newsletter subscriber
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    /// ID of the subscriber, also the payload of its verification token
    pub id: Uuid,
    pub email: String,
    /// Flips to `true` once the verification link is visited, never back
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}
