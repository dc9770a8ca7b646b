use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// `hashed_refresh_token` is the argon2 hash of the most recently issued
/// refresh token; `None` means no active session. Neither hash field is ever
/// serialized outward.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub hashed_refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
}
