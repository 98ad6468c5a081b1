use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub username: String,           // unique, immutable
    #[serde(skip_serializing)]
    pub password_hash: String,      // bcrypt hash, not exposed
    pub created_at: OffsetDateTime, // registration timestamp
}
