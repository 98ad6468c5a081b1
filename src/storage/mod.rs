//! Persistence of users and indicator-query rows.
//!
//! [`Storage`] is the single seam between the workflow and the database.
//! [`PgStorage`] talks to PostgreSQL, [`MemoryStorage`] keeps everything in
//! process (tests, and runs without `DATABASE_URL`).

use async_trait::async_trait;

use crate::auth::repo_types::User;
use crate::query_log::repo_types::{IndicatorQuery, NewIndicatorQuery};

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A unique key rejected the write.
    #[error("{0} already exists")]
    Conflict(String),
    #[error("user `{0}` does not exist")]
    UnknownUser(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Fails with [`StorageError::Conflict`] when the username is taken.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StorageError>;

    /// Appends one row. Fails with [`StorageError::UnknownUser`] when the owner is missing.
    async fn insert_query(&self, entry: NewIndicatorQuery) -> Result<IndicatorQuery, StorageError>;

    /// Rows of one user, newest `query_date` first.
    async fn list_queries(&self, username: &str) -> Result<Vec<IndicatorQuery>, StorageError>;
}
