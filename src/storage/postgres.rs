use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, error};

use super::{Storage, StorageError};
use crate::auth::repo_types::User;
use crate::query_log::repo;
use crate::query_log::repo_types::{IndicatorQuery, NewIndicatorQuery};

#[derive(Clone)]
pub struct PgStorage {
    db: PgPool,
}

impl PgStorage {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

fn map_write_error(err: sqlx::Error, username: &str) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StorageError::Conflict(format!("user `{username}`"));
        }
        if db_err.is_foreign_key_violation() {
            return StorageError::UnknownUser(username.to_string());
        }
    }
    error!(error = %err, "database write failed");
    StorageError::Database(err)
}

#[async_trait]
impl Storage for PgStorage {
    async fn find_user(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(User::find_by_username(&self.db, username).await?)
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StorageError> {
        // dropping an uncommitted transaction rolls it back
        let mut tx = self.db.begin().await?;
        let user = User::create_tx(&mut tx, username, password_hash)
            .await
            .map_err(|e| map_write_error(e, username))?;
        tx.commit().await?;
        debug!(username = %user.username, "user row inserted");
        Ok(user)
    }

    async fn insert_query(&self, entry: NewIndicatorQuery) -> Result<IndicatorQuery, StorageError> {
        let mut tx = self.db.begin().await?;
        let row = repo::insert_query_tx(&mut tx, &entry)
            .await
            .map_err(|e| map_write_error(e, &entry.username))?;
        tx.commit().await?;
        debug!(id = row.id, username = %row.username, "indicator_log row inserted");
        Ok(row)
    }

    async fn list_queries(&self, username: &str) -> Result<Vec<IndicatorQuery>, StorageError> {
        Ok(repo::list_by_user(&self.db, username).await?)
    }
}
