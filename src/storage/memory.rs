use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{Storage, StorageError};
use crate::auth::repo_types::User;
use crate::query_log::repo_types::{IndicatorQuery, NewIndicatorQuery};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    log: Vec<IndicatorQuery>,
    next_id: i64,
}

/// Process-local [`Storage`] with the same constraints as the SQL schema.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_user(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(username) {
            return Err(StorageError::Conflict(format!("user `{username}`")));
        }
        let user = User {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn insert_query(&self, entry: NewIndicatorQuery) -> Result<IndicatorQuery, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&entry.username) {
            return Err(StorageError::UnknownUser(entry.username));
        }
        tables.next_id += 1;
        let row = IndicatorQuery {
            id: tables.next_id,
            username: entry.username,
            indicator_name: entry.indicator.as_str().to_string(),
            value: entry.value,
            indicator_date: entry.indicator_date,
            query_date: entry.query_date,
            source: entry.source,
        };
        tables.log.push(row.clone());
        Ok(row)
    }

    async fn list_queries(&self, username: &str) -> Result<Vec<IndicatorQuery>, StorageError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<IndicatorQuery> = tables
            .log
            .iter()
            .filter(|r| r.username == username)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.query_date, b.id).cmp(&(a.query_date, a.id)));
        Ok(rows)
    }
}
