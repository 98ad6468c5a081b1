use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, instrument};

use super::repo_types::{IndicatorQuery, NewIndicatorQuery};
use crate::indicators::dto::Reading;
use crate::storage::{Storage, StorageError};

/// Append-only record of confirmed indicator lookups.
#[derive(Clone)]
pub struct QueryLog {
    storage: Arc<dyn Storage>,
}

impl QueryLog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Appends a row stamped with the current time. Identical calls produce
    /// separate rows.
    #[instrument(skip(self, reading), fields(indicator = %reading.indicator))]
    pub async fn record(&self, username: &str, reading: &Reading) -> Result<IndicatorQuery, StorageError> {
        let row = self
            .storage
            .insert_query(NewIndicatorQuery {
                username: username.to_string(),
                indicator: reading.indicator,
                value: reading.value,
                indicator_date: reading.indicator_date,
                query_date: OffsetDateTime::now_utc(),
                source: reading.source.clone(),
            })
            .await?;
        info!(id = row.id, "indicator query logged");
        Ok(row)
    }

    pub async fn list_for_user(&self, username: &str) -> Result<Vec<IndicatorQuery>, StorageError> {
        self.storage.list_queries(username).await
    }
}
