use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{IndicatorQuery, NewIndicatorQuery};

/// Append one log row within a transaction.
pub async fn insert_query_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewIndicatorQuery,
) -> Result<IndicatorQuery, sqlx::Error> {
    sqlx::query_as::<_, IndicatorQuery>(
        r#"
        INSERT INTO indicator_log
            (indicator_name, value, indicator_date, query_date, username, source)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, username, indicator_name, value, indicator_date, query_date, source
        "#,
    )
    .bind(entry.indicator.as_str())
    .bind(entry.value)
    .bind(entry.indicator_date)
    .bind(entry.query_date)
    .bind(&entry.username)
    .bind(&entry.source)
    .fetch_one(&mut **tx)
    .await
}

/// All rows of one user, most recent first.
pub async fn list_by_user(db: &PgPool, username: &str) -> Result<Vec<IndicatorQuery>, sqlx::Error> {
    sqlx::query_as::<_, IndicatorQuery>(
        r#"
        SELECT id, username, indicator_name, value, indicator_date, query_date, source
          FROM indicator_log
         WHERE username = $1
         ORDER BY query_date DESC, id DESC
        "#,
    )
    .bind(username)
    .fetch_all(db)
    .await
}
