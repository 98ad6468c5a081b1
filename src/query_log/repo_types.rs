use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::indicators::dto::Indicator;

/// Row of `indicator_log`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct IndicatorQuery {
    pub id: i64,
    pub username: String,
    pub indicator_name: String,
    pub value: Decimal,
    pub indicator_date: Date,
    pub query_date: OffsetDateTime,
    pub source: String,
}

/// Insert payload; `id` is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewIndicatorQuery {
    pub username: String,
    pub indicator: Indicator,
    pub value: Decimal,
    pub indicator_date: Date,
    pub query_date: OffsetDateTime,
    pub source: String,
}
