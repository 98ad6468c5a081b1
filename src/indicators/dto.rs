use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Indicators published by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Uf,
    Dolar,
    Euro,
    Utm,
    Ipc,
    Ivp,
}

impl Indicator {
    pub const ALL: [Indicator; 6] = [
        Indicator::Uf,
        Indicator::Dolar,
        Indicator::Euro,
        Indicator::Utm,
        Indicator::Ipc,
        Indicator::Ivp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Indicator::Uf => "uf",
            Indicator::Dolar => "dolar",
            Indicator::Euro => "euro",
            Indicator::Utm => "utm",
            Indicator::Ipc => "ipc",
            Indicator::Ivp => "ivp",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator `{0}`")]
pub struct UnknownIndicator(pub String);

impl FromStr for Indicator {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Indicator::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| UnknownIndicator(s.to_string()))
    }
}

/// One indicator value for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub indicator: Indicator,
    pub value: Decimal,
    /// Date the caller asked for; this is what gets logged.
    pub indicator_date: Date,
    /// Date reported by the provider, informational only.
    pub provider_date: Option<OffsetDateTime>,
    pub source: String,
}

/// Body of `GET <base_url>/<indicator>/<DD-MM-YYYY>`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponse {
    #[serde(default)]
    pub serie: Vec<SerieEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SerieEntry {
    pub valor: RawValue,
    #[serde(default)]
    pub fecha: Option<String>,
}

/// `valor` shows up both as a JSON number and as a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawValue {
    Number(serde_json::Number),
    Text(String),
}

impl RawValue {
    pub fn to_decimal(&self) -> Option<Decimal> {
        let text = match self {
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.trim().to_string(),
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }
}
