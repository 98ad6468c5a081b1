use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime};
use tracing::{debug, instrument, warn};

use super::dto::{Indicator, ProviderResponse, Reading};
use crate::config::IndicatorConfig;
use crate::validation::{format_date, today, InvalidDateFormat};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unknown indicator `{0}`, use one of: uf, dolar, euro, utm, ipc, ivp")]
    InvalidIndicator(String),
    #[error(transparent)]
    InvalidDateFormat(#[from] InvalidDateFormat),
    #[error("indicator provider unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("no data for {indicator} on {date}")]
    NoData { indicator: Indicator, date: String },
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Transient failures worth another GET.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
                    || (e.is_request() && e.status().is_none())
            }
            _ => false,
        }
    }
}

/// Client for the indicator provider (`mindicador.cl` and compatible APIs).
#[derive(Clone)]
pub struct IndicatorClient {
    http: reqwest::Client,
    config: IndicatorConfig,
}

impl IndicatorClient {
    pub fn new(config: IndicatorConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Identifier stored as the `source` of logged readings.
    pub fn source(&self) -> &str {
        &self.config.base_url
    }

    /// Validates a raw indicator name, then fetches it.
    pub async fn fetch_with_name(&self, name: &str, date: Option<Date>) -> Result<Reading, FetchError> {
        let indicator = name
            .parse::<Indicator>()
            .map_err(|_| FetchError::InvalidIndicator(name.to_string()))?;
        self.fetch(indicator, date).await
    }

    /// Value of `indicator` on `date` (today when `None`).
    #[instrument(skip(self, indicator), fields(indicator = %indicator))]
    pub async fn fetch(&self, indicator: Indicator, date: Option<Date>) -> Result<Reading, FetchError> {
        let date = date.unwrap_or_else(today);
        let date_str = format_date(date);
        let url = format!("{}/{}/{}", self.config.base_url, indicator, date_str);

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.retry_delay)
            .with_max_times(self.config.max_attempts.saturating_sub(1));

        let body = (|| self.get_once(&url))
            .retry(backoff)
            .when(FetchError::is_retryable)
            .notify(|err, after| warn!(error = %err, retry_in = ?after, "indicator request failed, retrying"))
            .await?;

        let entry = body.serie.into_iter().next().ok_or_else(|| {
            debug!(date = %date_str, "empty serie");
            FetchError::NoData {
                indicator,
                date: date_str.clone(),
            }
        })?;

        let value = entry
            .valor
            .to_decimal()
            .ok_or_else(|| FetchError::InvalidResponse(format!("valor {:?} is not a number", entry.valor)))?;
        let provider_date = entry
            .fecha
            .as_deref()
            .and_then(|f| OffsetDateTime::parse(f, &Rfc3339).ok());

        debug!(%value, date = %date_str, "indicator fetched");
        Ok(Reading {
            indicator,
            value,
            indicator_date: date,
            provider_date,
            source: self.config.base_url.clone(),
        })
    }

    async fn get_once(&self, url: &str) -> Result<ProviderResponse, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(FetchError::Network)?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(ProviderResponse { serie: Vec::new() });
        }

        response.json::<ProviderResponse>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::InvalidResponse(e.to_string())
            } else {
                FetchError::Network(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::time::Duration;
    use time::macros::{date, datetime};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> IndicatorClient {
        IndicatorClient::new(IndicatorConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(500),
            max_attempts: 3,
            retry_delay: Duration::from_millis(1),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn empty_serie_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/dolar/\d{2}-\d{2}-\d{4}$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serie": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).fetch(Indicator::Dolar, None).await.unwrap_err();
        assert!(matches!(err, FetchError::NoData { indicator: Indicator::Dolar, .. }));
    }

    #[tokio::test]
    async fn first_serie_entry_becomes_the_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dolar/01-01-2025"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "serie": [
                    { "valor": "950.12", "fecha": "2025-01-01T00:00:00Z" },
                    { "valor": "949.00", "fecha": "2024-12-31T00:00:00Z" }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reading = client.fetch(Indicator::Dolar, Some(date!(2025 - 01 - 01))).await.unwrap();
        assert_eq!(reading.value, "950.12".parse::<Decimal>().unwrap());
        assert_eq!(reading.indicator_date, date!(2025 - 01 - 01));
        assert_eq!(reading.provider_date, Some(datetime!(2025-01-01 0:00 UTC)));
        assert_eq!(reading.source, server.uri());
    }

    #[tokio::test]
    async fn requested_date_wins_over_provider_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uf/05-01-2025"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "serie": [{ "valor": 38419.17, "fecha": "2025-01-04T03:00:00.000Z" }]
            })))
            .mount(&server)
            .await;

        let reading = client_for(&server)
            .fetch(Indicator::Uf, Some(date!(2025 - 01 - 05)))
            .await
            .unwrap();
        assert_eq!(reading.indicator_date, date!(2025 - 01 - 05));
        assert_eq!(reading.value, Decimal::new(3841917, 2));
    }

    #[tokio::test]
    async fn unknown_indicator_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_with_name("bitcoin", None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidIndicator(n) if n == "bitcoin"));
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_succeed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/euro/02-01-2025"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/euro/02-01-2025"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "serie": [{ "valor": "1010.5", "fecha": "2025-01-02T00:00:00Z" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reading = client_for(&server)
            .fetch(Indicator::Euro, Some(date!(2025 - 01 - 02)))
            .await
            .unwrap();
        assert_eq!(reading.value, Decimal::new(10105, 1));
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch(Indicator::Utm, Some(date!(2025 - 01 - 02)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn client_errors_and_no_data_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ipc/02-01-2025"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ivp/02-01-2025"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serie": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch(Indicator::Ipc, Some(date!(2025 - 01 - 02))).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        let err = client.fetch(Indicator::Ivp, Some(date!(2025 - 01 - 02))).await.unwrap_err();
        assert!(matches!(err, FetchError::NoData { .. }));
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "serie": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = IndicatorClient::new(IndicatorConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(100),
            max_attempts: 1,
            retry_delay: Duration::from_millis(1),
        })
        .unwrap();
        let err = client.fetch(Indicator::Uf, None).await.unwrap_err();
        match err {
            FetchError::Network(e) => assert!(e.is_timeout()),
            other => panic!("expected network timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).fetch(Indicator::Uf, None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }
}
