use std::time::Duration;

use async_trait::async_trait;
use bv_core::{Bar, CredentialBundle, Error, Frequency, ProviderId};
use bv_ratelimit::Pacer;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::instrument;

use crate::transport::{redact, Transport};
use crate::{FetchOutcome, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.tiingo.com/tiingo/daily";

/// Token-authenticated provider: one call per sub-interval returns both
/// adjusted and unadjusted series in a single payload.
pub struct TiingoProvider {
  transport: Transport,
  base_url: String,
}

impl TiingoProvider {
  pub fn new(
    timeout: Duration,
    retry_attempts: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
  ) -> Result<Self, Error> {
    let transport = Transport::new(ProviderId::Tiingo, timeout, retry_attempts, backoff_base, backoff_cap)?;
    Ok(Self { transport, base_url: DEFAULT_BASE_URL.to_string() })
  }

  #[cfg(test)]
  fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }
}

#[derive(Debug, Deserialize)]
struct TiingoBar {
  date: String,
  open: Option<f64>,
  high: Option<f64>,
  low: Option<f64>,
  close: Option<f64>,
  volume: Option<f64>,
  #[serde(rename = "adjOpen")]
  adj_open: Option<f64>,
  #[serde(rename = "adjHigh")]
  adj_high: Option<f64>,
  #[serde(rename = "adjLow")]
  adj_low: Option<f64>,
  #[serde(rename = "adjClose")]
  adj_close: Option<f64>,
  #[serde(rename = "adjVolume")]
  adj_volume: Option<f64>,
}

impl TiingoBar {
  fn into_bar(self, symbol: &str, freq: Frequency) -> Result<Bar, Error> {
    let date = self.date.get(..10).unwrap_or(&self.date);
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    Ok(Bar {
      symbol: symbol.to_string(),
      date,
      frequency: freq,
      provider: ProviderId::Tiingo,
      open: self.open,
      high: self.high,
      low: self.low,
      close: self.close,
      volume: self.volume,
      adj_open: self.adj_open,
      adj_high: self.adj_high,
      adj_low: self.adj_low,
      adj_close: self.adj_close,
      adj_volume: self.adj_volume,
      fetched_at: Utc::now(),
    })
  }
}

#[async_trait]
impl ProviderAdapter for TiingoProvider {
  #[instrument(skip(self, credentials), fields(provider = "tiingo", symbol))]
  async fn fetch(
    &self,
    symbol: &str,
    freq: Frequency,
    start: NaiveDate,
    end: NaiveDate,
    credentials: &CredentialBundle,
    _pacer: &dyn Pacer,
  ) -> FetchOutcome {
    let token = match &credentials.tiingo {
      Some(c) => c.api_key.clone(),
      None => {
        return FetchOutcome::Failure(Error::CredentialMissing {
          provider: ProviderId::Tiingo,
          field: "tiingo_api_key".to_string(),
          expected_path: "~/.config/market-data/credentials.json".to_string(),
        })
      }
    };

    let url = format!("{}/{}/prices", self.base_url, symbol);
    let start_s = start.format("%Y-%m-%d").to_string();
    let end_s = end.format("%Y-%m-%d").to_string();
    let token_for_request = token.clone();

    let result = self
      .transport
      .execute_with_retry(|| {
        self
          .transport
          .client()
          .get(&url)
          .query(&[("startDate", start_s.as_str()), ("endDate", end_s.as_str())])
          .query(&[("token", token_for_request.as_str())])
      })
      .await;

    let (status, body) = match result {
      Ok(v) => v,
      Err(e) => return FetchOutcome::Failure(e),
    };

    if status.is_success() {
      match serde_json::from_str::<Vec<TiingoBar>>(&body) {
        Ok(bars) => match bars.into_iter().map(|b| b.into_bar(symbol, freq)).collect() {
          Ok(bars) => FetchOutcome::Fetched(bars),
          Err(e) => FetchOutcome::Failure(e),
        },
        Err(e) => FetchOutcome::Failure(Error::ParseFailure {
          provider: ProviderId::Tiingo,
          detail: e.to_string(),
        }),
      }
    } else {
      let redacted = redact(&body, &[&token]);
      FetchOutcome::Failure(Error::ProviderFailure {
        provider: ProviderId::Tiingo,
        status: status.as_u16(),
        redacted_body: redacted,
      })
    }
  }

  fn probe_credentials(&self, credentials: &CredentialBundle) -> Result<(), Error> {
    if credentials.tiingo.is_some() {
      Ok(())
    } else {
      Err(Error::CredentialMissing {
        provider: ProviderId::Tiingo,
        field: "tiingo_api_key".to_string(),
        expected_path: "~/.config/market-data/credentials.json".to_string(),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bv_core::TiingoCredential;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn creds(token: &str) -> CredentialBundle {
    CredentialBundle { tiingo: Some(TiingoCredential { api_key: token.to_string() }), barchart: None }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn provider() -> TiingoProvider {
    TiingoProvider::new(Duration::from_secs(5), 2, Duration::from_millis(1), Duration::from_millis(5)).unwrap()
  }

  struct NoopPacer;

  #[async_trait]
  impl Pacer for NoopPacer {
    async fn note_same_symbol_call(&self) {}
    async fn note_new_symbol_call(&self) {}
  }

  #[tokio::test]
  async fn fetch_maps_successful_payload_into_bars() {
    let server = MockServer::start().await;
    let body = serde_json::json!([
      {"date": "2024-01-02T00:00:00.000Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5,
       "volume": 100.0, "adjOpen": 1.0, "adjHigh": 2.0, "adjLow": 0.5, "adjClose": 1.5, "adjVolume": 100.0}
    ]);
    Mock::given(method("GET"))
      .and(path("/AAPL/prices"))
      .respond_with(ResponseTemplate::new(200).set_body_json(body))
      .mount(&server)
      .await;

    let adapter = provider().with_base_url(server.uri());
    let outcome = adapter
      .fetch("AAPL", Frequency::Daily, date(2024, 1, 2), date(2024, 1, 2), &creds("tok"), &NoopPacer)
      .await;

    match outcome {
      FetchOutcome::Fetched(bars) => {
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2024, 1, 2));
      }
      _ => panic!("expected Fetched"),
    }
  }

  #[tokio::test]
  async fn fetch_without_token_fails_fast_with_no_network_call() {
    let adapter = provider();
    let outcome = adapter
      .fetch(
        "AAPL",
        Frequency::Daily,
        date(2024, 1, 2),
        date(2024, 1, 2),
        &CredentialBundle::default(),
        &NoopPacer,
      )
      .await;
    assert!(matches!(outcome, FetchOutcome::Failure(Error::CredentialMissing { .. })));
  }

  #[tokio::test]
  async fn fetch_surfaces_non_transient_status_as_provider_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/AAPL/prices"))
      .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
      .mount(&server)
      .await;

    let adapter = provider().with_base_url(server.uri());
    let outcome = adapter
      .fetch("AAPL", Frequency::Daily, date(2024, 1, 2), date(2024, 1, 2), &creds("tok"), &NoopPacer)
      .await;

    match outcome {
      FetchOutcome::Failure(Error::ProviderFailure { status, .. }) => assert_eq!(status, 404),
      _ => panic!("expected ProviderFailure"),
    }
  }

  #[tokio::test]
  async fn fetch_redacts_token_from_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/AAPL/prices"))
      .respond_with(ResponseTemplate::new(403).set_body_string("token secret-token-xyz invalid"))
      .mount(&server)
      .await;

    let adapter = provider().with_base_url(server.uri());
    let outcome = adapter
      .fetch(
        "AAPL",
        Frequency::Daily,
        date(2024, 1, 2),
        date(2024, 1, 2),
        &creds("secret-token-xyz"),
        &NoopPacer,
      )
      .await;

    match outcome {
      FetchOutcome::Failure(Error::ProviderFailure { redacted_body, .. }) => {
        assert!(!redacted_body.contains("secret-token-xyz"));
      }
      _ => panic!("expected ProviderFailure"),
    }
  }

  #[test]
  fn probe_credentials_requires_token() {
    let adapter = provider();
    assert!(adapter.probe_credentials(&CredentialBundle::default()).is_err());
    assert!(adapter.probe_credentials(&creds("tok")).is_ok());
  }
}
