use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bv_core::{Bar, BarchartSession, CredentialBundle, Error, Frequency, ProviderId};
use bv_ratelimit::Pacer;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::instrument;

use crate::transport::{redact, Transport};
use crate::{FetchOutcome, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://www.barchart.com/proxies/core-api/v1/historical";

/// Cookie-authenticated provider: two upstream calls per sub-interval
/// (unadjusted, then adjusted), paired with zero rate-limiter delay
/// between them and joined on date into one bar list.
pub struct BarchartProvider {
  transport: Transport,
  base_url: String,
}

impl BarchartProvider {
  pub fn new(
    timeout: Duration,
    retry_attempts: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
  ) -> Result<Self, Error> {
    let transport =
      Transport::new(ProviderId::Barchart, timeout, retry_attempts, backoff_base, backoff_cap)?;
    Ok(Self { transport, base_url: DEFAULT_BASE_URL.to_string() })
  }

  #[cfg(test)]
  fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  async fn call(
    &self,
    session: &BarchartSession,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    adjusted: bool,
  ) -> Result<(StatusCode, String), Error> {
    let url = format!("{}/{}", self.base_url, symbol);
    let start_s = start.format("%Y-%m-%d").to_string();
    let end_s = end.format("%Y-%m-%d").to_string();
    let adjusted_param = if adjusted { "true" } else { "false" };

    self
      .transport
      .execute_with_retry(|| {
        self
          .transport
          .client()
          .get(&url)
          .header("Cookie", session.cookie_string.clone())
          .header("X-XSRF-TOKEN", session.xsrf_token.clone())
          .header("User-Agent", session.user_agent.clone())
          .query(&[("start", start_s.as_str()), ("end", end_s.as_str()), ("adjusted", adjusted_param)])
      })
      .await
  }
}

#[derive(Debug, Deserialize)]
struct BarchartRow {
  date: String,
  open: Option<f64>,
  high: Option<f64>,
  low: Option<f64>,
  close: Option<f64>,
  volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BarchartResponse {
  data: Vec<BarchartRow>,
}

fn parse_rows(body: &str) -> Result<HashMap<NaiveDate, BarchartRow>, Error> {
  let parsed: BarchartResponse = serde_json::from_str(body)
    .map_err(|e| Error::ParseFailure { provider: ProviderId::Barchart, detail: e.to_string() })?;

  parsed
    .data
    .into_iter()
    .map(|row| {
      let date_text = row.date.get(..10).unwrap_or(&row.date).to_string();
      let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")?;
      Ok((date, row))
    })
    .collect()
}

#[async_trait]
impl ProviderAdapter for BarchartProvider {
  #[instrument(skip(self, credentials, pacer), fields(provider = "barchart", symbol))]
  async fn fetch(
    &self,
    symbol: &str,
    freq: Frequency,
    start: NaiveDate,
    end: NaiveDate,
    credentials: &CredentialBundle,
    pacer: &dyn Pacer,
  ) -> FetchOutcome {
    let session = match &credentials.barchart {
      Some(s) => s,
      None => {
        return FetchOutcome::Failure(Error::CredentialMissing {
          provider: ProviderId::Barchart,
          field: "barchart_cookies".to_string(),
          expected_path: "~/.config/market-data/barchart_cookies.json".to_string(),
        })
      }
    };

    let secrets = [session.cookie_string.as_str(), session.xsrf_token.as_str()];

    let (unadjusted_status, unadjusted_body) = match self.call(session, symbol, start, end, false).await {
      Ok(v) => v,
      Err(e) => return FetchOutcome::Failure(e),
    };
    if unadjusted_status == StatusCode::UNAUTHORIZED || unadjusted_status == StatusCode::FORBIDDEN {
      return FetchOutcome::CredentialStale;
    }
    if !unadjusted_status.is_success() {
      return FetchOutcome::Failure(Error::ProviderFailure {
        provider: ProviderId::Barchart,
        status: unadjusted_status.as_u16(),
        redacted_body: redact(&unadjusted_body, &secrets),
      });
    }

    // The adjusted/unadjusted pair is paced as one symbol: zero delay.
    pacer.note_same_symbol_call().await;

    let (adjusted_status, adjusted_body) = match self.call(session, symbol, start, end, true).await {
      Ok(v) => v,
      Err(e) => return FetchOutcome::Failure(e),
    };
    if adjusted_status == StatusCode::UNAUTHORIZED || adjusted_status == StatusCode::FORBIDDEN {
      return FetchOutcome::CredentialStale;
    }
    if !adjusted_status.is_success() {
      return FetchOutcome::Failure(Error::ProviderFailure {
        provider: ProviderId::Barchart,
        status: adjusted_status.as_u16(),
        redacted_body: redact(&adjusted_body, &secrets),
      });
    }

    let unadjusted = match parse_rows(&unadjusted_body) {
      Ok(v) => v,
      Err(e) => return FetchOutcome::Failure(e),
    };
    let mut adjusted = match parse_rows(&adjusted_body) {
      Ok(v) => v,
      Err(e) => return FetchOutcome::Failure(e),
    };

    let fetched_at = Utc::now();
    let mut dates: Vec<NaiveDate> = unadjusted.keys().chain(adjusted.keys()).copied().collect();
    dates.sort();
    dates.dedup();

    let bars = dates
      .into_iter()
      .map(|date| {
        let u = unadjusted.get(&date);
        let a = adjusted.remove(&date);
        Bar {
          symbol: symbol.to_string(),
          date,
          frequency: freq,
          provider: ProviderId::Barchart,
          open: u.and_then(|r| r.open),
          high: u.and_then(|r| r.high),
          low: u.and_then(|r| r.low),
          close: u.and_then(|r| r.close),
          volume: u.and_then(|r| r.volume),
          adj_open: a.as_ref().and_then(|r| r.open),
          adj_high: a.as_ref().and_then(|r| r.high),
          adj_low: a.as_ref().and_then(|r| r.low),
          adj_close: a.as_ref().and_then(|r| r.close),
          adj_volume: a.as_ref().and_then(|r| r.volume),
          fetched_at,
        }
      })
      .collect();

    FetchOutcome::Fetched(bars)
  }

  fn probe_credentials(&self, credentials: &CredentialBundle) -> Result<(), Error> {
    if credentials.barchart.is_some() {
      Ok(())
    } else {
      Err(Error::CredentialMissing {
        provider: ProviderId::Barchart,
        field: "barchart_cookies".to_string(),
        expected_path: "~/.config/market-data/barchart_cookies.json".to_string(),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn session() -> BarchartSession {
    BarchartSession {
      cookie_string: "session=abc".to_string(),
      xsrf_token: "xsrf-secret".to_string(),
      user_agent: "test-agent".to_string(),
      captured_at: Utc::now(),
    }
  }

  fn creds() -> CredentialBundle {
    CredentialBundle { tiingo: None, barchart: Some(session()) }
  }

  fn provider() -> BarchartProvider {
    BarchartProvider::new(Duration::from_secs(5), 2, Duration::from_millis(1), Duration::from_millis(5))
      .unwrap()
  }

  struct NoopPacer;

  #[async_trait]
  impl Pacer for NoopPacer {
    async fn note_same_symbol_call(&self) {}
    async fn note_new_symbol_call(&self) {}
  }

  fn body_for(dates: &[&str]) -> serde_json::Value {
    serde_json::json!({
      "data": dates.iter().map(|d| serde_json::json!({
        "date": d, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 100.0
      })).collect::<Vec<_>>()
    })
  }

  #[tokio::test]
  async fn fetch_joins_unadjusted_and_adjusted_on_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/AAPL"))
      .respond_with(ResponseTemplate::new(200).set_body_json(body_for(&["2024-01-02"])))
      .mount(&server)
      .await;

    let adapter = provider().with_base_url(server.uri());
    let outcome = adapter
      .fetch("AAPL", Frequency::Daily, date(2024, 1, 2), date(2024, 1, 2), &creds(), &NoopPacer)
      .await;

    match outcome {
      FetchOutcome::Fetched(bars) => {
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, Some(1.0));
        assert_eq!(bars[0].adj_open, Some(1.0));
      }
      _ => panic!("expected Fetched"),
    }
  }

  #[tokio::test]
  async fn fetch_maps_401_to_credential_stale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/AAPL"))
      .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
      .mount(&server)
      .await;

    let adapter = provider().with_base_url(server.uri());
    let outcome = adapter
      .fetch("AAPL", Frequency::Daily, date(2024, 1, 2), date(2024, 1, 2), &creds(), &NoopPacer)
      .await;

    assert!(matches!(outcome, FetchOutcome::CredentialStale));
  }

  #[tokio::test]
  async fn fetch_without_session_fails_fast() {
    let adapter = provider();
    let empty = CredentialBundle::default();
    let outcome =
      adapter.fetch("AAPL", Frequency::Daily, date(2024, 1, 2), date(2024, 1, 2), &empty, &NoopPacer).await;
    assert!(matches!(outcome, FetchOutcome::Failure(Error::CredentialMissing { .. })));
  }

  #[test]
  fn probe_credentials_requires_session() {
    let adapter = provider();
    assert!(adapter.probe_credentials(&CredentialBundle::default()).is_err());
    assert!(adapter.probe_credentials(&creds()).is_ok());
  }
}
