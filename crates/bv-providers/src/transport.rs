use std::time::Duration;

use bv_core::{Error, ProviderId, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};

const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Shared HTTP transport, one per provider adapter (grounded in
/// `av-client::transport::Transport`): owns the `reqwest::Client`,
/// implements bounded exponential-backoff retry on transient upstream
/// statuses. Does not hold credentials itself; adapters attach them to
/// each request they build.
pub struct Transport {
  provider: ProviderId,
  client: Client,
  retry_attempts: u32,
  backoff_base: Duration,
  backoff_cap: Duration,
}

impl Transport {
  pub fn new(
    provider: ProviderId,
    timeout: Duration,
    retry_attempts: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
  ) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent("barvault/0.1")
      .build()
      .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

    Ok(Self { provider, client, retry_attempts: retry_attempts.max(1), backoff_base, backoff_cap })
  }

  pub fn client(&self) -> &Client {
    &self.client
  }

  /// Executes a request built fresh on each attempt (a consumed
  /// `RequestBuilder` cannot be retried directly), retrying transient
  /// statuses and network errors with exponential backoff up to
  /// `retry_attempts` total tries. Returns the final status and body text
  /// for the caller to interpret — this layer does not decide what a
  /// status code means to a specific provider, only whether it is worth
  /// retrying.
  pub async fn execute_with_retry<F>(&self, build: F) -> Result<(StatusCode, String)>
  where
    F: Fn() -> RequestBuilder,
  {
    let mut last_network_error: Option<String> = None;

    for attempt in 1..=self.retry_attempts {
      match build().send().await {
        Ok(response) => {
          let status = response.status();
          let body = response.text().await.map_err(|e| Error::ParseFailure {
            provider: self.provider,
            detail: format!("failed to read response body: {e}"),
          })?;

          if TRANSIENT_STATUSES.contains(&status.as_u16()) && attempt < self.retry_attempts {
            warn!(attempt, status = status.as_u16(), "transient provider status, retrying");
            self.backoff(attempt).await;
            continue;
          }
          return Ok((status, body));
        }
        Err(e) => {
          debug!(attempt, error = %e, "transport request failed");
          last_network_error = Some(e.to_string());
          if attempt < self.retry_attempts {
            self.backoff(attempt).await;
            continue;
          }
        }
      }
    }

    Err(Error::ProviderFailure {
      provider: self.provider,
      status: 0,
      redacted_body: last_network_error.unwrap_or_else(|| "request failed after retries".to_string()),
    })
  }

  async fn backoff(&self, attempt: u32) {
    let delay = self.backoff_base * 2_u32.pow(attempt.saturating_sub(1));
    let delay = delay.min(self.backoff_cap);
    tokio::time::sleep(delay).await;
  }
}

/// Redacts every occurrence of each `secret` in `text`, used before a
/// response body is placed into an error or log line (the no-credential
/// -leakage property).
pub fn redact(text: &str, secrets: &[&str]) -> String {
  let mut redacted = text.to_string();
  for secret in secrets {
    if secret.is_empty() {
      continue;
    }
    redacted = redacted.replace(secret, "[REDACTED]");
  }
  redacted
}
