/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

use thiserror::Error;

use crate::types::ProviderId;

/// The unified failure taxonomy for the price cache core.
///
/// Every variant here corresponds 1:1 to a failure mode named in the
/// retrieval engine's error handling design: invalid input, missing or
/// stale credentials, upstream provider failures, response parsing
/// failures, store corruption, and cancellation/timeout.
#[derive(Error, Debug)]
pub enum Error {
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("missing credential '{field}' for provider {provider} (expected in {expected_path})")]
  CredentialMissing { provider: ProviderId, field: String, expected_path: String },

  #[error("credential for provider {provider} is stale (run cookie capture to refresh)")]
  CredentialStale { provider: ProviderId },

  #[error("provider {provider} failed: status {status}, body: {redacted_body}")]
  ProviderFailure { provider: ProviderId, status: u16, redacted_body: String },

  #[error("failed to parse response from provider {provider}: {detail}")]
  ParseFailure { provider: ProviderId, detail: String },

  #[error("bar store at {path} is corrupt: {hint}")]
  StoreCorruption { path: String, hint: String },

  #[error("request cancelled")]
  Cancelled,

  #[error("request timed out after {0:?}")]
  Timeout(std::time::Duration),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("store error: {0}")]
  Store(String),

  #[error("date parse error: {0}")]
  ParseDate(#[from] chrono::ParseError),

  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Whether this failure should be retried transparently by the adapter.
  /// Transient HTTP statuses are recovered *inside* the adapter's retry
  /// loop (spec §7) and never reach a caller as this enum at all; this
  /// exists only as a defensive guard for code that inspects an error after
  /// the retry loop has already given up.
  pub fn is_provider_failure(&self) -> bool {
    matches!(self, Error::ProviderFailure { .. })
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn credential_missing_names_field_and_path() {
    let err = Error::CredentialMissing {
      provider: ProviderId::Tiingo,
      field: "tiingo_api_key".to_string(),
      expected_path: "~/.config/market-data/credentials.json".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("tiingo_api_key"));
    assert!(msg.contains("credentials.json"));
  }

  #[test]
  fn provider_failure_carries_status_and_body() {
    let err = Error::ProviderFailure {
      provider: ProviderId::Barchart,
      status: 403,
      redacted_body: "forbidden".to_string(),
    };
    assert!(err.is_provider_failure());
    assert!(err.to_string().contains("403"));
  }

  #[test]
  fn credential_stale_names_provider() {
    let err = Error::CredentialStale { provider: ProviderId::Barchart };
    assert!(err.to_string().contains("barchart"));
  }
}
