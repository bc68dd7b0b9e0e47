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

//! Shared data model: bars, providers, results, and credentials.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell_fallback as symbol_regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported bar frequencies. Only `Daily` is implemented; the enum exists
/// so that adding a frequency later is additive rather than a breaking
/// change to every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
  Daily,
}

impl std::fmt::Display for Frequency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Frequency::Daily => write!(f, "daily"),
    }
  }
}

impl std::str::FromStr for Frequency {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "daily" => Ok(Frequency::Daily),
      other => Err(Error::Store(format!("unknown frequency column value: {other:?}"))),
    }
  }
}

/// The two upstream providers this core knows how to fetch from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
  /// Cookie/CSRF-session authenticated provider, needs two calls per
  /// sub-interval (unadjusted + adjusted).
  Barchart,
  /// API-token authenticated provider, one call per sub-interval.
  Tiingo,
}

impl std::fmt::Display for ProviderId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ProviderId::Barchart => write!(f, "barchart"),
      ProviderId::Tiingo => write!(f, "tiingo"),
    }
  }
}

impl std::str::FromStr for ProviderId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "barchart" => Ok(ProviderId::Barchart),
      "tiingo" => Ok(ProviderId::Tiingo),
      other => Err(Error::Store(format!("unknown provider column value: {other:?}"))),
    }
  }
}

/// How a caller asks the engine to pick a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderSelection {
  Explicit(ProviderId),
  Auto,
}

impl ProviderSelection {
  pub fn barchart() -> Self {
    ProviderSelection::Explicit(ProviderId::Barchart)
  }

  pub fn tiingo() -> Self {
    ProviderSelection::Explicit(ProviderId::Tiingo)
  }
}

/// One daily trading record. Identity is `(symbol, date, frequency,
/// provider)`; non-null numeric fields are always `>= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
  pub symbol: String,
  pub date: NaiveDate,
  pub frequency: Frequency,
  pub provider: ProviderId,
  pub open: Option<f64>,
  pub high: Option<f64>,
  pub low: Option<f64>,
  pub close: Option<f64>,
  pub volume: Option<f64>,
  pub adj_open: Option<f64>,
  pub adj_high: Option<f64>,
  pub adj_low: Option<f64>,
  pub adj_close: Option<f64>,
  pub adj_volume: Option<f64>,
  pub fetched_at: DateTime<Utc>,
}

impl Bar {
  /// The 4-tuple key identifying this bar in the store.
  pub fn key(&self) -> (String, NaiveDate, Frequency, ProviderId) {
    (self.symbol.clone(), self.date, self.frequency, self.provider)
  }

  /// True if every non-null numeric field on this bar is `>= 0`, the
  /// invariant the Bar Store and providers must both uphold.
  pub fn has_non_negative_fields(&self) -> bool {
    [
      self.open,
      self.high,
      self.low,
      self.close,
      self.volume,
      self.adj_open,
      self.adj_high,
      self.adj_low,
      self.adj_close,
      self.adj_volume,
    ]
    .into_iter()
    .all(|v| v.is_none_or(|x| x >= 0.0))
  }
}

/// What `get_prices` returns to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
  pub symbol: String,
  pub provider: ProviderId,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub bars: Vec<Bar>,
  pub from_cache: usize,
  pub from_api: usize,
}

impl ResultBundle {
  /// Invariant from spec §3: `from_cache + from_api == len(bars)`.
  pub fn provenance_is_consistent(&self) -> bool {
    self.from_cache + self.from_api == self.bars.len()
  }
}

/// Tiingo's credential: a single API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiingoCredential {
  pub api_key: String,
}

/// Barchart's session bundle, produced by the external cookie-capture tool
/// and consumed read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarchartSession {
  pub cookie_string: String,
  pub xsrf_token: String,
  pub user_agent: String,
  pub captured_at: DateTime<Utc>,
}

impl BarchartSession {
  /// Cookies older than this are a warning, not a veto, under AUTO
  /// selection (spec §4.5.1).
  pub const STALE_WARNING_AGE: chrono::Duration = chrono::Duration::hours(24);

  pub fn is_likely_stale(&self, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(self.captured_at) > Self::STALE_WARNING_AGE
  }
}

/// Everything the core might need to authenticate against either provider.
/// Opaque to every layer except the specific adapter that uses a given
/// field; presence is validated lazily, only when that provider is
/// actually invoked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialBundle {
  pub tiingo: Option<TiingoCredential>,
  pub barchart: Option<BarchartSession>,
}

impl CredentialBundle {
  /// Whether Barchart's session looks usable: present, full, and not
  /// obviously stale. A non-stale cookie bundle is still only a *candidate*
  /// — the adapter may still see a live 401/403.
  pub fn barchart_looks_valid(&self, now: DateTime<Utc>) -> bool {
    match &self.barchart {
      Some(session) => !session.is_likely_stale(now),
      None => false,
    }
  }
}

/// Validates and uppercase-normalizes a ticker symbol per the adapters'
/// shared contract: `[A-Z0-9.\-]{1,10}`.
pub fn normalize_symbol(raw: &str) -> Result<String> {
  let upper = raw.to_ascii_uppercase();
  if symbol_regex::SYMBOL_PATTERN.is_match(&upper) {
    Ok(upper)
  } else {
    Err(Error::InvalidInput(format!("invalid symbol: {raw:?}")))
  }
}

/// Tiny local stand-in for `once_cell::sync::Lazy` so this crate does not
/// need to add another dependency just to cache a compiled regex.
mod once_cell_fallback {
  use regex::Regex;
  use std::sync::OnceLock;

  static SYMBOL_PATTERN_CELL: OnceLock<Regex> = OnceLock::new();

  pub struct LazyPattern;

  impl std::ops::Deref for LazyPattern {
    type Target = Regex;
    fn deref(&self) -> &Regex {
      SYMBOL_PATTERN_CELL.get_or_init(|| Regex::new(r"^[A-Z0-9.\-]{1,10}$").unwrap())
    }
  }

  pub static SYMBOL_PATTERN: LazyPattern = LazyPattern;
}
