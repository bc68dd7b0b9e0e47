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

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use bv_core::{
  Bar, Config, CredentialBundle, Error, Frequency, ProviderId, ProviderSelection, Result, ResultBundle,
};
use bv_interval::{missing, DateInterval};
use bv_providers::{BarchartProvider, FetchOutcome, ProviderAdapter, TiingoProvider};
use bv_ratelimit::{BarchartPacer, Pacer, TiingoPacer};
use bv_store::Store;
use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::assembler::{assemble, majority_provider};
use crate::credentials::CredentialLoader;
use crate::validate::validate_request;

/// The cache-first retrieval orchestrator. Owns the store, both provider
/// adapters, and both pacers for the lifetime of the process; credentials
/// are re-read from disk on every call so a refreshed Barchart cookie
/// file takes effect without a restart.
pub struct Engine {
  store: Store,
  credential_loader: CredentialLoader,
  barchart_provider: Arc<dyn ProviderAdapter>,
  tiingo_provider: Arc<dyn ProviderAdapter>,
  barchart_pacer: Arc<BarchartPacer>,
  tiingo_pacer: Arc<TiingoPacer>,
  /// Distinct symbols this engine has ever paced, per provider. A symbol's
  /// first call to a given provider is a "new symbol" call; every
  /// subsequent one (across any number of `get_prices` calls) is a
  /// "same symbol" call, per the Rate Limiter's process-lifetime state.
  seen_symbols: Mutex<HashSet<(ProviderId, String)>>,
}

impl Engine {
  pub fn new(
    store: Store,
    config: &Config,
    barchart_provider: Arc<dyn ProviderAdapter>,
    tiingo_provider: Arc<dyn ProviderAdapter>,
  ) -> Self {
    let barchart_pacer = Arc::new(BarchartPacer::new(
      config.barchart_inter_request_delay,
      config.barchart_long_pause_every_n,
      config.barchart_long_pause,
    ));
    // No fixed Tiingo tier is assumed; the quota itself is derived from the
    // configured warn threshold so the warning fires with headroom before
    // the pacer actually starts blocking.
    let rpm_quota = config.tiingo_rpm_warn_threshold.saturating_mul(2).max(1);
    let tiingo_pacer = Arc::new(TiingoPacer::new(rpm_quota, config.tiingo_rpm_warn_threshold));

    Self {
      store,
      credential_loader: CredentialLoader::new(config.config_dir.clone()),
      barchart_provider,
      tiingo_provider,
      barchart_pacer,
      tiingo_pacer,
      seen_symbols: Mutex::new(HashSet::new()),
    }
  }

  /// Builds an `Engine` wired to the real HTTP-backed adapters, per
  /// `Config`'s timeout/retry settings.
  pub fn from_config(store: Store, config: &Config) -> Result<Self> {
    let barchart = BarchartProvider::new(
      config.http_timeout,
      config.retry_attempts,
      config.retry_backoff_base,
      config.retry_backoff_cap,
    )?;
    let tiingo = TiingoProvider::new(
      config.http_timeout,
      config.retry_attempts,
      config.retry_backoff_base,
      config.retry_backoff_cap,
    )?;
    Ok(Self::new(store, config, Arc::new(barchart), Arc::new(tiingo)))
  }

  fn provider_adapter(&self, provider: ProviderId) -> &Arc<dyn ProviderAdapter> {
    match provider {
      ProviderId::Barchart => &self.barchart_provider,
      ProviderId::Tiingo => &self.tiingo_provider,
    }
  }

  fn pacer(&self, provider: ProviderId) -> &dyn Pacer {
    match provider {
      ProviderId::Barchart => self.barchart_pacer.as_ref(),
      ProviderId::Tiingo => self.tiingo_pacer.as_ref(),
    }
  }

  /// Picks the provider a sub-interval's first call is paced as: "new"
  /// the first time this engine has ever touched `(provider, symbol)`,
  /// "same" every time after.
  async fn pace_for_symbol(&self, provider: ProviderId, symbol: &str) {
    let is_first = {
      let mut seen = self.seen_symbols.lock().unwrap();
      seen.insert((provider, symbol.to_string()))
    };
    if is_first {
      self.pacer(provider).note_new_symbol_call().await;
    } else {
      self.pacer(provider).note_same_symbol_call().await;
    }
  }

  /// Resolves the initial provider for a request, per spec §4.5.1: an
  /// explicit selection is used as-is; AUTO prefers Barchart unless its
  /// session is missing or looks stale, in which case it starts on Tiingo.
  fn choose_initial_provider(selection: ProviderSelection, credentials: &CredentialBundle, now: DateTime<Utc>) -> ProviderId {
    match selection {
      ProviderSelection::Explicit(p) => p,
      ProviderSelection::Auto => {
        if credentials.barchart_looks_valid(now) {
          ProviderId::Barchart
        } else {
          ProviderId::Tiingo
        }
      }
    }
  }

  /// Cache-first retrieval of daily bars for `symbol` in `[start, end]`.
  ///
  /// `refresh` skips the cache lookup entirely and re-fetches the whole
  /// range. `cancel`, if given, is checked between sub-intervals and is
  /// cooperative: a fetch already in flight always completes.
  #[instrument(skip(self, cancel), fields(symbol))]
  pub async fn get_prices(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
    selection: ProviderSelection,
    refresh: bool,
    cancel: Option<CancellationToken>,
  ) -> Result<ResultBundle> {
    let request_start = Utc::now();
    let req = validate_request(symbol, frequency, start, end, request_start)?;
    let requested = DateInterval::checked_new(req.start, req.end)
      .expect("validate_request guarantees start <= end");

    let credentials = self.credential_loader.load()?;
    let initial_provider = Self::choose_initial_provider(selection, &credentials, request_start);

    self.provider_adapter(initial_provider).probe_credentials(&credentials)?;

    let gaps = if refresh {
      vec![requested]
    } else {
      let covered =
        self.store.covered_dates(&req.symbol, req.frequency, initial_provider, req.start, req.end)?;
      missing(requested, &covered)
    };

    let mut current_provider = initial_provider;

    for gap in gaps {
      if let Some(token) = &cancel {
        if token.is_cancelled() {
          return Err(Error::Cancelled);
        }
      }

      self.pace_for_symbol(current_provider, &req.symbol).await;

      let outcome = self
        .provider_adapter(current_provider)
        .fetch(&req.symbol, req.frequency, gap.start(), gap.end(), &credentials, self.pacer(current_provider))
        .await;

      match outcome {
        FetchOutcome::Fetched(bars) => {
          self.store.write_range(&bars)?;
        }
        FetchOutcome::CredentialStale => {
          if matches!(selection, ProviderSelection::Auto) && current_provider == ProviderId::Barchart {
            warn!(symbol = %req.symbol, "barchart credential stale mid-request, falling back to tiingo");
            current_provider = ProviderId::Tiingo;
            self.provider_adapter(current_provider).probe_credentials(&credentials)?;
            self.pace_for_symbol(current_provider, &req.symbol).await;

            let fallback_outcome = self
              .provider_adapter(current_provider)
              .fetch(&req.symbol, req.frequency, gap.start(), gap.end(), &credentials, self.pacer(current_provider))
              .await;

            match fallback_outcome {
              FetchOutcome::Fetched(bars) => {
                self.store.write_range(&bars)?;
              }
              FetchOutcome::CredentialStale => {
                return Err(Error::CredentialStale { provider: current_provider });
              }
              FetchOutcome::Failure(e) => return Err(e),
            }
          } else {
            return Err(Error::CredentialStale { provider: current_provider });
          }
        }
        FetchOutcome::Failure(e) => return Err(e),
      }
    }

    // Read back every provider this request could plausibly have rows
    // under: the one it started on (which may already hold cache rows from
    // an earlier request) and the one it ended on (which may differ under
    // an AUTO credential-stale fallback). Reading only the providers this
    // request actually fetched *from* would drop pre-existing cached rows
    // left under the initial provider when a fallback moved the rest of the
    // range onto the other one.
    let bars = if initial_provider == current_provider {
      self.store.read_range(&req.symbol, req.frequency, initial_provider, req.start, req.end)?
    } else {
      let batches: Vec<Vec<Bar>> = [initial_provider, current_provider]
        .into_iter()
        .map(|p| self.store.read_range(&req.symbol, req.frequency, p, req.start, req.end))
        .collect::<Result<Vec<_>>>()?;
      assemble(batches)
    };

    let (from_cache, from_api): (Vec<&Bar>, Vec<&Bar>) =
      bars.iter().partition(|b| b.fetched_at < request_start);
    let fetched_bars: Vec<Bar> = from_api.iter().map(|b| (*b).clone()).collect();
    let result_provider = majority_provider(&fetched_bars).unwrap_or(initial_provider);

    info!(
      symbol = %req.symbol, from_cache = from_cache.len(), from_api = from_api.len(),
      provider = %result_provider, "get_prices complete"
    );

    let from_cache_count = from_cache.len();
    let from_api_count = from_api.len();

    Ok(ResultBundle {
      symbol: req.symbol,
      provider: result_provider,
      start: req.start,
      end: req.end,
      bars,
      from_cache: from_cache_count,
      from_api: from_api_count,
    })
  }

  /// Clears cached bars. A thin pass-through to the store, kept on the
  /// engine so callers never need to reach into `bv-store` directly.
  pub fn clear_cache(&self, symbol: Option<&str>, provider: Option<ProviderId>) -> Result<usize> {
    self.store.clear(symbol, provider)
  }
}
