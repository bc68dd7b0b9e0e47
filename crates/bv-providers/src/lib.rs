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

//! Upstream provider adapters. One `ProviderAdapter` implementation per
//! upstream, dispatched by `ProviderId` at the engine boundary — no
//! inheritance, no duck typing.

pub mod barchart;
pub mod tiingo;
pub mod transport;

pub use barchart::BarchartProvider;
pub use tiingo::TiingoProvider;

use async_trait::async_trait;
use bv_core::{Bar, CredentialBundle, Error, Frequency};
use bv_ratelimit::Pacer;
use chrono::NaiveDate;

/// Outcome of one `fetch` call. Credential staleness is a distinguished
/// success-shaped variant, not an error used for control flow, so the
/// engine can switch on it directly and only raise to the caller for
/// unrecovered cases.
pub enum FetchOutcome {
  Fetched(Vec<Bar>),
  CredentialStale,
  Failure(Error),
}

/// Capability every upstream provider implements. Stateless over a
/// shared, per-request credential snapshot.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
  /// Fetches all available bars for `symbol` in `[start, end]`. Fields
  /// the provider does not expose are left null. `pacer` is the engine-
  /// owned pacer for this provider; an adapter that must make more than
  /// one upstream call for a single sub-interval (Barchart's
  /// adjusted/unadjusted pair) uses it to mark the internal calls as
  /// same-symbol. The engine has already paced the sub-interval's first
  /// call before invoking `fetch`.
  async fn fetch(
    &self,
    symbol: &str,
    freq: Frequency,
    start: NaiveDate,
    end: NaiveDate,
    credentials: &CredentialBundle,
    pacer: &dyn Pacer,
  ) -> FetchOutcome;

  /// Cheap, local (no network) check that the credential this provider
  /// needs is present in `credentials`. Returns `Error::CredentialMissing`
  /// naming the field and expected path when absent.
  fn probe_credentials(&self, credentials: &CredentialBundle) -> Result<(), Error>;
}
