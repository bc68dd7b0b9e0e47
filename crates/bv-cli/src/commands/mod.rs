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

pub mod clear_cache;
pub mod get_prices;

use bv_core::ProviderId;
use clap::ValueEnum;

/// CLI-facing provider selector; `Auto` maps to `ProviderSelection::Auto`,
/// the explicit variants to `ProviderSelection::Explicit`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProviderArg {
  Auto,
  Barchart,
  Tiingo,
}

impl std::fmt::Display for ProviderArg {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ProviderArg::Auto => write!(f, "auto"),
      ProviderArg::Barchart => write!(f, "barchart"),
      ProviderArg::Tiingo => write!(f, "tiingo"),
    }
  }
}

impl ProviderArg {
  pub fn into_provider_id(self) -> Option<ProviderId> {
    match self {
      ProviderArg::Auto => None,
      ProviderArg::Barchart => Some(ProviderId::Barchart),
      ProviderArg::Tiingo => Some(ProviderId::Tiingo),
    }
  }
}
