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

use anyhow::{Context, Result};
use bv_core::{Config, Frequency, ProviderSelection};
use bv_engine::Engine;
use bv_store::Store;
use chrono::NaiveDate;
use clap::Args;

use super::ProviderArg;

#[derive(Args, Debug)]
pub struct GetPricesArgs {
  /// Ticker symbol, e.g. AAPL.
  symbol: String,

  /// Start date, inclusive, YYYY-MM-DD.
  #[arg(long)]
  start: NaiveDate,

  /// End date, inclusive, YYYY-MM-DD.
  #[arg(long)]
  end: NaiveDate,

  /// Which upstream provider to use.
  #[arg(long, value_enum, default_value_t = ProviderArg::Auto)]
  provider: ProviderArg,

  /// Re-fetch the entire range instead of trusting the cache.
  #[arg(long)]
  refresh: bool,

  /// Print the result as JSON instead of a plain table.
  #[arg(long)]
  json: bool,
}

pub async fn execute(args: GetPricesArgs, config: &Config) -> Result<()> {
  let store = Store::open(config.db_path.to_string_lossy().as_ref())
    .with_context(|| format!("opening bar store at {}", config.db_path.display()))?;
  let engine = Engine::from_config(store, config).context("building retrieval engine")?;

  let selection = match args.provider.into_provider_id() {
    Some(id) => ProviderSelection::Explicit(id),
    None => ProviderSelection::Auto,
  };

  let result = engine
    .get_prices(&args.symbol, args.start, args.end, Frequency::Daily, selection, args.refresh, None)
    .await
    .context("get_prices failed")?;

  if args.json {
    println!("{}", serde_json::to_string_pretty(&result)?);
  } else {
    println!(
      "{} {}..{} ({} provider, {} from cache, {} from api)",
      result.symbol, result.start, result.end, result.provider, result.from_cache, result.from_api
    );
    for bar in &result.bars {
      println!(
        "{date}  open={open:?} high={high:?} low={low:?} close={close:?} volume={volume:?}",
        date = bar.date,
        open = bar.open,
        high = bar.high,
        low = bar.low,
        close = bar.close,
        volume = bar.volume,
      );
    }
  }

  Ok(())
}
