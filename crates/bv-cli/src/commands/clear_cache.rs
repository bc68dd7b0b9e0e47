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
use bv_core::Config;
use bv_store::Store;
use clap::Args;

use super::ProviderArg;

#[derive(Args, Debug)]
pub struct ClearCacheArgs {
  /// Restrict deletion to this symbol.
  #[arg(long)]
  symbol: Option<String>,

  /// Restrict deletion to this provider.
  #[arg(long, value_enum)]
  provider: Option<ProviderArg>,
}

pub fn execute(args: ClearCacheArgs, config: &Config) -> Result<()> {
  let store = Store::open(config.db_path.to_string_lossy().as_ref())
    .with_context(|| format!("opening bar store at {}", config.db_path.display()))?;

  let provider = args.provider.and_then(ProviderArg::into_provider_id);
  let deleted = store.clear(args.symbol.as_deref(), provider)?;
  println!("cleared {deleted} cached bar(s)");

  Ok(())
}
