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

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default path for the SQLite bar store, relative to the current
/// directory, when `BARVAULT_DB_PATH` is unset.
const DEFAULT_DB_PATH: &str = "barvault.sqlite3";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF_BASE_MS: u64 = 1000;
const DEFAULT_RETRY_BACKOFF_CAP_MS: u64 = 10_000;
const DEFAULT_TIINGO_RPM_WARN_THRESHOLD: u32 = 50;
const DEFAULT_BARCHART_INTER_REQUEST_DELAY_SECS: u64 = 2;
const DEFAULT_BARCHART_LONG_PAUSE_EVERY_N: u32 = 10;
const DEFAULT_BARCHART_LONG_PAUSE_SECS: u64 = 30;

/// Runtime configuration for the retrieval engine and its providers.
///
/// Mirrors the teacher's `Config::from_env` pattern: every field has a
/// sensible default and can be overridden by an environment variable,
/// loaded via `dotenvy` when a `.env` file is present.
#[derive(Debug, Clone)]
pub struct Config {
  /// Path to the SQLite bar store file.
  pub db_path: PathBuf,
  /// Directory holding provider credential files (Tiingo token, Barchart
  /// session bundle).
  pub config_dir: PathBuf,
  pub http_timeout: Duration,
  pub retry_attempts: u32,
  pub retry_backoff_base: Duration,
  pub retry_backoff_cap: Duration,
  /// Tiingo requests-per-minute threshold above which the pacer logs a
  /// warning before it would actually block.
  pub tiingo_rpm_warn_threshold: u32,
  /// Minimum delay between calls to *different* Barchart symbols.
  pub barchart_inter_request_delay: Duration,
  /// After this many distinct symbols, Barchart pacing inserts a long pause.
  pub barchart_long_pause_every_n: u32,
  pub barchart_long_pause: Duration,
}

impl Config {
  /// Builds a `Config` purely from defaults, no environment access. Used
  /// by tests and by callers that build configuration programmatically.
  pub fn defaults() -> Self {
    Self {
      db_path: PathBuf::from(DEFAULT_DB_PATH),
      config_dir: default_config_dir(),
      http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
      retry_attempts: DEFAULT_RETRY_ATTEMPTS,
      retry_backoff_base: Duration::from_millis(DEFAULT_RETRY_BACKOFF_BASE_MS),
      retry_backoff_cap: Duration::from_millis(DEFAULT_RETRY_BACKOFF_CAP_MS),
      tiingo_rpm_warn_threshold: DEFAULT_TIINGO_RPM_WARN_THRESHOLD,
      barchart_inter_request_delay: Duration::from_secs(DEFAULT_BARCHART_INTER_REQUEST_DELAY_SECS),
      barchart_long_pause_every_n: DEFAULT_BARCHART_LONG_PAUSE_EVERY_N,
      barchart_long_pause: Duration::from_secs(DEFAULT_BARCHART_LONG_PAUSE_SECS),
    }
  }

  /// Loads configuration from the environment, reading a `.env` file first
  /// if one is present. Every `BARVAULT_*` variable is optional; an unset
  /// or empty value falls back to the compiled-in default. A value that is
  /// set but fails to parse is a hard `Error::Config`.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();

    let mut config = Self::defaults();

    if let Some(v) = read_var("BARVAULT_DB_PATH")? {
      config.db_path = PathBuf::from(v);
    }
    if let Some(v) = read_var("BARVAULT_CONFIG_DIR")? {
      config.config_dir = PathBuf::from(v);
    }
    if let Some(v) = read_duration_secs("BARVAULT_HTTP_TIMEOUT_SECS")? {
      config.http_timeout = v;
    }
    if let Some(v) = read_parsed::<u32>("BARVAULT_RETRY_ATTEMPTS")? {
      config.retry_attempts = v;
    }
    if let Some(v) = read_duration_ms("BARVAULT_RETRY_BACKOFF_BASE_MS")? {
      config.retry_backoff_base = v;
    }
    if let Some(v) = read_duration_ms("BARVAULT_RETRY_BACKOFF_CAP_MS")? {
      config.retry_backoff_cap = v;
    }
    if let Some(v) = read_parsed::<u32>("BARVAULT_TIINGO_RPM_WARN_THRESHOLD")? {
      config.tiingo_rpm_warn_threshold = v;
    }
    if let Some(v) = read_duration_secs("BARVAULT_BARCHART_INTER_REQUEST_DELAY_SECS")? {
      config.barchart_inter_request_delay = v;
    }
    if let Some(v) = read_parsed::<u32>("BARVAULT_BARCHART_LONG_PAUSE_EVERY_N")? {
      config.barchart_long_pause_every_n = v;
    }
    if let Some(v) = read_duration_secs("BARVAULT_BARCHART_LONG_PAUSE_SECS")? {
      config.barchart_long_pause = v;
    }

    Ok(config)
  }
}

fn default_config_dir() -> PathBuf {
  dirs_fallback::home_dir()
    .map(|home| home.join(".config").join("barvault"))
    .unwrap_or_else(|| PathBuf::from(".barvault"))
}

fn read_var(name: &str) -> Result<Option<String>> {
  match env::var(name) {
    Ok(v) if v.trim().is_empty() => Ok(None),
    Ok(v) => Ok(Some(v)),
    Err(env::VarError::NotPresent) => Ok(None),
    Err(e) => Err(Error::EnvVar(e)),
  }
}

fn read_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
  match read_var(name)? {
    Some(v) => v
      .parse::<T>()
      .map(Some)
      .map_err(|_| Error::Config(format!("{name} is not a valid number: {v:?}"))),
    None => Ok(None),
  }
}

fn read_duration_secs(name: &str) -> Result<Option<Duration>> {
  Ok(read_parsed::<u64>(name)?.map(Duration::from_secs))
}

fn read_duration_ms(name: &str) -> Result<Option<Duration>> {
  Ok(read_parsed::<u64>(name)?.map(Duration::from_millis))
}

/// Minimal home-directory lookup so this crate does not pull in the `dirs`
/// crate just for one path. `HOME` (or `USERPROFILE` on Windows) covers
/// every platform this engine targets.
mod dirs_fallback {
  use std::path::PathBuf;

  pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
      .or_else(|| std::env::var_os("USERPROFILE"))
      .map(PathBuf::from)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_internally_consistent() {
    let config = Config::defaults();
    assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    assert_eq!(config.retry_attempts, 3);
    assert!(config.barchart_inter_request_delay < config.barchart_long_pause);
  }

  #[test]
  fn read_parsed_rejects_garbage() {
    std::env::set_var("BARVAULT_TEST_GARBAGE_VALUE", "not-a-number");
    let result = read_parsed::<u32>("BARVAULT_TEST_GARBAGE_VALUE");
    std::env::remove_var("BARVAULT_TEST_GARBAGE_VALUE");
    assert!(result.is_err());
  }

  #[test]
  fn read_parsed_treats_blank_as_unset() {
    std::env::set_var("BARVAULT_TEST_BLANK_VALUE", "   ");
    let result = read_parsed::<u32>("BARVAULT_TEST_BLANK_VALUE").unwrap();
    std::env::remove_var("BARVAULT_TEST_BLANK_VALUE");
    assert_eq!(result, None);
  }
}
