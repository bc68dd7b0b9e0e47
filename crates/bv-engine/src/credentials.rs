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

use std::path::{Path, PathBuf};

use bv_core::{BarchartSession, CredentialBundle, Error, Result, TiingoCredential};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize, Default)]
struct CredentialsFile {
  tiingo_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BarchartCookiesFile {
  cookie_string: String,
  xsrf_token: String,
  user_agent: String,
  captured_at: DateTime<Utc>,
}

/// Reads the two credential files the core consumes read-only:
/// `credentials.json` (Tiingo token) and `barchart_cookies.json`
/// (Barchart session bundle, produced by the external cookie-capture
/// collaborator). Re-read fresh on every `get_prices` call so a refreshed
/// cookie file is picked up without restarting the process.
pub struct CredentialLoader {
  config_dir: PathBuf,
}

impl CredentialLoader {
  pub fn new(config_dir: impl Into<PathBuf>) -> Self {
    Self { config_dir: config_dir.into() }
  }

  #[instrument(skip(self))]
  pub fn load(&self) -> Result<CredentialBundle> {
    let tiingo = self.load_tiingo()?;
    let barchart = self.load_barchart()?;
    Ok(CredentialBundle { tiingo, barchart })
  }

  fn load_tiingo(&self) -> Result<Option<TiingoCredential>> {
    let path = self.config_dir.join("credentials.json");
    let Some(text) = read_optional(&path)? else { return Ok(None) };
    let file: CredentialsFile = serde_json::from_str(&text)?;
    Ok(file.tiingo_api_key.filter(|k| !k.is_empty()).map(|api_key| TiingoCredential { api_key }))
  }

  fn load_barchart(&self) -> Result<Option<BarchartSession>> {
    let path = self.config_dir.join("barchart_cookies.json");
    let Some(text) = read_optional(&path)? else { return Ok(None) };
    let file: BarchartCookiesFile = serde_json::from_str(&text)?;
    Ok(Some(BarchartSession {
      cookie_string: file.cookie_string,
      xsrf_token: file.xsrf_token,
      user_agent: file.user_agent,
      captured_at: file.captured_at,
    }))
  }
}

/// Reads a file's contents, treating "does not exist" as `None` rather
/// than an error — a caller without Barchart credentials configured is
/// expected to only ever select Tiingo, or vice versa.
fn read_optional(path: &Path) -> Result<Option<String>> {
  match std::fs::read_to_string(path) {
    Ok(text) => Ok(Some(text)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(Error::Io(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_files_yield_empty_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CredentialLoader::new(dir.path());
    let bundle = loader.load().unwrap();
    assert!(bundle.tiingo.is_none());
    assert!(bundle.barchart.is_none());
  }

  #[test]
  fn reads_tiingo_key_when_present() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("credentials.json"), r#"{"tiingo_api_key": "abc"}"#).unwrap();
    let loader = CredentialLoader::new(dir.path());
    let bundle = loader.load().unwrap();
    assert_eq!(bundle.tiingo.unwrap().api_key, "abc");
  }

  #[test]
  fn reads_barchart_session_when_present() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
      dir.path().join("barchart_cookies.json"),
      r#"{"cookie_string": "c", "xsrf_token": "x", "user_agent": "ua", "captured_at": "2024-01-01T00:00:00Z"}"#,
    )
    .unwrap();
    let loader = CredentialLoader::new(dir.path());
    let bundle = loader.load().unwrap();
    assert_eq!(bundle.barchart.unwrap().cookie_string, "c");
  }
}
