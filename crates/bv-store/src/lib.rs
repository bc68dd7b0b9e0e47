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

//! Durable bar persistence on top of SQLite, queried through Diesel.
//!
//! `Store` is synchronous; callers on an async runtime should invoke it via
//! `tokio::task::spawn_blocking`, the same sync-store-from-async-caller
//! shape used elsewhere in this workspace's reference corpus.

pub mod connection;
pub mod models;
pub mod schema;

use std::collections::BTreeSet;

use bv_core::{Bar, Error, Frequency, ProviderId, Result};
use chrono::NaiveDate;
use diesel::prelude::*;
use tracing::instrument;

use connection::{establish_pool, DbPool};
use models::BarRow;
use schema::bars::dsl as bars_dsl;

/// Handle to one bar-store file. Cheaply `Clone`-able: internally an
/// `r2d2::Pool`, which is itself an `Arc`.
#[derive(Clone)]
pub struct Store {
  pool: DbPool,
}

impl Store {
  /// Opens (creating if absent) the store file at `path`. Fails with
  /// `Error::StoreCorruption` if an existing file does not pass
  /// `PRAGMA integrity_check`.
  #[instrument(skip(path))]
  pub fn open(path: &str) -> Result<Self> {
    let pool = establish_pool(path)?;
    Ok(Self { pool })
  }

  /// Opens an in-memory store, used by tests that do not need a file on
  /// disk.
  pub fn open_in_memory() -> Result<Self> {
    Self::open(":memory:")
  }

  fn conn(&self) -> Result<connection::DbConnection> {
    self.pool.get().map_err(|e| Error::Store(format!("failed to acquire connection: {e}")))
  }

  /// Returns bars for the given key whose date falls in `[start, end]`,
  /// ascending by date.
  pub fn read_range(
    &self,
    symbol: &str,
    freq: Frequency,
    provider: ProviderId,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<Bar>> {
    let mut conn = self.conn()?;
    let rows: Vec<BarRow> = bars_dsl::bars
      .filter(bars_dsl::symbol.eq(symbol))
      .filter(bars_dsl::frequency.eq(freq.to_string()))
      .filter(bars_dsl::provider.eq(provider.to_string()))
      .filter(bars_dsl::date.ge(start.format("%Y-%m-%d").to_string()))
      .filter(bars_dsl::date.le(end.format("%Y-%m-%d").to_string()))
      .order(bars_dsl::date.asc())
      .load(&mut conn)
      .map_err(|e| Error::Store(format!("read_range failed: {e}")))?;

    rows.into_iter().map(Bar::try_from).collect()
  }

  /// Returns the sorted set of dates already covered for the given key
  /// within `[start, end]`. Used by the engine before asking the interval
  /// algebra for gaps.
  pub fn covered_dates(
    &self,
    symbol: &str,
    freq: Frequency,
    provider: ProviderId,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<BTreeSet<NaiveDate>> {
    let mut conn = self.conn()?;
    let raw: Vec<String> = bars_dsl::bars
      .select(bars_dsl::date)
      .filter(bars_dsl::symbol.eq(symbol))
      .filter(bars_dsl::frequency.eq(freq.to_string()))
      .filter(bars_dsl::provider.eq(provider.to_string()))
      .filter(bars_dsl::date.ge(start.format("%Y-%m-%d").to_string()))
      .filter(bars_dsl::date.le(end.format("%Y-%m-%d").to_string()))
      .load(&mut conn)
      .map_err(|e| Error::Store(format!("covered_dates failed: {e}")))?;

    raw
      .into_iter()
      .map(|d| {
        NaiveDate::parse_from_str(&d, "%Y-%m-%d")
          .map_err(|e| Error::Store(format!("corrupt date column {d:?}: {e}")))
      })
      .collect()
  }

  /// Inserts-or-replaces `rows` in a single transaction. An empty `rows`
  /// is a no-op. If the transaction fails partway, the store is left
  /// unchanged.
  #[instrument(skip(self, rows), fields(count = rows.len()))]
  pub fn write_range(&self, rows: &[Bar]) -> Result<()> {
    if rows.is_empty() {
      return Ok(());
    }
    let db_rows: Vec<BarRow> = rows.iter().map(BarRow::from).collect();

    let mut conn = self.conn()?;
    conn
      .transaction(|conn| {
        diesel::replace_into(bars_dsl::bars).values(&db_rows).execute(conn)?;
        Ok::<_, diesel::result::Error>(())
      })
      .map_err(|e| Error::Store(format!("write_range failed: {e}")))?;

    Ok(())
  }

  /// Deletes rows matching the optional `symbol`/`provider` filters. With
  /// both `None`, clears the entire store.
  pub fn clear(&self, symbol: Option<&str>, provider: Option<ProviderId>) -> Result<usize> {
    let mut conn = self.conn()?;
    let mut query = diesel::delete(bars_dsl::bars).into_boxed();
    if let Some(s) = symbol {
      query = query.filter(bars_dsl::symbol.eq(s.to_string()));
    }
    if let Some(p) = provider {
      query = query.filter(bars_dsl::provider.eq(p.to_string()));
    }
    query.execute(&mut conn).map_err(|e| Error::Store(format!("clear failed: {e}")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bv_core::ProviderId;
  use chrono::Utc;

  fn bar(symbol: &str, date: NaiveDate, provider: ProviderId) -> Bar {
    Bar {
      symbol: symbol.to_string(),
      date,
      frequency: Frequency::Daily,
      provider,
      open: Some(1.0),
      high: Some(2.0),
      low: Some(0.5),
      close: Some(1.5),
      volume: Some(1_000.0),
      adj_open: None,
      adj_high: None,
      adj_low: None,
      adj_close: None,
      adj_volume: None,
      fetched_at: Utc::now(),
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn write_then_read_round_trips() {
    let store = Store::open_in_memory().unwrap();
    let rows = vec![
      bar("AAPL", date(2024, 1, 2), ProviderId::Tiingo),
      bar("AAPL", date(2024, 1, 3), ProviderId::Tiingo),
    ];
    store.write_range(&rows).unwrap();

    let read = store
      .read_range("AAPL", Frequency::Daily, ProviderId::Tiingo, date(2024, 1, 1), date(2024, 1, 5))
      .unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].date, date(2024, 1, 2));
    assert_eq!(read[1].date, date(2024, 1, 3));
  }

  #[test]
  fn write_range_replaces_on_same_key() {
    let store = Store::open_in_memory().unwrap();
    let mut b = bar("AAPL", date(2024, 1, 2), ProviderId::Tiingo);
    store.write_range(&[b.clone()]).unwrap();

    b.close = Some(99.0);
    store.write_range(&[b]).unwrap();

    let read = store
      .read_range("AAPL", Frequency::Daily, ProviderId::Tiingo, date(2024, 1, 2), date(2024, 1, 2))
      .unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].close, Some(99.0));
  }

  #[test]
  fn covered_dates_reflects_writes_within_range() {
    let store = Store::open_in_memory().unwrap();
    store
      .write_range(&[
        bar("AAPL", date(2024, 1, 2), ProviderId::Tiingo),
        bar("AAPL", date(2024, 1, 5), ProviderId::Tiingo),
      ])
      .unwrap();

    let covered = store
      .covered_dates("AAPL", Frequency::Daily, ProviderId::Tiingo, date(2024, 1, 1), date(2024, 1, 10))
      .unwrap();
    assert_eq!(covered, [date(2024, 1, 2), date(2024, 1, 5)].into_iter().collect());
  }

  #[test]
  fn clear_with_no_filters_empties_the_store() {
    let store = Store::open_in_memory().unwrap();
    store.write_range(&[bar("AAPL", date(2024, 1, 2), ProviderId::Tiingo)]).unwrap();
    let deleted = store.clear(None, None).unwrap();
    assert_eq!(deleted, 1);
    let covered = store
      .covered_dates("AAPL", Frequency::Daily, ProviderId::Tiingo, date(2024, 1, 1), date(2024, 1, 10))
      .unwrap();
    assert!(covered.is_empty());
  }

  #[test]
  fn clear_filters_by_symbol() {
    let store = Store::open_in_memory().unwrap();
    store
      .write_range(&[
        bar("AAPL", date(2024, 1, 2), ProviderId::Tiingo),
        bar("MSFT", date(2024, 1, 2), ProviderId::Tiingo),
      ])
      .unwrap();
    store.clear(Some("AAPL"), None).unwrap();

    let aapl = store
      .covered_dates("AAPL", Frequency::Daily, ProviderId::Tiingo, date(2024, 1, 1), date(2024, 1, 10))
      .unwrap();
    let msft = store
      .covered_dates("MSFT", Frequency::Daily, ProviderId::Tiingo, date(2024, 1, 1), date(2024, 1, 10))
      .unwrap();
    assert!(aapl.is_empty());
    assert_eq!(msft.len(), 1);
  }

  #[test]
  fn different_providers_do_not_collide() {
    let store = Store::open_in_memory().unwrap();
    store
      .write_range(&[
        bar("AAPL", date(2024, 1, 2), ProviderId::Tiingo),
        bar("AAPL", date(2024, 1, 2), ProviderId::Barchart),
      ])
      .unwrap();

    let tiingo = store
      .read_range("AAPL", Frequency::Daily, ProviderId::Tiingo, date(2024, 1, 2), date(2024, 1, 2))
      .unwrap();
    let barchart = store
      .read_range("AAPL", Frequency::Daily, ProviderId::Barchart, date(2024, 1, 2), date(2024, 1, 2))
      .unwrap();
    assert_eq!(tiingo.len(), 1);
    assert_eq!(barchart.len(), 1);
  }
}
