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

use std::collections::BTreeMap;

use bv_core::{Bar, ProviderId};
use chrono::NaiveDate;

/// Merges ordered bar batches into one date-ascending series.
///
/// Two rules apply when more than one batch covers the same date:
/// - same provider on both sides: the bar with the later `fetched_at` wins
///   (a fresh fetch supersedes a stale cache row for that key);
/// - different providers: Barchart wins over Tiingo regardless of
///   `fetched_at`, since an AUTO fallback only ever hands a date to Tiingo
///   because Barchart could not serve it.
///
/// Batch order does not matter for correctness, only for which bar a tie
/// is attributed to in logs; callers pass cache-then-fetch by convention.
pub fn assemble(batches: impl IntoIterator<Item = Vec<Bar>>) -> Vec<Bar> {
  let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();

  for batch in batches {
    for bar in batch {
      match by_date.get(&bar.date) {
        None => {
          by_date.insert(bar.date, bar);
        }
        Some(existing) if existing.provider == bar.provider => {
          if bar.fetched_at > existing.fetched_at {
            by_date.insert(bar.date, bar);
          }
        }
        Some(existing) => {
          if bar.provider == ProviderId::Barchart && existing.provider != ProviderId::Barchart {
            by_date.insert(bar.date, bar);
          }
        }
      }
    }
  }

  by_date.into_values().collect()
}

/// The provider credited for a batch of freshly fetched bars: whichever
/// provider served the majority, ties broken toward Tiingo (spec
/// §4.5.2). Returns `None` for an empty slice — callers fall back to the
/// request's originally chosen provider in that case.
pub fn majority_provider(bars: &[Bar]) -> Option<ProviderId> {
  if bars.is_empty() {
    return None;
  }
  let barchart_count = bars.iter().filter(|b| b.provider == ProviderId::Barchart).count();
  let tiingo_count = bars.len() - barchart_count;
  Some(if barchart_count > tiingo_count { ProviderId::Barchart } else { ProviderId::Tiingo })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  fn bar(date: NaiveDate, provider: ProviderId, fetched_at_hour: u32) -> Bar {
    Bar {
      symbol: "AAPL".to_string(),
      date,
      frequency: bv_core::Frequency::Daily,
      provider,
      open: Some(1.0),
      high: Some(1.0),
      low: Some(1.0),
      close: Some(1.0),
      volume: Some(1.0),
      adj_open: None,
      adj_high: None,
      adj_low: None,
      adj_close: None,
      adj_volume: None,
      fetched_at: Utc.with_ymd_and_hms(2024, 1, 1, fetched_at_hour, 0, 0).unwrap(),
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn disjoint_batches_concatenate_in_date_order() {
    let a = vec![bar(date(2024, 1, 1), ProviderId::Tiingo, 0)];
    let b = vec![bar(date(2024, 1, 2), ProviderId::Tiingo, 0)];
    let merged = assemble([a, b]);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].date, date(2024, 1, 1));
    assert_eq!(merged[1].date, date(2024, 1, 2));
  }

  #[test]
  fn same_provider_collision_keeps_the_fresher_fetch() {
    let stale = vec![bar(date(2024, 1, 1), ProviderId::Tiingo, 1)];
    let fresh = vec![bar(date(2024, 1, 1), ProviderId::Tiingo, 5)];
    let merged = assemble([stale, fresh]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].fetched_at.hour(), 5);
  }

  use chrono::Timelike;

  #[test]
  fn cross_provider_collision_prefers_barchart_regardless_of_order() {
    let tiingo_first = vec![bar(date(2024, 1, 1), ProviderId::Tiingo, 9)];
    let barchart_second = vec![bar(date(2024, 1, 1), ProviderId::Barchart, 1)];
    let merged = assemble([tiingo_first, barchart_second]);
    assert_eq!(merged[0].provider, ProviderId::Barchart);

    let barchart_first = vec![bar(date(2024, 1, 1), ProviderId::Barchart, 1)];
    let tiingo_second = vec![bar(date(2024, 1, 1), ProviderId::Tiingo, 9)];
    let merged = assemble([barchart_first, tiingo_second]);
    assert_eq!(merged[0].provider, ProviderId::Barchart);
  }

  #[test]
  fn majority_provider_ties_break_to_tiingo() {
    let bars = vec![
      bar(date(2024, 1, 1), ProviderId::Barchart, 0),
      bar(date(2024, 1, 2), ProviderId::Tiingo, 0),
    ];
    assert_eq!(majority_provider(&bars), Some(ProviderId::Tiingo));
  }

  #[test]
  fn majority_provider_is_none_for_empty_input() {
    assert_eq!(majority_provider(&[]), None);
  }
}
