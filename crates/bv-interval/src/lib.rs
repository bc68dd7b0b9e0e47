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

//! Pure date-interval algebra: no I/O, no allocation beyond the returned
//! vectors, fully exercised by property tests. This is the only module in
//! the workspace that does not depend on `bv-core`.

use std::collections::BTreeSet;

use chrono::NaiveDate;

/// A closed, inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateInterval {
  start: NaiveDate,
  end: NaiveDate,
}

impl DateInterval {
  /// Builds an interval, rejecting `start > end`.
  pub fn checked_new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
    if start <= end {
      Some(Self { start, end })
    } else {
      None
    }
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  pub fn end(&self) -> NaiveDate {
    self.end
  }

  /// Number of calendar days spanned, inclusive of both endpoints.
  pub fn len_days(&self) -> i64 {
    (self.end - self.start).num_days() + 1
  }

  fn contains(&self, date: NaiveDate) -> bool {
    date >= self.start && date <= self.end
  }

  fn overlaps_or_touches(&self, other: &DateInterval) -> bool {
    let one_day = chrono::Duration::days(1);
    self.start <= other.end + one_day && other.start <= self.end + one_day
  }
}

impl std::fmt::Display for DateInterval {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{}, {}]", self.start, self.end)
  }
}

/// Merges a set of intervals into the minimal sorted, non-overlapping,
/// non-touching cover of the same date set. Adjacent intervals (e.g.
/// `[1,2]` and `[3,4]`) are merged into one since there is no calendar gap
/// between them.
pub fn union(intervals: &[DateInterval]) -> Vec<DateInterval> {
  if intervals.is_empty() {
    return Vec::new();
  }
  let mut sorted: Vec<DateInterval> = intervals.to_vec();
  sorted.sort_by_key(|iv| iv.start);

  let mut merged: Vec<DateInterval> = Vec::with_capacity(sorted.len());
  for iv in sorted {
    match merged.last_mut() {
      Some(last) if last.overlaps_or_touches(&iv) => {
        if iv.end > last.end {
          last.end = iv.end;
        }
      }
      _ => merged.push(iv),
    }
  }
  merged
}

/// Subtracts a set of intervals `subtrahend` from `minuend`, returning the
/// maximal sorted list of closed sub-intervals of `minuend` not covered by
/// any interval in `subtrahend`.
pub fn subtract(minuend: DateInterval, subtrahend: &[DateInterval]) -> Vec<DateInterval> {
  let cover = union(subtrahend);
  let mut result = Vec::new();
  let mut cursor = minuend.start;

  for hole in &cover {
    if hole.end < minuend.start || hole.start > minuend.end {
      continue;
    }
    if hole.start > cursor {
      let gap_end = hole.start - chrono::Duration::days(1);
      if let Some(gap) = DateInterval::checked_new(cursor, gap_end.min(minuend.end)) {
        result.push(gap);
      }
    }
    if hole.end >= cursor {
      cursor = hole.end + chrono::Duration::days(1);
    }
    if cursor > minuend.end {
      break;
    }
  }

  if cursor <= minuend.end {
    if let Some(tail) = DateInterval::checked_new(cursor, minuend.end) {
      result.push(tail);
    }
  }

  result
}

/// Given a requested closed interval `requested` and the set of dates
/// already covered within it, returns the minimal, maximal-length, sorted,
/// non-overlapping list of closed sub-intervals of `requested` not covered
/// by `covered`.
///
/// Returns `[]` when `covered` contains every date in `requested`; returns
/// `[requested]` when `covered` is empty.
pub fn missing(requested: DateInterval, covered: &BTreeSet<NaiveDate>) -> Vec<DateInterval> {
  if covered.is_empty() {
    return vec![requested];
  }

  let covered_intervals: Vec<DateInterval> = covered
    .iter()
    .filter(|d| requested.contains(**d))
    .map(|d| DateInterval { start: *d, end: *d })
    .collect();

  subtract(requested, &covered_intervals)
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn iv(y1: i32, m1: u32, d1: u32, y2: i32, m2: u32, d2: u32) -> DateInterval {
    DateInterval::checked_new(date(y1, m1, d1), date(y2, m2, d2)).unwrap()
  }

  #[test]
  fn checked_new_rejects_reversed_range() {
    assert!(DateInterval::checked_new(date(2024, 1, 5), date(2024, 1, 1)).is_none());
  }

  #[test]
  fn missing_with_empty_cover_returns_whole_range() {
    let r = iv(2024, 1, 1, 2024, 1, 10);
    assert_eq!(missing(r, &BTreeSet::new()), vec![r]);
  }

  #[test]
  fn missing_with_full_cover_returns_empty() {
    let r = iv(2024, 1, 1, 2024, 1, 3);
    let covered: BTreeSet<NaiveDate> =
      [date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)].into_iter().collect();
    assert_eq!(missing(r, &covered), Vec::new());
  }

  #[test]
  fn missing_emits_single_interior_gap() {
    let r = iv(2024, 1, 2, 2024, 1, 5);
    let covered: BTreeSet<NaiveDate> = [date(2024, 1, 2), date(2024, 1, 5)].into_iter().collect();
    let result = missing(r, &covered);
    assert_eq!(result, vec![iv(2024, 1, 3, 2024, 1, 4)]);
  }

  #[test]
  fn missing_emits_leading_and_trailing_gaps() {
    let r = iv(2024, 1, 1, 2024, 1, 10);
    let covered: BTreeSet<NaiveDate> = [date(2024, 1, 5)].into_iter().collect();
    let result = missing(r, &covered);
    assert_eq!(result, vec![iv(2024, 1, 1, 2024, 1, 4), iv(2024, 1, 6, 2024, 1, 10)]);
  }

  #[test]
  fn union_merges_adjacent_intervals() {
    let merged = union(&[iv(2024, 1, 1, 2024, 1, 2), iv(2024, 1, 3, 2024, 1, 4)]);
    assert_eq!(merged, vec![iv(2024, 1, 1, 2024, 1, 4)]);
  }

  #[test]
  fn union_keeps_disjoint_intervals_separate() {
    let merged = union(&[iv(2024, 1, 1, 2024, 1, 2), iv(2024, 1, 10, 2024, 1, 12)]);
    assert_eq!(merged, vec![iv(2024, 1, 1, 2024, 1, 2), iv(2024, 1, 10, 2024, 1, 12)]);
  }

  #[test]
  fn subtract_whole_range_returns_empty() {
    let r = iv(2024, 1, 1, 2024, 1, 10);
    assert_eq!(subtract(r, &[r]), Vec::new());
  }

  #[test]
  fn subtract_disjoint_range_returns_original() {
    let r = iv(2024, 1, 1, 2024, 1, 10);
    let other = iv(2024, 2, 1, 2024, 2, 5);
    assert_eq!(subtract(r, &[other]), vec![r]);
  }

  fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2026, 1u32..=12, 1u32..=28)
      .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
  }

  proptest! {
    /// `missing` never returns overlapping or unsorted sub-intervals, and
    /// every sub-interval lies within the requested range.
    #[test]
    fn missing_result_is_sorted_and_within_range(
      (a, b) in (arb_date(), arb_date()),
      covered_raw in prop::collection::vec(arb_date(), 0..20),
    ) {
      let (start, end) = if a <= b { (a, b) } else { (b, a) };
      let requested = DateInterval::checked_new(start, end).unwrap();
      let covered: BTreeSet<NaiveDate> = covered_raw.into_iter().collect();

      let gaps = missing(requested, &covered);

      for w in gaps.windows(2) {
        prop_assert!(w[0].end < w[1].start);
      }
      for g in &gaps {
        prop_assert!(g.start() >= requested.start());
        prop_assert!(g.end() <= requested.end());
      }
    }

    /// Every date in the requested range is either in `covered` or in
    /// exactly one returned gap, never both, never neither.
    #[test]
    fn missing_partitions_the_requested_range(
      (a, b) in (arb_date(), arb_date()),
      covered_raw in prop::collection::vec(arb_date(), 0..20),
    ) {
      let (start, end) = if a <= b { (a, b) } else { (b, a) };
      prop_assume!((end - start).num_days() < 60);
      let requested = DateInterval::checked_new(start, end).unwrap();
      let covered: BTreeSet<NaiveDate> = covered_raw.into_iter().collect();

      let gaps = missing(requested, &covered);

      let mut d = start;
      while d <= end {
        let in_covered = covered.contains(&d);
        let in_gap = gaps.iter().filter(|g| g.contains(d)).count();
        prop_assert!(in_covered ^ (in_gap == 1));
        d += chrono::Duration::days(1);
      }
    }
  }
}
