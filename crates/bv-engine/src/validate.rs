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

use bv_core::{normalize_symbol, Error, Frequency, Result};
use chrono::{DateTime, NaiveDate, Utc};

/// Earliest date the store will accept. Nothing upstream publishes prices
/// before this.
pub const EARLIEST_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
  Some(d) => d,
  None => unreachable!(),
};

/// A validated, normalized request. Constructing one is the only way to
/// get past `Engine::get_prices`'s input checks; every field is already
/// known-good by the time the orchestration loop sees it.
pub struct ValidatedRequest {
  pub symbol: String,
  pub frequency: Frequency,
  pub start: NaiveDate,
  pub end: NaiveDate,
}

/// Validates a `get_prices` request against spec §4.5: symbol shape, date
/// ordering, and date bounds relative to `now`. `Frequency` has exactly
/// one variant today, so there is no runtime frequency check left to do —
/// the type system already rejects anything else.
pub fn validate_request(
  symbol: &str,
  frequency: Frequency,
  start: NaiveDate,
  end: NaiveDate,
  now: DateTime<Utc>,
) -> Result<ValidatedRequest> {
  let normalized = normalize_symbol(symbol);

  // Collected so a request that is wrong in more than one way (e.g. a
  // malformed symbol *and* a reversed range) names every problem at once,
  // instead of only the first check reached.
  let mut problems = Vec::new();
  if let Err(e) = &normalized {
    problems.push(e.to_string());
  }
  if start > end {
    problems.push(format!("start {start} is after end {end}"));
  }
  if !problems.is_empty() {
    return Err(Error::InvalidInput(problems.join("; ")));
  }
  let symbol = normalized.expect("no problems collected implies normalize_symbol succeeded");

  if start < EARLIEST_DATE {
    return Err(Error::InvalidInput(format!("start {start} precedes earliest supported date {EARLIEST_DATE}")));
  }
  let today = now.date_naive();
  if end > today {
    return Err(Error::InvalidInput(format!("end {end} is after today {today}")));
  }

  Ok(ValidatedRequest { symbol, frequency, start, end })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
  }

  #[test]
  fn accepts_a_well_formed_request() {
    let req = validate_request("aapl", Frequency::Daily, date(2024, 1, 1), date(2024, 1, 31), now()).unwrap();
    assert_eq!(req.symbol, "AAPL");
  }

  #[test]
  fn rejects_start_after_end() {
    assert!(validate_request("AAPL", Frequency::Daily, date(2024, 2, 1), date(2024, 1, 1), now()).is_err());
  }

  #[test]
  fn rejects_start_before_1970() {
    assert!(validate_request("AAPL", Frequency::Daily, date(1960, 1, 1), date(1970, 1, 2), now()).is_err());
  }

  #[test]
  fn rejects_end_after_today() {
    assert!(validate_request("AAPL", Frequency::Daily, date(2024, 1, 1), date(2024, 12, 31), now()).is_err());
  }

  #[test]
  fn rejects_malformed_symbol() {
    assert!(validate_request("not a symbol!", Frequency::Daily, date(2024, 1, 1), date(2024, 1, 2), now())
      .is_err());
  }

  #[test]
  fn names_both_a_malformed_symbol_and_a_reversed_range() {
    let err = validate_request("aapl$", Frequency::Daily, date(2024, 1, 10), date(2024, 1, 1), now()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("aapl$"), "message should name the malformed symbol: {message}");
    assert!(message.contains("after"), "message should name the reversed range: {message}");
  }
}
