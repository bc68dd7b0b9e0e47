use std::str::FromStr;

use bv_core::{Bar, Error as CoreError, Frequency, ProviderId};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;

use crate::schema::bars;

/// Row shape as it exists in SQLite: dates and enums flattened to `TEXT`
/// the way `factordynamics-data`'s `cached_at` column is stored, since
/// SQLite has no native date/enum type.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = bars)]
pub struct BarRow {
  pub symbol: String,
  pub date: String,
  pub frequency: String,
  pub provider: String,
  pub open: Option<f64>,
  pub high: Option<f64>,
  pub low: Option<f64>,
  pub close: Option<f64>,
  pub volume: Option<f64>,
  pub adj_open: Option<f64>,
  pub adj_high: Option<f64>,
  pub adj_low: Option<f64>,
  pub adj_close: Option<f64>,
  pub adj_volume: Option<f64>,
  pub fetched_at: String,
}

impl From<&Bar> for BarRow {
  fn from(bar: &Bar) -> Self {
    Self {
      symbol: bar.symbol.clone(),
      date: bar.date.format("%Y-%m-%d").to_string(),
      frequency: bar.frequency.to_string(),
      provider: bar.provider.to_string(),
      open: bar.open,
      high: bar.high,
      low: bar.low,
      close: bar.close,
      volume: bar.volume,
      adj_open: bar.adj_open,
      adj_high: bar.adj_high,
      adj_low: bar.adj_low,
      adj_close: bar.adj_close,
      adj_volume: bar.adj_volume,
      fetched_at: bar.fetched_at.to_rfc3339(),
    }
  }
}

impl TryFrom<BarRow> for Bar {
  type Error = CoreError;

  fn try_from(row: BarRow) -> Result<Self, Self::Error> {
    let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")?;
    let fetched_at = chrono::DateTime::parse_from_rfc3339(&row.fetched_at)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(|e| CoreError::Store(format!("corrupt fetched_at column: {e}")))?;

    Ok(Bar {
      symbol: row.symbol,
      date,
      frequency: Frequency::from_str(&row.frequency)?,
      provider: ProviderId::from_str(&row.provider)?,
      open: row.open,
      high: row.high,
      low: row.low,
      close: row.close,
      volume: row.volume,
      adj_open: row.adj_open,
      adj_high: row.adj_high,
      adj_low: row.adj_low,
      adj_close: row.adj_close,
      adj_volume: row.adj_volume,
      fetched_at,
    })
  }
}
