//! # Headline Corpus
//!
//! $$
//! \mathcal{H} = \big((t_1, s_1), \dots, (t_n, s_n)\big),\quad t_i \in \text{UTC}
//! $$
//!
//! Timezone-aware headline collection. Rows with a blank title or an unreadable
//! timestamp never enter the corpus.

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeZone;
use chrono::Utc;
use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::window::NewsWindow;
use crate::error::PipelineError;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S %z"];

/// Read an instant from text.
///
/// Accepts RFC 3339, date-times with a numeric offset, naive date-times and
/// plain `YYYY-MM-DD` dates. Naive values are taken as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, PipelineError> {
  let s = value.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }

  for fmt in OFFSET_DATETIME_FORMATS {
    if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
      return Ok(dt.with_timezone(&Utc));
    }
  }

  for fmt in NAIVE_DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
      return Ok(dt.and_utc());
    }
  }

  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    if let Some(dt) = d.and_hms_opt(0, 0, 0) {
      return Ok(dt.and_utc());
    }
  }

  Err(PipelineError::InvalidTimestamp {
    value: value.to_string(),
  })
}

/// A single timestamped headline.
#[derive(ImplNew, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
  /// Publication instant.
  pub timestamp: DateTime<Utc>,
  /// Headline text.
  pub title: String,
}

/// Immutable, ingestion-ordered collection of headlines.
#[derive(Clone, Debug, Default)]
pub struct HeadlineCorpus {
  items: Vec<Headline>,
}

impl HeadlineCorpus {
  /// Build a corpus, keeping ingestion order and dropping blank titles.
  pub fn new(items: Vec<Headline>) -> Self {
    let total = items.len();
    let items: Vec<Headline> = items
      .into_iter()
      .filter(|h| !h.title.trim().is_empty())
      .collect();

    if items.len() < total {
      debug!(dropped = total - items.len(), "dropped blank headlines");
    }

    Self { items }
  }

  /// Build a corpus from raw `(timestamp, title)` text rows.
  ///
  /// Unreadable timestamps and blank titles are dropped. The result is sorted
  /// ascending by timestamp; equal timestamps keep their row order.
  pub fn from_raw_rows<I, A, B>(rows: I) -> Self
  where
    I: IntoIterator<Item = (A, B)>,
    A: AsRef<str>,
    B: Into<String>,
  {
    let mut items = Vec::new();
    let mut dropped = 0usize;

    for (ts, title) in rows {
      let title: String = title.into();
      match parse_instant(ts.as_ref()) {
        Ok(timestamp) if !title.trim().is_empty() => items.push(Headline { timestamp, title }),
        _ => dropped += 1,
      }
    }

    if dropped > 0 {
      debug!(dropped, kept = items.len(), "dropped unreadable headline rows");
    }

    items.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    Self { items }
  }

  /// Number of headlines.
  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// `true` when the corpus holds no headline.
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Headlines in ingestion order.
  pub fn headlines(&self) -> &[Headline] {
    &self.items
  }

  pub fn iter(&self) -> impl Iterator<Item = &Headline> {
    self.items.iter()
  }

  /// Most recent publication instant.
  pub fn latest(&self) -> Option<DateTime<Utc>> {
    self.items.iter().map(|h| h.timestamp).max()
  }

  /// Earliest publication instant.
  pub fn earliest(&self) -> Option<DateTime<Utc>> {
    self.items.iter().map(|h| h.timestamp).min()
  }

  /// Headlines published in `(asof - lookback_days, asof]`, newest first.
  pub fn window<Tz: TimeZone>(&self, asof: &DateTime<Tz>, lookback_days: u32) -> NewsWindow {
    NewsWindow::select(&self.items, asof.with_timezone(&Utc), lookback_days)
  }
}

impl FromIterator<Headline> for HeadlineCorpus {
  fn from_iter<T: IntoIterator<Item = Headline>>(iter: T) -> Self {
    Self::new(iter.into_iter().collect())
  }
}
