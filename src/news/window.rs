//! # News Window
//!
//! $$
//! t_0 - L < t_h \le t_0
//! $$
//!
//! Left-open, right-closed trailing window of headlines rendered as a bullet list.

use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;

use super::corpus::Headline;
use super::corpus::HeadlineCorpus;

/// Left bound of the window; `None` when it falls before the representable range.
fn window_start(asof: DateTime<Utc>, lookback_days: u32) -> Option<DateTime<Utc>> {
  asof.checked_sub_signed(Duration::days(i64::from(lookback_days)))
}

/// `start < t <= asof`; a zero-length window degenerates to `t == asof`.
fn in_window(t: DateTime<Utc>, start: Option<DateTime<Utc>>, asof: DateTime<Utc>) -> bool {
  t <= asof
    && match start {
      Some(start) => t > start || start == asof,
      None => true,
    }
}

/// Headlines inside one lookback window, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewsWindow {
  asof: DateTime<Utc>,
  lookback_days: u32,
  headlines: Vec<Headline>,
}

impl NewsWindow {
  pub(crate) fn select(items: &[Headline], asof: DateTime<Utc>, lookback_days: u32) -> Self {
    let start = window_start(asof, lookback_days);

    let mut headlines: Vec<Headline> = items
      .iter()
      .filter(|h| in_window(h.timestamp, start, asof))
      .cloned()
      .collect();
    // stable: equal timestamps keep ingestion order
    headlines.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    Self {
      asof,
      lookback_days,
      headlines,
    }
  }

  /// Right (inclusive) bound of the window.
  pub fn asof(&self) -> DateTime<Utc> {
    self.asof
  }

  /// Length of the window in days.
  pub fn lookback_days(&self) -> u32 {
    self.lookback_days
  }

  /// Left (exclusive) bound of the window; `None` means unbounded.
  pub fn start(&self) -> Option<DateTime<Utc>> {
    window_start(self.asof, self.lookback_days)
  }

  /// Selected headlines, newest first.
  pub fn headlines(&self) -> &[Headline] {
    &self.headlines
  }

  pub fn len(&self) -> usize {
    self.headlines.len()
  }

  /// An empty window carries no signal and should not be sent to a model.
  pub fn is_empty(&self) -> bool {
    self.headlines.is_empty()
  }

  /// One `- title` bullet per headline, joined by newlines. Empty window renders as `""`.
  pub fn render(&self) -> String {
    self
      .headlines
      .iter()
      .map(|h| format!("- {}", h.title))
      .collect::<Vec<_>>()
      .join("\n")
  }
}

impl fmt::Display for NewsWindow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.render())
  }
}

/// Render the headlines of `corpus` published in `(asof - lookback_days, asof]`.
pub fn build_window<Tz: TimeZone>(
  corpus: &HeadlineCorpus,
  asof: &DateTime<Tz>,
  lookback_days: u32,
) -> String {
  corpus.window(asof, lookback_days).render()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
  }

  fn corpus(days: &[u32]) -> HeadlineCorpus {
    HeadlineCorpus::new(
      days
        .iter()
        .map(|d| Headline::new(day(*d), format!("day {d}")))
        .collect(),
    )
  }

  #[test]
  fn window_keeps_trailing_interval_newest_first() {
    let corpus = corpus(&[1, 5, 8, 10]);
    let window = corpus.window(&day(10), 7);

    assert_eq!(window.render(), "- day 10\n- day 8\n- day 5");
    assert_eq!(window.start(), Some(day(3)));
  }

  #[test]
  fn every_kept_headline_satisfies_the_bounds() {
    let corpus = corpus(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    let asof = day(9);

    for lookback in 0..12 {
      let window = corpus.window(&asof, lookback);
      let start = asof - Duration::days(i64::from(lookback));
      for h in corpus.iter() {
        let inside = h.timestamp <= asof && (h.timestamp > start || (lookback == 0 && h.timestamp == asof));
        assert_eq!(window.headlines().contains(h), inside, "lookback {lookback}, {h:?}");
      }
    }
  }

  #[test]
  fn left_bound_is_exclusive() {
    let corpus = corpus(&[3, 4]);
    assert_eq!(build_window(&corpus, &day(10), 7), "- day 4");
  }

  #[test]
  fn zero_lookback_keeps_exact_instant_only() {
    let asof = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    let corpus = HeadlineCorpus::new(vec![
      Headline::new(asof, "at asof".to_string()),
      Headline::new(asof - Duration::seconds(1), "just before".to_string()),
      Headline::new(asof + Duration::seconds(1), "after".to_string()),
    ]);

    assert_eq!(build_window(&corpus, &asof, 0), "- at asof");
  }

  #[test]
  fn ties_keep_ingestion_order() {
    let corpus = HeadlineCorpus::new(vec![
      Headline::new(day(4), "older".to_string()),
      Headline::new(day(5), "first in".to_string()),
      Headline::new(day(5), "second in".to_string()),
    ]);

    assert_eq!(
      build_window(&corpus, &day(5), 2),
      "- first in\n- second in\n- older"
    );
  }

  #[test]
  fn lookback_past_the_calendar_keeps_all_history() {
    let corpus = corpus(&[1, 5, 12]);
    let window = corpus.window(&day(10), u32::MAX);

    assert_eq!(window.start(), None);
    assert_eq!(window.render(), "- day 5\n- day 1");
    assert_eq!(build_window(&corpus, &day(10), u32::MAX), "- day 5\n- day 1");
  }

  #[test]
  fn empty_window_renders_empty_string() {
    let corpus = corpus(&[1, 2]);
    let window = corpus.window(&day(20), 3);

    assert!(window.is_empty());
    assert_eq!(window.to_string(), "");
  }
}
