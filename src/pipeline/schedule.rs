//! # Rebalance Schedule
//!
//! $$
//! \mathcal{T} = \{\, t \in [t_{\text{from}}, t_{\text{to}}] : f(t) \,\}
//! $$
//!
//! Formation dates between two calendar days, at midnight UTC.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::Utc;
use chrono::Weekday;
use serde::Deserialize;
use serde::Serialize;

use crate::error::PipelineError;

/// How often a new portfolio is formed.
///
/// Parsed from `D`, `W` / `W-MON` … `W-SUN` (bare `W` is Sunday) and `M` / `ME`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RebalanceFrequency {
  /// Every calendar day.
  Daily,
  /// Once a week on the given weekday.
  Weekly(Weekday),
  /// Last calendar day of each month.
  MonthEnd,
}

impl RebalanceFrequency {
  fn matches(&self, day: NaiveDate) -> bool {
    match self {
      Self::Daily => true,
      Self::Weekly(wd) => day.weekday() == *wd,
      Self::MonthEnd => day.succ_opt().map_or(true, |next| next.month() != day.month()),
    }
  }
}

impl FromStr for RebalanceFrequency {
  type Err = PipelineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let alias = s.trim().to_uppercase();
    let freq = match alias.as_str() {
      "D" => Self::Daily,
      "W" => Self::Weekly(Weekday::Sun),
      "M" | "ME" => Self::MonthEnd,
      other => {
        let day = other
          .strip_prefix("W-")
          .and_then(|d| d.parse::<Weekday>().ok());
        match day {
          Some(wd) => Self::Weekly(wd),
          None => {
            return Err(PipelineError::InvalidFrequency {
              value: s.to_string(),
            });
          }
        }
      }
    };
    Ok(freq)
  }
}

impl fmt::Display for RebalanceFrequency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Daily => f.write_str("D"),
      Self::Weekly(wd) => write!(f, "W-{}", wd.to_string().to_uppercase()),
      Self::MonthEnd => f.write_str("M"),
    }
  }
}

impl TryFrom<String> for RebalanceFrequency {
  type Error = PipelineError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<RebalanceFrequency> for String {
  fn from(value: RebalanceFrequency) -> Self {
    value.to_string()
  }
}

/// Midnight-UTC formation instants in `[from, to]` selected by `freq`.
pub fn rebalance_dates(
  from: NaiveDate,
  to: NaiveDate,
  freq: RebalanceFrequency,
) -> Vec<DateTime<Utc>> {
  from
    .iter_days()
    .take_while(|d| *d <= to)
    .filter(|d| freq.matches(*d))
    .filter_map(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn parses_aliases() {
    assert_eq!("D".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::Daily);
    assert_eq!(
      "w-fri".parse::<RebalanceFrequency>().unwrap(),
      RebalanceFrequency::Weekly(Weekday::Fri)
    );
    assert_eq!(
      "W".parse::<RebalanceFrequency>().unwrap(),
      RebalanceFrequency::Weekly(Weekday::Sun)
    );
    assert_eq!("ME".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::MonthEnd);
    assert!(matches!(
      "Q".parse::<RebalanceFrequency>(),
      Err(PipelineError::InvalidFrequency { .. })
    ));
    assert!("W-XYZ".parse::<RebalanceFrequency>().is_err());
  }

  #[test]
  fn display_round_trips_through_serde() {
    let freq = RebalanceFrequency::Weekly(Weekday::Fri);
    assert_eq!(freq.to_string(), "W-FRI");

    let json = serde_json::to_string(&freq).unwrap();
    assert_eq!(json, "\"W-FRI\"");
    assert_eq!(serde_json::from_str::<RebalanceFrequency>(&json).unwrap(), freq);
  }

  #[test]
  fn weekly_dates_fall_on_the_weekday() {
    let dates = rebalance_dates(
      d(2024, 1, 1),
      d(2024, 1, 31),
      RebalanceFrequency::Weekly(Weekday::Fri),
    );

    let days: Vec<u32> = dates.iter().map(|t| t.day()).collect();
    assert_eq!(days, vec![5, 12, 19, 26]);
    let midnight = chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap();
    assert!(dates.iter().all(|t| t.time() == midnight));
  }

  #[test]
  fn month_end_and_daily_bounds_are_inclusive() {
    let ends = rebalance_dates(d(2024, 1, 15), d(2024, 3, 31), RebalanceFrequency::MonthEnd);
    let ends: Vec<NaiveDate> = ends.iter().map(|t| t.date_naive()).collect();
    assert_eq!(ends, vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)]);

    assert_eq!(
      rebalance_dates(d(2024, 1, 1), d(2024, 1, 3), RebalanceFrequency::Daily).len(),
      3
    );
    assert!(rebalance_dates(d(2024, 1, 3), d(2024, 1, 1), RebalanceFrequency::Daily).is_empty());
  }
}
