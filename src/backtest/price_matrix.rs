//! # Price Matrix
//!
//! $$
//! \mathbf{P} \in (\mathbb{R} \cup \{\varnothing\})^{N \times T}
//! $$
//!
//! Wide layout: one row per instrument, one column per calendar date. Cells may
//! be absent. Date columns are kept in ascending calendar order regardless of
//! the order they were supplied in.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::PipelineError;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Read a date column label.
///
/// Dates, naive date-times and RFC 3339 instants are accepted; the time part
/// is discarded (an offset instant keeps its local calendar date).
pub fn parse_date_label(label: &str) -> Result<NaiveDate, PipelineError> {
  let s = label.trim();

  for fmt in DATE_FORMATS {
    if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
      return Ok(d);
    }
  }

  for fmt in DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
      return Ok(dt.date());
    }
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.date_naive());
  }

  Err(PipelineError::InvalidDate {
    value: label.to_string(),
  })
}

/// Instrument → (date → price).
///
/// Identifiers are trimmed and unique; a repeated identifier is rejected.
/// Non-finite prices are stored as absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceMatrix {
  dates: Vec<NaiveDate>,
  rows: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl PriceMatrix {
  /// Build from typed date columns and one `Option<f64>` cell per column per row.
  pub fn new<I, S>(dates: Vec<NaiveDate>, rows: I) -> Result<Self, PipelineError>
  where
    I: IntoIterator<Item = (S, Vec<Option<f64>>)>,
    S: AsRef<str>,
  {
    if dates.is_empty() {
      return Err(PipelineError::NoDateColumns);
    }

    let mut seen = BTreeSet::new();
    for d in &dates {
      if !seen.insert(*d) {
        return Err(PipelineError::DuplicateDate {
          date: d.to_string(),
        });
      }
    }

    let mut table: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for (stock, cells) in rows {
      let stock = stock.as_ref().trim();
      if stock.is_empty() {
        debug!("skipped price row without identifier");
        continue;
      }
      if cells.len() != dates.len() {
        return Err(PipelineError::RaggedRow {
          stock: stock.to_string(),
          expected: dates.len(),
          found: cells.len(),
        });
      }
      if table.contains_key(stock) {
        return Err(PipelineError::DuplicateInstrument {
          stock: stock.to_string(),
        });
      }

      let series = dates
        .iter()
        .zip(cells)
        .filter_map(|(d, p)| p.filter(|v| v.is_finite()).map(|v| (*d, v)))
        .collect();
      table.insert(stock.to_string(), series);
    }

    Ok(Self {
      dates: seen.into_iter().collect(),
      rows: table,
    })
  }

  /// Build from textual date labels (the header minus the identifier column).
  pub fn from_wide<H, I, S>(header: &[H], rows: I) -> Result<Self, PipelineError>
  where
    H: AsRef<str>,
    I: IntoIterator<Item = (S, Vec<Option<f64>>)>,
    S: AsRef<str>,
  {
    let dates = header
      .iter()
      .map(|label| parse_date_label(label.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Self::new(dates, rows)
  }

  /// Pivot tidy `(stock, date, price)` observations into the wide layout.
  pub fn from_long<I, S>(observations: I) -> Result<Self, PipelineError>
  where
    I: IntoIterator<Item = (S, NaiveDate, f64)>,
    S: AsRef<str>,
  {
    let mut dates = BTreeSet::new();
    let mut seen: BTreeSet<(String, NaiveDate)> = BTreeSet::new();
    let mut table: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for (stock, date, price) in observations {
      let stock = stock.as_ref().trim();
      if stock.is_empty() {
        continue;
      }
      dates.insert(date);

      // absent prices still occupy their (stock, date) slot
      if !seen.insert((stock.to_string(), date)) {
        return Err(PipelineError::DuplicateObservation {
          stock: stock.to_string(),
          date: date.to_string(),
        });
      }
      let series = table.entry(stock.to_string()).or_default();
      if price.is_finite() {
        series.insert(date, price);
      }
    }

    if dates.is_empty() {
      return Err(PipelineError::NoDateColumns);
    }

    Ok(Self {
      dates: dates.into_iter().collect(),
      rows: table,
    })
  }

  /// Date columns, ascending.
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Identifiers, sorted.
  pub fn instruments(&self) -> impl Iterator<Item = &str> {
    self.rows.keys().map(String::as_str)
  }

  /// Number of instruments.
  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn contains(&self, stock: &str) -> bool {
    self.rows.contains_key(stock)
  }

  /// Present prices of one instrument.
  pub fn series(&self, stock: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
    self.rows.get(stock)
  }

  pub fn price(&self, stock: &str, date: NaiveDate) -> Option<f64> {
    self.rows.get(stock)?.get(&date).copied()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).unwrap()
  }

  #[test]
  fn date_labels_in_common_layouts() {
    assert_eq!(parse_date_label("2024-01-02").unwrap(), d(1, 2));
    assert_eq!(parse_date_label("2024/01/02").unwrap(), d(1, 2));
    assert_eq!(parse_date_label("01/02/2024").unwrap(), d(1, 2));
    assert_eq!(parse_date_label("02.01.2024").unwrap(), d(1, 2));
    assert_eq!(parse_date_label("2024-01-02 00:00:00").unwrap(), d(1, 2));
    assert_eq!(parse_date_label("2024-01-02T23:00:00-05:00").unwrap(), d(1, 2));
    assert!(matches!(
      parse_date_label("Ticker"),
      Err(PipelineError::InvalidDate { .. })
    ));
  }

  #[test]
  fn columns_are_sorted_and_cells_follow_their_column() {
    let m = PriceMatrix::from_wide(
      &["2024-01-03", "2024-01-01", "2024-01-02"],
      vec![(" AAPL ", vec![Some(103.0), Some(101.0), None])],
    )
    .unwrap();

    assert_eq!(m.dates(), &[d(1, 1), d(1, 2), d(1, 3)]);
    assert_eq!(m.price("AAPL", d(1, 1)), Some(101.0));
    assert_eq!(m.price("AAPL", d(1, 2)), None);
    assert_eq!(m.price("AAPL", d(1, 3)), Some(103.0));
  }

  #[test]
  fn non_finite_prices_are_absent() {
    let m = PriceMatrix::new(vec![d(1, 1), d(1, 2)], vec![("X", vec![Some(f64::NAN), Some(2.0)])])
      .unwrap();
    assert_eq!(m.series("X").unwrap().len(), 1);
  }

  #[test]
  fn construction_errors() {
    assert_eq!(
      PriceMatrix::new(Vec::new(), Vec::<(&str, Vec<Option<f64>>)>::new()),
      Err(PipelineError::NoDateColumns)
    );
    assert_eq!(
      PriceMatrix::new(
        vec![d(1, 1)],
        vec![("A", vec![Some(1.0)]), ("A ", vec![Some(2.0)])]
      ),
      Err(PipelineError::DuplicateInstrument {
        stock: "A".to_string()
      })
    );
    assert_eq!(
      PriceMatrix::new(vec![d(1, 1), d(1, 2)], vec![("A", vec![Some(1.0)])]),
      Err(PipelineError::RaggedRow {
        stock: "A".to_string(),
        expected: 2,
        found: 1
      })
    );
    assert_eq!(
      PriceMatrix::from_wide(&["2024-01-01", "01/01/2024"], vec![("A", vec![None, None])]),
      Err(PipelineError::DuplicateDate {
        date: "2024-01-01".to_string()
      })
    );
  }

  #[test]
  fn long_layout_pivots() {
    let m = PriceMatrix::from_long(vec![
      ("B", d(1, 2), 20.0),
      ("A", d(1, 1), 10.0),
      ("A", d(1, 2), 11.0),
    ])
    .unwrap();

    assert_eq!(m.dates(), &[d(1, 1), d(1, 2)]);
    assert_eq!(m.instruments().collect::<Vec<_>>(), vec!["A", "B"]);
    assert_eq!(m.price("B", d(1, 1)), None);

    assert_eq!(
      PriceMatrix::from_long(vec![("A", d(1, 1), 1.0), ("A", d(1, 1), 2.0)]),
      Err(PipelineError::DuplicateObservation {
        stock: "A".to_string(),
        date: "2024-01-01".to_string()
      })
    );
  }

  #[test]
  fn absent_observation_still_counts_for_duplicates() {
    assert_eq!(
      PriceMatrix::from_long(vec![("A", d(1, 1), f64::NAN), ("A", d(1, 1), 2.0)]),
      Err(PipelineError::DuplicateObservation {
        stock: "A".to_string(),
        date: "2024-01-01".to_string()
      })
    );

    let m = PriceMatrix::from_long(vec![("A", d(1, 1), f64::NAN), ("A", d(1, 2), 2.0)]).unwrap();
    assert_eq!(m.dates(), &[d(1, 1), d(1, 2)]);
    assert_eq!(m.price("A", d(1, 1)), None);
  }
}
