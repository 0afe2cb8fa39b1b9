//! # Portfolio Types
//!
//! $$
//! P = \big((s_1, w_1), \dots, (s_n, w_n)\big),\quad \sum_i |w_i| = 1
//! $$
//!
//! Positions, the normalised portfolio and its flat export row.

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::normalize::rescale;
use crate::error::PipelineError;

/// Signed holding; positive is long, negative is short.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
  /// Trimmed, non-empty instrument identifier.
  pub stock: String,
  /// Signed weight.
  pub weight: f64,
}

impl Position {
  pub fn is_long(&self) -> bool {
    self.weight > 0.0
  }

  pub fn is_short(&self) -> bool {
    self.weight < 0.0
  }
}

/// Normalised long/short portfolio.
///
/// Only produced by normalisation, so `sum(|w|) == 1` always holds. The one
/// change allowed afterwards is attaching the formation date.
#[derive(Clone, Debug, PartialEq)]
pub struct Portfolio {
  positions: Vec<Position>,
  formation_date: Option<DateTime<Utc>>,
}

impl Portfolio {
  pub(crate) fn from_normalized(positions: Vec<Position>) -> Self {
    Self {
      positions,
      formation_date: None,
    }
  }

  /// Positions in proposal order. Repeated identifiers stay separate.
  pub fn positions(&self) -> &[Position] {
    &self.positions
  }

  pub fn len(&self) -> usize {
    self.positions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Position> {
    self.positions.iter()
  }

  /// Long legs.
  pub fn longs(&self) -> impl Iterator<Item = &Position> {
    self.positions.iter().filter(|p| p.is_long())
  }

  /// Short legs.
  pub fn shorts(&self) -> impl Iterator<Item = &Position> {
    self.positions.iter().filter(|p| p.is_short())
  }

  /// `sum(|w|)`; 1 up to rounding.
  pub fn gross_exposure(&self) -> f64 {
    self.positions.iter().map(|p| p.weight.abs()).sum()
  }

  /// `sum(w)`; 0 for a dollar-neutral book.
  pub fn net_exposure(&self) -> f64 {
    self.positions.iter().map(|p| p.weight).sum()
  }

  /// Formation date tag, if attached.
  pub fn formation_date(&self) -> Option<DateTime<Utc>> {
    self.formation_date
  }

  /// Attach the formation date this portfolio was built for.
  pub fn with_formation_date(mut self, date: DateTime<Utc>) -> Self {
    self.formation_date = Some(date);
    self
  }

  /// One row per identifier, weights summed and renormalised.
  ///
  /// Fails with [`PipelineError::DegeneratePortfolio`] when every identifier nets to zero.
  pub fn merged(&self) -> Result<Portfolio, PipelineError> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for p in &self.positions {
      let entry = totals.entry(p.stock.as_str()).or_insert_with(|| {
        order.push(p.stock.clone());
        0.0
      });
      *entry += p.weight;
    }

    let rows: Vec<(String, f64)> = order
      .into_iter()
      .filter_map(|stock| {
        let w = totals[stock.as_str()];
        (w != 0.0).then_some((stock, w))
      })
      .collect();

    let merged = rescale(rows)?;
    Ok(match self.formation_date {
      Some(date) => merged.with_formation_date(date),
      None => merged,
    })
  }

  /// Flat export rows carrying the formation date.
  pub fn to_rows(&self) -> Vec<PortfolioRow> {
    self
      .positions
      .iter()
      .map(|p| PortfolioRow {
        stock: p.stock.clone(),
        weight: p.weight,
        rebalance_date: self.formation_date,
      })
      .collect()
  }
}

/// Export shape: `{ stock, weight, rebalance_date }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
  pub stock: String,
  pub weight: f64,
  pub rebalance_date: Option<DateTime<Utc>>,
}

/// Concatenate export rows of several portfolios, in the given order.
pub fn portfolio_rows(portfolios: &[Portfolio]) -> Vec<PortfolioRow> {
  portfolios.iter().flat_map(Portfolio::to_rows).collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::TimeZone;

  use super::*;

  fn book(weights: &[(&str, f64)]) -> Portfolio {
    Portfolio::from_weights(weights.iter().map(|(s, w)| (*s, *w))).unwrap()
  }

  #[test]
  fn exposures_and_legs() {
    let p = book(&[("A", 3.0), ("B", -1.0)]);

    assert_abs_diff_eq!(p.gross_exposure(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(p.net_exposure(), 0.5, epsilon = 1e-12);
    assert_eq!(p.longs().count(), 1);
    assert_eq!(p.shorts().next().map(|x| x.stock.as_str()), Some("B"));
  }

  #[test]
  fn merged_sums_repeated_identifiers() {
    let p = book(&[("A", 0.5), ("B", -0.25), ("A", 0.25)]);
    let m = p.merged().unwrap();

    assert_eq!(m.len(), 2);
    assert_eq!(m.positions()[0].stock, "A");
    assert_abs_diff_eq!(m.positions()[0].weight, 0.75, epsilon = 1e-12);
    assert_abs_diff_eq!(m.positions()[1].weight, -0.25, epsilon = 1e-12);
  }

  #[test]
  fn merged_rescales_after_netting() {
    let p = book(&[("A", 0.5), ("A", -0.25), ("B", -0.25)]);
    let m = p.merged().unwrap();

    assert_abs_diff_eq!(m.positions()[0].weight, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(m.positions()[1].weight, -0.5, epsilon = 1e-12);
  }

  #[test]
  fn merged_fails_when_everything_nets_out() {
    let p = book(&[("A", 1.0), ("A", -1.0)]);
    assert_eq!(p.merged(), Err(PipelineError::DegeneratePortfolio));
  }

  #[test]
  fn rows_carry_formation_date() {
    let date = Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap();
    let tagged = book(&[("A", 1.0), ("B", -1.0)]).with_formation_date(date);
    let untagged = book(&[("C", 1.0)]);

    let rows = portfolio_rows(&[tagged, untagged]);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].rebalance_date, Some(date));
    assert_eq!(rows[2].rebalance_date, None);

    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["stock"], "A");
    assert_eq!(json["rebalance_date"], "2024-05-03T00:00:00Z");
  }
}
