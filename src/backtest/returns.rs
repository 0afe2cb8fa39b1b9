//! # Portfolio Returns
//!
//! $$
//! r_{i,k} = \frac{P_{i,k} - P_{i,k-1}}{P_{i,k-1}},\quad
//! R_{p,k} = \sum_{i : r_{i,k} \text{ defined}} w_i\, r_{i,k},\quad
//! C_k = (1 + C_{k-1})(1 + R_{p,k}) - 1
//! $$
//!
//! An instrument with no return on a date contributes zero to that date only;
//! it stays in the book afterwards, so sparse prices understate realised
//! exposure on those days.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::price_matrix::PriceMatrix;
use crate::error::PipelineError;
use crate::portfolio::Portfolio;

/// One row of the return series.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
  pub date: NaiveDate,
  /// Weighted simple return on `date`.
  pub portfolio_ret: f64,
  /// Compounded return up to and including `date`.
  pub portfolio_cum: f64,
}

/// Date-ascending portfolio returns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnSeries {
  points: Vec<ReturnPoint>,
}

impl ReturnSeries {
  pub fn points(&self) -> &[ReturnPoint] {
    &self.points
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ReturnPoint> {
    self.points.iter()
  }

  pub fn dates(&self) -> Vec<NaiveDate> {
    self.points.iter().map(|p| p.date).collect()
  }

  pub fn returns(&self) -> Vec<f64> {
    self.points.iter().map(|p| p.portfolio_ret).collect()
  }

  /// Cumulative return at the last date; 0 for an empty series.
  pub fn total_return(&self) -> f64 {
    self.points.last().map_or(0.0, |p| p.portfolio_cum)
  }
}

/// Simple return between two prices; `None` if either is absent or `prev` is zero.
pub fn simple_return(prev: Option<f64>, cur: Option<f64>) -> Option<f64> {
  match (prev, cur) {
    (Some(p0), Some(p1)) if p0 != 0.0 => Some((p1 - p0) / p0),
    _ => None,
  }
}

/// Daily and cumulative returns of `portfolio` over the dates of `prices`.
///
/// Only instruments present in both are held. Dates where no held instrument
/// has a return (including the first column) are dropped.
pub fn daily_returns(
  prices: &PriceMatrix,
  portfolio: &Portfolio,
) -> Result<ReturnSeries, PipelineError> {
  let held: Vec<(f64, &BTreeMap<NaiveDate, f64>)> = portfolio
    .iter()
    .filter_map(|p| match prices.series(&p.stock) {
      Some(series) => Some((p.weight, series)),
      None => {
        debug!(stock = %p.stock, "position has no price row; excluded");
        None
      }
    })
    .collect();

  if held.is_empty() {
    return Err(PipelineError::EmptyIntersection);
  }

  let mut points = Vec::with_capacity(prices.dates().len().saturating_sub(1));
  let mut cum = 0.0;

  for pair in prices.dates().windows(2) {
    let (prev, cur) = (pair[0], pair[1]);

    let mut ret = 0.0;
    let mut defined = 0usize;
    for (weight, series) in &held {
      if let Some(r) = simple_return(series.get(&prev).copied(), series.get(&cur).copied()) {
        ret += weight * r;
        defined += 1;
      }
    }

    if defined == 0 {
      debug!(date = %cur, "no computable return; date dropped");
      continue;
    }

    cum = (1.0 + cum) * (1.0 + ret) - 1.0;
    points.push(ReturnPoint {
      date: cur,
      portfolio_ret: ret,
      portfolio_cum: cum,
    });
  }

  if points.is_empty() {
    return Err(PipelineError::NoUsableDates);
  }

  Ok(ReturnSeries { points })
}
