//! # Portfolio Normalizer
//!
//! $$
//! w_i' = \frac{w_i}{\sum_{j \in F} |w_j|},\quad F = \{\, j : s_j, w_j \text{ coercible} \,\}
//! $$
//!
//! Schema check, per-row coercion, degenerate-set detection and gross rescaling.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::types::Portfolio;
use super::types::Position;
use crate::error::PipelineError;
use crate::llm::CandidatePosition;

const STOCK_FIELD: &str = "stock";
const WEIGHT_FIELD: &str = "weight";

/// Turn parsed model candidates into a portfolio with `sum(|w|) == 1`.
///
/// Every record must carry `stock` and `weight`. Rows whose values cannot be
/// coerced are dropped; an empty or zero-gross remainder is degenerate.
pub fn normalize(candidates: &[CandidatePosition]) -> Result<Portfolio, PipelineError> {
  for record in candidates {
    for field in [STOCK_FIELD, WEIGHT_FIELD] {
      if !record.contains_key(field) {
        return Err(PipelineError::missing_field(field));
      }
    }
  }

  let rows: Vec<(String, f64)> = candidates
    .iter()
    .filter_map(|record| {
      let stock = coerce_stock(&record[STOCK_FIELD])?;
      let weight = coerce_weight(&record[WEIGHT_FIELD])?;
      Some((stock, weight))
    })
    .collect();

  if rows.len() < candidates.len() {
    debug!(
      dropped = candidates.len() - rows.len(),
      kept = rows.len(),
      "dropped candidates with unusable stock or weight"
    );
  }

  rescale(rows)
}

impl Portfolio {
  /// Normalise typed `(stock, weight)` pairs with the same rules as [`normalize`].
  pub fn from_weights<I, S>(weights: I) -> Result<Self, PipelineError>
  where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
  {
    let rows = weights
      .into_iter()
      .filter_map(|(stock, weight)| {
        let stock = stock.as_ref().trim();
        (!stock.is_empty() && weight.is_finite()).then(|| (stock.to_string(), weight))
      })
      .collect();

    rescale(rows)
  }
}

pub(crate) fn rescale(rows: Vec<(String, f64)>) -> Result<Portfolio, PipelineError> {
  if rows.is_empty() {
    return Err(PipelineError::DegeneratePortfolio);
  }

  let (scale, gross) = gross_exposure(&rows);
  if gross == 0.0 || !gross.is_finite() {
    return Err(PipelineError::DegeneratePortfolio);
  }

  let mut seen = HashSet::with_capacity(rows.len());
  for (stock, _) in &rows {
    if !seen.insert(stock.as_str()) {
      warn!(stock = %stock, "duplicate identifier kept as a separate position");
    }
  }

  let positions = rows
    .into_iter()
    .map(|(stock, weight)| Position {
      stock,
      weight: (weight / scale) / gross,
    })
    .collect();

  Ok(Portfolio::from_normalized(positions))
}

/// `(scale, sum(|w| / scale))`. The scale is 1 unless the plain sum overflows,
/// in which case weights are first divided by the largest magnitude.
fn gross_exposure(rows: &[(String, f64)]) -> (f64, f64) {
  let gross: f64 = rows.iter().map(|(_, w)| w.abs()).sum();
  if !gross.is_infinite() {
    return (1.0, gross);
  }

  let scale = rows.iter().map(|(_, w)| w.abs()).fold(0.0_f64, f64::max);
  (scale, rows.iter().map(|(_, w)| w.abs() / scale).sum())
}

fn coerce_stock(value: &Value) -> Option<String> {
  let stock = match value {
    Value::String(s) => s.trim().to_string(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Null | Value::Array(_) | Value::Object(_) => return None,
  };
  (!stock.is_empty()).then_some(stock)
}

fn coerce_weight(value: &Value) -> Option<f64> {
  let weight = match value {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  weight.is_finite().then_some(weight)
}
