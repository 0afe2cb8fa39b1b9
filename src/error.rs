//! # Errors
//!
//! $$
//! \text{stage}:\ \text{input}\to\text{Result}\langle\text{value},\ \text{PipelineError}\rangle
//! $$
//!
//! Failure taxonomy shared by the window, parsing, normalisation and backtest stages.

use thiserror::Error;

/// Errors raised by the deterministic stages of the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
  /// Model output could not be recovered as an array of records.
  #[error("malformed model response: {reason}")]
  MalformedResponse {
    /// What the parser could not recover from.
    reason: String,
  },

  /// A candidate record is missing a required field.
  #[error("candidate record is missing required field `{field}`")]
  SchemaError {
    /// Name of the missing field.
    field: String,
  },

  /// No usable weight survived coercion, or the gross weight is zero / NaN.
  #[error("degenerate portfolio: no usable non-zero weights")]
  DegeneratePortfolio,

  /// No portfolio instrument appears in the price matrix.
  #[error("portfolio and price matrix share no instrument")]
  EmptyIntersection,

  /// Every date was dropped because no held instrument had a computable return.
  #[error("no date has a computable portfolio return")]
  NoUsableDates,

  /// A timestamp could not be read as an instant.
  #[error("invalid timestamp: {value}")]
  InvalidTimestamp {
    /// Offending text.
    value: String,
  },

  /// A price-matrix column label could not be read as a calendar date.
  #[error("invalid date column: {value}")]
  InvalidDate {
    /// Offending label.
    value: String,
  },

  /// The price matrix has no date column.
  #[error("price matrix has no date columns")]
  NoDateColumns,

  /// Two date columns resolve to the same calendar date.
  #[error("duplicate date column: {date}")]
  DuplicateDate {
    /// The repeated date (ISO format).
    date: String,
  },

  /// Two rows of the price matrix carry the same instrument identifier.
  #[error("duplicate instrument in price matrix: {stock}")]
  DuplicateInstrument {
    /// The repeated identifier.
    stock: String,
  },

  /// A tidy price series repeats the same `(stock, date)` pair.
  #[error("duplicate observation for {stock} on {date}")]
  DuplicateObservation {
    /// Instrument identifier.
    stock: String,
    /// Observation date (ISO format).
    date: String,
  },

  /// A price row does not have one cell per date column.
  #[error("row {stock} has {found} prices, expected {expected}")]
  RaggedRow {
    /// Instrument identifier.
    stock: String,
    /// Number of date columns.
    expected: usize,
    /// Number of cells in the row.
    found: usize,
  },

  /// A rebalance frequency alias is not recognised.
  #[error("unknown rebalance frequency: {value}")]
  InvalidFrequency {
    /// Offending alias.
    value: String,
  },
}

impl PipelineError {
  pub(crate) fn malformed(reason: impl Into<String>) -> Self {
    Self::MalformedResponse {
      reason: reason.into(),
    }
  }

  pub(crate) fn missing_field(field: &str) -> Self {
    Self::SchemaError {
      field: field.to_string(),
    }
  }
}
