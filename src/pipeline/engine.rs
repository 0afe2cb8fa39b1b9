//! # Pipeline Engine
//!
//! $$
//! t \mapsto \operatorname{normalize}\big(\operatorname{parse}(\operatorname{select}(W(t, L)))\big)
//! $$
//!
//! High-level orchestration: one portfolio per formation date, then evaluation
//! against a price matrix. Formation dates are independent and run in parallel.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use chrono::DateTime;
use chrono::Utc;
use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::backtest::PriceMatrix;
use crate::backtest::ReturnSeries;
use crate::backtest::daily_returns;
use crate::error::PipelineError;
use crate::llm::PortfolioSelector;
use crate::llm::SelectionRequest;
use crate::llm::parse_array;
use crate::news::HeadlineCorpus;
use crate::portfolio::Portfolio;
use crate::portfolio::normalize;

/// What to do when one formation date fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Record the failure and carry on with the other dates.
  #[default]
  Skip,
  /// Stop and return the earliest failure.
  Abort,
}

/// Runtime configuration for [`PipelineEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Trailing news window length in days.
  pub lookback_days: u32,
  /// Number of positions requested from the model.
  pub positions: usize,
  /// Investable universe named in the prompt.
  pub universe_hint: String,
  /// Reaction to a failed formation date.
  pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      lookback_days: 7,
      positions: 20,
      universe_hint: "S&P 500".to_string(),
      failure_policy: FailurePolicy::Skip,
    }
  }
}

/// Why a formation date produced no portfolio.
#[derive(Debug, Error)]
pub enum FormationError {
  /// The selector (model transport) failed.
  #[error("selector failed: {0:#}")]
  Selector(anyhow::Error),
  /// The model answer could not be turned into a portfolio.
  #[error(transparent)]
  Pipeline(#[from] PipelineError),
}

/// A failed formation date.
#[derive(Debug, Error)]
#[error("formation on {asof} failed: {error}")]
pub struct FormationFailure {
  pub asof: DateTime<Utc>,
  #[source]
  pub error: FormationError,
}

/// Result of one formation date.
#[derive(Debug)]
pub enum FormationOutcome {
  /// Portfolio formed and tagged with its date.
  Formed(Portfolio),
  /// Empty news window; nothing was asked.
  Skipped { asof: DateTime<Utc> },
  /// Selection, parsing or normalisation failed.
  Failed(FormationFailure),
}

impl FormationOutcome {
  pub fn asof(&self) -> Option<DateTime<Utc>> {
    match self {
      Self::Formed(p) => p.formation_date(),
      Self::Skipped { asof } => Some(*asof),
      Self::Failed(failure) => Some(failure.asof),
    }
  }
}

/// Portfolios of a formation run, in the order the dates were supplied.
#[derive(Debug, Default)]
pub struct FormationReport {
  pub portfolios: Vec<Portfolio>,
  pub skipped: Vec<DateTime<Utc>>,
  pub failures: Vec<FormationFailure>,
}

/// Single entry-point engine for formation and evaluation.
#[derive(Clone, Debug)]
pub struct PipelineEngine {
  config: PipelineConfig,
}

impl PipelineEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PipelineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  /// Selection request for `asof`, or `None` when the news window is empty.
  pub fn request(&self, corpus: &HeadlineCorpus, asof: DateTime<Utc>) -> Option<SelectionRequest> {
    let headlines = corpus.window(&asof, self.config.lookback_days).render();
    if headlines.trim().is_empty() {
      return None;
    }

    Some(SelectionRequest::new(
      asof,
      headlines,
      self.config.universe_hint.clone(),
      self.config.positions,
    ))
  }

  /// Form the portfolio for one date.
  pub fn form_portfolio<S>(
    &self,
    corpus: &HeadlineCorpus,
    asof: DateTime<Utc>,
    selector: &S,
  ) -> FormationOutcome
  where
    S: PortfolioSelector + ?Sized,
  {
    let Some(request) = self.request(corpus, asof) else {
      return FormationOutcome::Skipped { asof };
    };

    let fail = |error: FormationError| FormationOutcome::Failed(FormationFailure { asof, error });

    let raw = match selector.select(&request) {
      Ok(raw) => raw,
      Err(e) => return fail(FormationError::Selector(e)),
    };

    match parse_array(&raw).and_then(|candidates| normalize(&candidates)) {
      Ok(portfolio) => FormationOutcome::Formed(portfolio.with_formation_date(asof)),
      Err(e) => fail(e.into()),
    }
  }

  /// Form portfolios for every date in parallel.
  ///
  /// Under [`FailurePolicy::Abort`] the earliest failing date (in `dates`
  /// order) is returned as the error. Once a date has failed, later dates
  /// that have not started yet are not sent to the selector; dates already
  /// in flight still complete.
  pub fn form_portfolios<S>(
    &self,
    corpus: &HeadlineCorpus,
    dates: &[DateTime<Utc>],
    selector: &S,
  ) -> Result<FormationReport, FormationFailure>
  where
    S: PortfolioSelector + ?Sized,
  {
    let abort = self.config.failure_policy == FailurePolicy::Abort;
    let first_failure = AtomicUsize::new(usize::MAX);

    let outcomes: Vec<Option<FormationOutcome>> = dates
      .par_iter()
      .enumerate()
      .map(|(i, asof)| {
        if abort && i > first_failure.load(Ordering::Acquire) {
          return None;
        }
        let outcome = self.form_portfolio(corpus, *asof, selector);
        if abort && matches!(outcome, FormationOutcome::Failed(_)) {
          first_failure.fetch_min(i, Ordering::AcqRel);
        }
        Some(outcome)
      })
      .collect();

    let mut report = FormationReport::default();
    // every date before the earliest failure ran, so cancelled slots come after it
    for outcome in outcomes.into_iter().flatten() {
      match outcome {
        FormationOutcome::Formed(p) => report.portfolios.push(p),
        FormationOutcome::Skipped { asof } => report.skipped.push(asof),
        FormationOutcome::Failed(failure) => {
          warn!(asof = %failure.asof, error = %failure.error, "formation failed");
          if self.config.failure_policy == FailurePolicy::Abort {
            return Err(failure);
          }
          report.failures.push(failure);
        }
      }
    }

    info!(
      formed = report.portfolios.len(),
      skipped = report.skipped.len(),
      failed = report.failures.len(),
      "formation run finished"
    );
    Ok(report)
  }

  /// Daily and cumulative returns of one portfolio.
  pub fn evaluate(
    &self,
    prices: &PriceMatrix,
    portfolio: &Portfolio,
  ) -> Result<ReturnSeries, PipelineError> {
    daily_returns(prices, portfolio)
  }

  /// Evaluate several portfolios in parallel; results follow input order.
  pub fn evaluate_all(
    &self,
    prices: &PriceMatrix,
    portfolios: &[Portfolio],
  ) -> Vec<Result<ReturnSeries, PipelineError>> {
    portfolios
      .par_iter()
      .map(|p| daily_returns(prices, p))
      .collect()
  }
}
