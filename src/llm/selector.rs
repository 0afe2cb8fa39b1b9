//! # Portfolio Selector
//!
//! $$
//! \text{select}: (t_0, W(t_0, L)) \to \text{raw text}
//! $$
//!
//! Seam between the deterministic pipeline and whatever produces model text.

use std::collections::BTreeMap;

use anyhow::Result;
use anyhow::anyhow;
use chrono::DateTime;
use chrono::Utc;
use impl_new_derive::ImplNew;

use super::prompt::ChatMessage;
use super::prompt::build_prompt;

/// Everything a selector needs to ask for one formation date.
#[derive(ImplNew, Clone, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
  /// Formation date.
  pub asof: DateTime<Utc>,
  /// Rendered news window.
  pub headlines: String,
  /// Investable universe named in the prompt.
  pub universe_hint: String,
  /// Requested number of positions.
  pub positions: usize,
}

impl SelectionRequest {
  /// Chat turns for this request.
  pub fn messages(&self) -> Vec<ChatMessage> {
    build_prompt(&self.headlines, &self.universe_hint, self.positions)
  }
}

/// Produces raw model text for a selection request.
///
/// Implementations own transport, timeouts and retries. Must be shareable
/// across threads since formation dates are processed in parallel.
pub trait PortfolioSelector: Send + Sync {
  fn select(&self, request: &SelectionRequest) -> Result<String>;
}

impl<F> PortfolioSelector for F
where
  F: Fn(&SelectionRequest) -> Result<String> + Send + Sync,
{
  fn select(&self, request: &SelectionRequest) -> Result<String> {
    self(request)
  }
}

/// Replays recorded model answers, keyed by formation date.
#[derive(Clone, Debug, Default)]
pub struct ReplaySelector {
  fallback: Option<String>,
  recorded: BTreeMap<DateTime<Utc>, String>,
}

impl ReplaySelector {
  /// Empty replay; every request fails until responses are recorded.
  pub fn new() -> Self {
    Self::default()
  }

  /// Answer every request with the same text.
  pub fn constant(response: impl Into<String>) -> Self {
    Self {
      fallback: Some(response.into()),
      recorded: BTreeMap::new(),
    }
  }

  /// Record the answer for one formation date.
  pub fn with_response(mut self, asof: DateTime<Utc>, response: impl Into<String>) -> Self {
    self.recorded.insert(asof, response.into());
    self
  }
}

impl PortfolioSelector for ReplaySelector {
  fn select(&self, request: &SelectionRequest) -> Result<String> {
    self
      .recorded
      .get(&request.asof)
      .or(self.fallback.as_ref())
      .cloned()
      .ok_or_else(|| anyhow!("no recorded response for {}", request.asof))
  }
}
