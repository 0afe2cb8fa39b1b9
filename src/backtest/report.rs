//! # Return Report
//!
//! $$
//! \text{MDD} = \max_k \frac{\max_{j \le k} V_j - V_k}{\max_{j \le k} V_j},\quad V_k = 1 + C_k
//! $$
//!
//! Summary statistics and a plain-text table for a return series.

use prettytable::Table;
use prettytable::row;
use serde::Serialize;

use super::returns::ReturnSeries;

/// Descriptive statistics of a return series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ReturnSummary {
  /// Number of dated returns.
  pub periods: usize,
  /// Final cumulative return.
  pub total_return: f64,
  /// Arithmetic mean of period returns.
  pub mean_return: f64,
  /// Sample standard deviation of period returns; 0 below two periods.
  pub volatility: f64,
  /// Largest peak-to-trough loss of `1 + cum`, starting from unit wealth.
  pub max_drawdown: f64,
  /// Share of periods with a strictly positive return.
  pub hit_rate: f64,
}

impl ReturnSeries {
  pub fn summary(&self) -> ReturnSummary {
    let rets = self.returns();
    let n = rets.len();
    if n == 0 {
      return ReturnSummary::default();
    }

    let mean = rets.iter().sum::<f64>() / n as f64;
    let volatility = if n > 1 {
      let ss: f64 = rets.iter().map(|r| (r - mean).powi(2)).sum();
      (ss / (n - 1) as f64).sqrt()
    } else {
      0.0
    };

    let mut peak = 1.0_f64;
    let mut max_drawdown = 0.0_f64;
    for p in self.iter() {
      let wealth = 1.0 + p.portfolio_cum;
      peak = peak.max(wealth);
      if peak > 0.0 {
        max_drawdown = max_drawdown.max((peak - wealth) / peak);
      }
    }

    ReturnSummary {
      periods: n,
      total_return: self.total_return(),
      mean_return: mean,
      volatility,
      max_drawdown,
      hit_rate: rets.iter().filter(|r| **r > 0.0).count() as f64 / n as f64,
    }
  }
}

/// Render the summary followed by a per-date table.
pub fn render_report(series: &ReturnSeries) -> String {
  let s = series.summary();

  let mut summary = Table::new();
  summary.set_titles(row!["metric", "value"]);
  summary.add_row(row!["periods", s.periods]);
  summary.add_row(row!["total return", format!("{:.4}%", s.total_return * 100.0)]);
  summary.add_row(row!["mean return", format!("{:.4}%", s.mean_return * 100.0)]);
  summary.add_row(row!["volatility", format!("{:.4}%", s.volatility * 100.0)]);
  summary.add_row(row!["max drawdown", format!("{:.4}%", s.max_drawdown * 100.0)]);
  summary.add_row(row!["hit rate", format!("{:.2}%", s.hit_rate * 100.0)]);

  let mut table = Table::new();
  table.set_titles(row!["date", "portfolio_ret", "portfolio_cum"]);
  for p in series.iter() {
    table.add_row(row![
      p.date,
      format!("{:.6}", p.portfolio_ret),
      format!("{:.6}", p.portfolio_cum)
    ]);
  }

  format!("{summary}\n{table}")
}
