//! # Backtest
//!
//! $$
//! R_{p,k} = \sum_i w_i \frac{P_{i,k} - P_{i,k-1}}{P_{i,k-1}},\qquad
//! C_k = \prod_{j \le k} (1 + R_{p,j}) - 1
//! $$
//!
//! Wide price matrix, daily and cumulative portfolio returns, and a text report.

pub mod price_matrix;
pub mod report;
pub mod returns;

pub use price_matrix::PriceMatrix;
pub use price_matrix::parse_date_label;
pub use report::ReturnSummary;
pub use report::render_report;
pub use returns::ReturnPoint;
pub use returns::ReturnSeries;
pub use returns::daily_returns;
pub use returns::simple_return;
