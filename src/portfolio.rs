//! # Portfolio
//!
//! $$
//! w_i' = \frac{w_i}{\sum_j |w_j|},\qquad \sum_i |w_i'| = 1
//! $$
//!
//! Canonical long/short portfolios built from model candidates.

pub mod normalize;
pub mod types;

pub use normalize::normalize;
pub use types::Portfolio;
pub use types::PortfolioRow;
pub use types::Position;
pub use types::portfolio_rows;
