//! # Pipeline
//!
//! $$
//! \{t_k\} \to \{\mathbf{w}(t_k)\} \to \{R_p(t_k, \cdot)\}
//! $$
//!
//! Rebalance schedule, batch portfolio formation and evaluation.

pub mod engine;
pub mod schedule;

pub use engine::FailurePolicy;
pub use engine::FormationError;
pub use engine::FormationFailure;
pub use engine::FormationOutcome;
pub use engine::FormationReport;
pub use engine::PipelineConfig;
pub use engine::PipelineEngine;
pub use schedule::RebalanceFrequency;
pub use schedule::rebalance_dates;

pub use crate::portfolio::portfolio_rows;
