//! # headline-portfolio
//!
//! Long/short equity portfolios selected by a language model from recent
//! news headlines, and their daily backtest against a wide price matrix.
//!
//! - [`news`]: headline corpus and trailing news windows
//! - [`llm`]: prompt shaping, selector seam and tolerant answer parsing
//! - [`portfolio`]: candidate validation and gross-exposure normalisation
//! - [`backtest`]: price matrix, daily/cumulative returns and a text report
//! - [`pipeline`]: rebalance schedule and batch formation

pub mod backtest;
pub mod error;
pub mod llm;
pub mod news;
pub mod pipeline;
pub mod portfolio;

pub use error::PipelineError;
