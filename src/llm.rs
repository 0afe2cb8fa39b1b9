//! # Language-Model Boundary
//!
//! $$
//! \text{headlines} \xrightarrow{\text{prompt}} \text{model} \xrightarrow{\text{text}} [\{\text{stock}, w\}]
//! $$
//!
//! Request shaping for the selection model and recovery of its free-form answer.
//! The transport itself is supplied by the caller through [`PortfolioSelector`].

pub mod parser;
pub mod prompt;
pub mod selector;

pub use parser::CandidatePosition;
pub use parser::extract_bracketed;
pub use parser::parse_array;
pub use parser::parse_strict;
pub use parser::strip_code_fences;
pub use prompt::ChatMessage;
pub use prompt::ChatOptions;
pub use prompt::ChatRequest;
pub use prompt::ChatResponse;
pub use prompt::LlmConfig;
pub use prompt::build_prompt;
pub use prompt::extract_content;
pub use selector::PortfolioSelector;
pub use selector::ReplaySelector;
pub use selector::SelectionRequest;
