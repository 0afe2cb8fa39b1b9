//! # News
//!
//! $$
//! W(t_0, L) = \{\, h \in \mathcal{H} : t_0 - L < t_h \le t_0 \,\}
//! $$
//!
//! Headline corpus and the trailing news window fed to the selection model.

pub mod corpus;
pub mod window;

pub use corpus::Headline;
pub use corpus::HeadlineCorpus;
pub use corpus::parse_instant;
pub use window::NewsWindow;
pub use window::build_window;
