//! The recommendation engine.
//!
//! Turns one scope's answer history into a ranked, de-duplicated list of
//! unseen questions. Four parts, data flowing one direction:
//!
//! - [`cache`] — per-request memoization of question embeddings
//! - [`preference`] — folds answers into a single preference vector,
//!   weighted by correctness
//! - [`rank`] — cosine scoring, exclusion of answered questions, top-K
//! - [`engine`] — the orchestrator wiring a [`HistoryStore`] and an
//!   embedding provider through the three pure stages
//!
//! Only the orchestrator performs I/O; the other three are pure functions
//! over their inputs.

pub mod cache;
pub mod engine;
pub mod preference;
pub mod rank;

pub use engine::{recommend, HistoryStore, RecommendError, RecommendOptions, RecommendScope};
