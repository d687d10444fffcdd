//! Quiz question service with embedding-based personalized recommendations.
//!
//! quizrec serves quiz questions fetched from an external provider and
//! recommends unseen questions based on each user's answer history. The
//! recommendation engine embeds question text into unit vectors, folds a
//! scope's answers into a preference vector weighted by correctness, and
//! ranks candidates by cosine similarity.
//!
//! # Architecture
//!
//! - **Storage**: SQLite (sessions, questions, answers); embeddings are
//!   derived per request, never persisted
//! - **Embeddings**: Local ONNX Runtime with bge-small-en-v1.5
//!   (512 dimensions, CLS pooling, L2-normalized)
//! - **Engine**: preference vector from correctness-weighted answer history,
//!   dot-product ranking over a per-request vector cache
//! - **Transport**: HTTP via axum
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`embedding`] — Text-to-vector embedding pipeline via ONNX Runtime
//! - [`quiz`] — Domain types and the SQLite history store
//! - [`quizapi`] — Client for the external question provider
//! - [`recommend`] — The recommendation engine: cache, preference, ranking, orchestrator

pub mod config;
pub mod db;
pub mod embedding;
pub mod quiz;
pub mod quizapi;
pub mod recommend;
