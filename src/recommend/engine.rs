//! Recommendation orchestrator.
//!
//! [`recommend`] is the single entry point. It wires an injected
//! [`HistoryStore`] and [`EmbeddingProvider`] through the pure stages: load
//! the scope's answer history, embed the candidate page through a fresh
//! per-request [`VectorCache`], fold the history into a preference vector,
//! rank unseen candidates, and return the winners as full questions.
//!
//! Failure semantics: store or provider unavailability aborts the request
//! with a typed [`RecommendError`]; an individual question that fails to
//! resolve or embed is dropped with a warning and never blocks the rest.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::embedding::EmbeddingProvider;
use crate::quiz::types::{AnswerRecord, Question, QuestionId};
use crate::recommend::cache::VectorCache;
use crate::recommend::{preference, rank};

/// Whose history drives the recommendation. Always explicit — never inferred
/// from "the most recent session", which breaks under concurrent users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendScope {
    /// One answering session.
    Session(String),
    /// All sessions of one user.
    User(String),
}

impl std::fmt::Display for RecommendScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(id) => write!(f, "session:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// The reads the engine needs from persistent history. Implemented for
/// `rusqlite::Connection`; tests substitute fakes.
pub trait HistoryStore {
    /// The scope's most recent answers, newest first, capped at `window`.
    fn answers_for_scope(
        &self,
        scope: &RecommendScope,
        window: usize,
    ) -> anyhow::Result<Vec<AnswerRecord>>;

    /// The candidate page: most recently ingested questions, newest first.
    fn recent_questions(&self, cap: usize) -> anyhow::Result<Vec<Question>>;

    /// Batch lookup by id. Missing ids are absent from the result, not errors.
    fn questions_by_ids(
        &self,
        ids: &[QuestionId],
    ) -> anyhow::Result<HashMap<QuestionId, Question>>;
}

/// Whole-request-fatal conditions. Per-item gaps (a dangling question
/// reference, one failed embedding) are absorbed upstream and never reach
/// the caller.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("history store unavailable: {0}")]
    Store(#[source] anyhow::Error),
    #[error("embedding provider unavailable: {0}")]
    Embedding(#[source] anyhow::Error),
}

/// Tuning knobs, sourced from [`RecommendConfig`](crate::config::RecommendConfig).
#[derive(Debug, Clone, Copy)]
pub struct RecommendOptions {
    pub history_window: usize,
    pub candidate_cap: usize,
    pub limit: usize,
}

/// Produce up to `limit` unseen questions ranked by similarity to the scope's
/// inferred preference, in descending order.
pub fn recommend(
    store: &dyn HistoryStore,
    embedder: &dyn EmbeddingProvider,
    scope: &RecommendScope,
    options: &RecommendOptions,
) -> Result<Vec<Question>, RecommendError> {
    // 1. Scope's answer history, bounded window
    let answers = store
        .answers_for_scope(scope, options.history_window)
        .map_err(RecommendError::Store)?;

    // 2. Candidate page
    let candidates = store
        .recent_questions(options.candidate_cap)
        .map_err(RecommendError::Store)?;

    // 3. Embed candidates through a request-scoped cache; individual failures
    //    drop the question, a clean sweep of failures means the provider is down
    let mut cache = VectorCache::new(embedder);
    let mut embedded: Vec<(QuestionId, Vec<f32>)> = Vec::with_capacity(candidates.len());
    for question in &candidates {
        if let Some(vector) = cache.embedding_for(question) {
            embedded.push((question.id, vector.to_vec()));
        }
    }
    if !candidates.is_empty() && embedded.is_empty() {
        return Err(RecommendError::Embedding(anyhow::anyhow!(
            "all {} candidate embeddings failed",
            candidates.len()
        )));
    }

    // 4. Resolve answered questions that fell outside the candidate page so
    //    they still shape the preference; unresolvable ones are dropped
    let candidate_ids: HashSet<QuestionId> = candidates.iter().map(|q| q.id).collect();
    let mut seen = HashSet::new();
    let missing: Vec<QuestionId> = answers
        .iter()
        .map(|a| a.question_id)
        .filter(|id| !candidate_ids.contains(id) && seen.insert(*id))
        .collect();
    if !missing.is_empty() {
        let resolved = store
            .questions_by_ids(&missing)
            .map_err(RecommendError::Store)?;
        let unresolvable = missing.len() - resolved.len();
        if unresolvable > 0 {
            tracing::warn!(
                %scope,
                count = unresolvable,
                "answers reference questions no longer in the store, skipping"
            );
        }
        for question in resolved.values() {
            let _ = cache.embedding_for(question);
        }
    }

    // 5. Preference vector from the scope's history
    let preference =
        preference::build_preference(&answers, cache.vectors(), embedder.dimensions());

    // 6. Rank, excluding everything the scope already answered
    let exclude: HashSet<QuestionId> = answers.iter().map(|a| a.question_id).collect();
    let ranked = rank::rank(&embedded, &preference, &exclude, options.limit);

    // 7. Winners in ranked order, as full questions
    let mut by_id: HashMap<QuestionId, Question> =
        candidates.into_iter().map(|q| (q.id, q)).collect();
    let results: Vec<Question> = ranked.iter().filter_map(|id| by_id.remove(id)).collect();

    tracing::debug!(
        %scope,
        answers = answers.len(),
        candidates = candidate_ids.len(),
        embed_failures = cache.failure_count(),
        returned = results.len(),
        "recommendation complete"
    );

    Ok(results)
}
