//! Per-request embedding cache.
//!
//! Keyed by question id so repeated lookups within one recommendation request
//! never re-invoke the provider. Scoped to a single request — constructed by
//! the orchestrator, never shared across concurrent callers. Correctness does
//! not depend on hits: every entry can be recomputed from question text.

use std::collections::{HashMap, HashSet};

use crate::embedding::EmbeddingProvider;
use crate::quiz::types::{Question, QuestionId};

pub struct VectorCache<'a> {
    provider: &'a dyn EmbeddingProvider,
    vectors: HashMap<QuestionId, Vec<f32>>,
    failed: HashSet<QuestionId>,
}

impl<'a> VectorCache<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider) -> Self {
        Self {
            provider,
            vectors: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    /// Return the unit-normalized embedding for a question, computing it on
    /// first request. A provider error drops the question for the rest of the
    /// request (logged once, not fatal).
    pub fn embedding_for(&mut self, question: &Question) -> Option<&[f32]> {
        if self.failed.contains(&question.id) {
            return None;
        }
        if !self.vectors.contains_key(&question.id) {
            match self.provider.embed(&question.embedding_text()) {
                Ok(vector) => {
                    self.vectors.insert(question.id, vector);
                }
                Err(error) => {
                    tracing::warn!(
                        question_id = question.id,
                        %error,
                        "embedding failed, dropping question from this request"
                    );
                    self.failed.insert(question.id);
                    return None;
                }
            }
        }
        self.vectors.get(&question.id).map(Vec::as_slice)
    }

    /// All successfully computed embeddings so far.
    pub fn vectors(&self) -> &HashMap<QuestionId, Vec<f32>> {
        &self.vectors
    }

    /// Number of questions the provider failed on in this request.
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}
