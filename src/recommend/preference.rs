//! Preference vector construction.
//!
//! Folds a scope's answered questions into a single unit vector representing
//! topical affinity. Correct answers pull the preference toward their content
//! with full weight; incorrect answers push away at half strength, so one
//! mistake is not over-penalized.

use std::collections::HashMap;

use crate::embedding::local::l2_normalize;
use crate::quiz::types::{AnswerRecord, QuestionId};

/// Weight applied to a correctly answered question's embedding.
pub const CORRECT_WEIGHT: f32 = 1.0;
/// Weight applied to an incorrectly answered question's embedding.
pub const INCORRECT_WEIGHT: f32 = -0.5;

/// Build the preference vector for a set of answers.
///
/// Answers whose question id has no entry in `embeddings` contribute nothing
/// (fail-soft resolution). The result is either the zero vector (no signal:
/// empty history, nothing resolvable, or perfect cancellation) or unit-length,
/// so a plain dot product against unit candidate embeddings is cosine
/// similarity.
pub fn build_preference(
    answers: &[AnswerRecord],
    embeddings: &HashMap<QuestionId, Vec<f32>>,
    dimensions: usize,
) -> Vec<f32> {
    let mut preference = vec![0.0f32; dimensions];

    for answer in answers {
        let Some(embedding) = embeddings.get(&answer.question_id) else {
            tracing::debug!(
                question_id = answer.question_id,
                "answer skipped — no resolvable embedding"
            );
            continue;
        };
        let weight = if answer.is_correct {
            CORRECT_WEIGHT
        } else {
            INCORRECT_WEIGHT
        };
        for (p, e) in preference.iter_mut().zip(embedding) {
            *p += e * weight;
        }
    }

    // Zero vector stays zero (no ranking signal); anything else is normalized.
    l2_normalize(&preference)
}
