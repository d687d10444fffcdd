//! Similarity ranking.
//!
//! Scores candidate embeddings against a preference vector and returns the
//! top-K unseen question ids. Candidates arrive as an ordered slice, not a
//! map: ties (including the all-zero-preference case) fall back to input
//! order via a stable sort, so identical input always yields identical
//! output.

use std::collections::HashSet;

use crate::quiz::types::QuestionId;

/// Dot product. Both operands are unit vectors (or zero), so this is cosine
/// similarity; against a zero preference every candidate scores 0.0.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Rank candidates descending by similarity to `preference`, skipping ids in
/// `exclude`, returning at most `limit` ids. Empty input, full exclusion, or
/// `limit == 0` all yield an empty vec, never an error.
pub fn rank(
    candidates: &[(QuestionId, Vec<f32>)],
    preference: &[f32],
    exclude: &HashSet<QuestionId>,
    limit: usize,
) -> Vec<QuestionId> {
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(QuestionId, f32)> = candidates
        .iter()
        .filter(|(id, _)| !exclude.contains(id))
        .map(|(id, embedding)| (*id, dot(embedding, preference)))
        .collect();

    // Stable sort keeps candidate order on equal scores
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    scored.into_iter().take(limit).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_exclusions() -> HashSet<QuestionId> {
        HashSet::new()
    }

    #[test]
    fn ranks_by_descending_similarity() {
        // Preference [0.894, -0.447]: candidate along e1 scores 0.894,
        // candidate along e2 scores -0.447
        let candidates = vec![(4, vec![0.0, 1.0]), (3, vec![1.0, 0.0])];
        let preference = vec![0.894, -0.447];

        let ranked = rank(&candidates, &preference, &no_exclusions(), 2);
        assert_eq!(ranked, vec![3, 4]);
    }

    #[test]
    fn excluded_ids_never_returned() {
        let candidates = vec![(1, vec![1.0, 0.0]), (2, vec![0.9, 0.1]), (3, vec![0.0, 1.0])];
        let exclude: HashSet<QuestionId> = [1, 2].into_iter().collect();

        let ranked = rank(&candidates, &[1.0, 0.0], &exclude, 10);
        assert_eq!(ranked, vec![3]);
    }

    #[test]
    fn output_length_is_min_of_limit_and_remaining() {
        let candidates = vec![(1, vec![1.0]), (2, vec![0.5]), (3, vec![0.2])];
        let exclude: HashSet<QuestionId> = [2].into_iter().collect();

        assert_eq!(rank(&candidates, &[1.0], &no_exclusions(), 2).len(), 2);
        assert_eq!(rank(&candidates, &[1.0], &exclude, 10).len(), 2);
    }

    #[test]
    fn all_excluded_returns_empty() {
        let candidates = vec![(1, vec![1.0]), (2, vec![0.5])];
        let exclude: HashSet<QuestionId> = [1, 2].into_iter().collect();
        assert!(rank(&candidates, &[1.0], &exclude, 5).is_empty());
    }

    #[test]
    fn zero_limit_returns_empty() {
        let candidates = vec![(1, vec![1.0])];
        assert!(rank(&candidates, &[1.0], &no_exclusions(), 0).is_empty());
    }

    #[test]
    fn empty_candidates_return_empty() {
        assert!(rank(&[], &[1.0], &no_exclusions(), 5).is_empty());
    }

    #[test]
    fn zero_preference_keeps_input_order() {
        let candidates = vec![(7, vec![0.0, 1.0]), (3, vec![1.0, 0.0]), (5, vec![0.7, 0.7])];
        let ranked = rank(&candidates, &[0.0, 0.0], &no_exclusions(), 3);
        assert_eq!(ranked, vec![7, 3, 5]);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let candidates = vec![(1, vec![0.5, 0.5]), (2, vec![0.5, 0.5]), (3, vec![0.1, 0.9])];
        let preference = vec![0.707, 0.707];
        let first = rank(&candidates, &preference, &no_exclusions(), 3);
        for _ in 0..10 {
            assert_eq!(rank(&candidates, &preference, &no_exclusions(), 3), first);
        }
    }
}
