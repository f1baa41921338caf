use std::cmp::Ordering;

/// Orders class indices by descending score, ascending index among equal
/// scores. Callers must reject non-finite scores first.
pub(crate) fn rank_indices(scores: &[f32]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| descending(scores[a], scores[b]).then(a.cmp(&b)));
    indices
}

/// Indices of the `k` highest scores, in rank order.
pub(crate) fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut ranked = rank_indices(scores);
    ranked.truncate(k);
    ranked
}

fn descending(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
