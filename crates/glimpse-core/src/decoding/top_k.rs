//! Top-k selection over a probability vector.

use std::cmp::Ordering;

use super::scorer::TokenId;

/// Descending by probability, then ascending by id.
fn by_probability_then_id(a: &(TokenId, f32), b: &(TokenId, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// The `k` most probable tokens, highest first. Equal probabilities resolve to
/// the lower token id.
///
/// Uses partial selection so only the kept prefix is fully sorted.
pub fn top_k(probs: &[f32], k: usize) -> Vec<(TokenId, f32)> {
    if probs.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut indexed: Vec<(TokenId, f32)> = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| (i as TokenId, p))
        .collect();

    if k < indexed.len() {
        indexed.select_nth_unstable_by(k - 1, by_probability_then_id);
        indexed.truncate(k);
    }
    indexed.sort_unstable_by(by_probability_then_id);
    indexed
}

/// The single most probable token, ties to the lower id.
pub fn argmax(probs: &[f32]) -> Option<(TokenId, f32)> {
    probs
        .iter()
        .enumerate()
        .map(|(i, &p)| (i as TokenId, p))
        .min_by(by_probability_then_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_orders_descending() {
        let top = top_k(&[0.1, 0.5, 0.15, 0.25], 3);
        assert_eq!(top.iter().map(|t| t.0).collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_top_k_ties_prefer_lower_id() {
        let top = top_k(&[0.0, 0.3, 0.3, 0.3, 0.1], 2);
        assert_eq!(top, vec![(1, 0.3), (2, 0.3)]);
    }

    #[test]
    fn test_top_k_larger_than_vocab() {
        let top = top_k(&[0.2, 0.8], 5);
        assert_eq!(top, vec![(1, 0.8), (0, 0.2)]);
    }

    #[test]
    fn test_top_k_zero() {
        assert!(top_k(&[1.0], 0).is_empty());
        assert!(top_k(&[], 3).is_empty());
    }

    #[test]
    fn test_argmax_ties() {
        assert_eq!(argmax(&[0.25, 0.25, 0.5, 0.5]), Some((2, 0.5)));
        assert_eq!(argmax(&[]), None);
    }
}
