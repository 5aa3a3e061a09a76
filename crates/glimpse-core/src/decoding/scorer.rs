//! The next-token scoring contract the search runs against.

use serde::{Deserialize, Serialize};

use crate::error::ScorerError;

/// Index into the vocabulary.
pub type TokenId = u32;

/// Reserved token ids the search and renderer need to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    pub start: TokenId,
    pub end: TokenId,
    pub unknown: TokenId,
}

/// Produces a probability distribution over the vocabulary for the next token.
///
/// Implementations must be pure functions of `(context, prefix)`: the whole
/// prefix is passed on every call, so any recurrent state has to be rebuilt
/// from it. `Sync` is required so the beams of one step can be scored from
/// several threads.
pub trait SequenceScorer: Sync {
    /// Per-request conditioning input, passed unchanged at every step.
    type Context: ?Sized + Sync;

    /// Number of entries in every returned distribution.
    fn vocab_size(&self) -> usize;

    /// Return `p(next | context, prefix)` indexed by token id.
    fn score(&self, context: &Self::Context, prefix: &[TokenId]) -> Result<Vec<f32>, ScorerError>;
}

/// Check a scorer output before it enters the search.
///
/// `sum_tolerance` of `None` skips the sum check for scorers that return
/// unnormalized mass; cardinality and sign are always checked.
pub fn validate_distribution(
    probs: &[f32],
    vocab_size: usize,
    sum_tolerance: Option<f64>,
) -> Result<(), String> {
    if probs.len() != vocab_size {
        return Err(format!(
            "distribution has {} entries, vocabulary has {}",
            probs.len(),
            vocab_size
        ));
    }

    let mut sum = 0.0f64;
    for (id, &p) in probs.iter().enumerate() {
        if !p.is_finite() {
            return Err(format!("probability for token {id} is not finite ({p})"));
        }
        if p < 0.0 {
            return Err(format!("probability for token {id} is negative ({p})"));
        }
        sum += p as f64;
    }

    if let Some(tolerance) = sum_tolerance {
        if (sum - 1.0).abs() > tolerance {
            return Err(format!(
                "probabilities sum to {sum:.6}, expected 1 (tolerance {tolerance})"
            ));
        }
    }

    Ok(())
}
