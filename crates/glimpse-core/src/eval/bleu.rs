//! Sentence-level BLEU.
//!
//! Geometric mean of clipped n-gram precisions for n = 1..=4, each smoothed
//! as `ln(p + 1e-10)`, times a brevity penalty against the shortest
//! reference.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Largest n-gram order scored.
pub const MAX_ORDER: usize = 4;

/// Added to each precision before the log so a zero precision stays finite.
const SMOOTHING: f64 = 1e-10;

/// A BLEU score and its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BleuScore {
    /// Final score in [0, 1]
    pub score: f64,

    /// Clipped precision per order, index 0 = unigrams
    pub precisions: [f64; MAX_ORDER],

    pub brevity_penalty: f64,

    pub hypothesis_len: usize,

    /// Length of the shortest reference
    pub reference_len: usize,
}

impl BleuScore {
    fn zero(hypothesis_len: usize, reference_len: usize) -> Self {
        Self {
            score: 0.0,
            precisions: [0.0; MAX_ORDER],
            brevity_penalty: 0.0,
            hypothesis_len,
            reference_len,
        }
    }
}

fn ngram_counts<'w, 's>(words: &'w [&'s str], n: usize) -> HashMap<&'w [&'s str], usize> {
    let mut counts = HashMap::new();
    for gram in words.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Matched n-grams over hypothesis n-grams, each hypothesis n-gram clipped
/// to its largest count in any one reference.
fn clipped_precision(hypothesis: &[&str], references: &[Vec<&str>], n: usize) -> f64 {
    let hyp_counts = ngram_counts(hypothesis, n);
    let total: usize = hyp_counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let ref_counts: Vec<_> = references.iter().map(|r| ngram_counts(r, n)).collect();
    let matched: usize = hyp_counts
        .iter()
        .map(|(gram, &count)| {
            let max_ref = ref_counts
                .iter()
                .filter_map(|counts| counts.get(gram).copied())
                .max()
                .unwrap_or(0);
            count.min(max_ref)
        })
        .sum();

    matched as f64 / total as f64
}

/// `1` when the hypothesis is longer than the reference, else
/// `exp(1 - ref/hyp)`.
fn brevity_penalty(hypothesis_len: usize, reference_len: usize) -> f64 {
    if hypothesis_len > reference_len {
        1.0
    } else {
        (1.0 - reference_len as f64 / hypothesis_len as f64).exp()
    }
}

/// BLEU of a tokenized hypothesis against tokenized references.
pub fn sentence_bleu(hypothesis: &[&str], references: &[Vec<&str>]) -> BleuScore {
    let reference_len = references.iter().map(Vec::len).min().unwrap_or(0);
    if hypothesis.is_empty() || references.is_empty() {
        return BleuScore::zero(hypothesis.len(), reference_len);
    }

    let mut precisions = [0.0; MAX_ORDER];
    let mut log_sum = 0.0;
    for (i, precision) in precisions.iter_mut().enumerate() {
        *precision = clipped_precision(hypothesis, references, i + 1);
        log_sum += (*precision + SMOOTHING).ln();
    }

    let brevity_penalty = brevity_penalty(hypothesis.len(), reference_len);
    let score = brevity_penalty * (log_sum / MAX_ORDER as f64).exp();

    BleuScore {
        score,
        precisions,
        brevity_penalty,
        hypothesis_len: hypothesis.len(),
        reference_len,
    }
}

/// BLEU over whitespace-tokenized strings.
pub fn sentence_bleu_text<S: AsRef<str>>(hypothesis: &str, references: &[S]) -> BleuScore {
    let hyp: Vec<&str> = hypothesis.split_whitespace().collect();
    let refs: Vec<Vec<&str>> = references
        .iter()
        .map(|r| r.as_ref().split_whitespace().collect())
        .collect();
    sentence_bleu(&hyp, &refs)
}
