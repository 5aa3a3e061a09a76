//! Bigram lookup-table scorer.
//!
//! Loaded from JSON:
//!
//! ```json
//! {
//!   "vocabulary": ["<start>", "<end>", "<unk>", "a", "dog"],
//!   "transitions": {
//!     "<start>": { "a": 0.9, "dog": 0.1 },
//!     "a": { "dog": 1.0 }
//!   }
//! }
//! ```
//!
//! Rows are keyed by the last token of the prefix and renormalized to sum to
//! one. A token with no row (or an all-zero row) is followed by the end token.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::SpecialTokenNames;
use crate::decoding::{SequenceScorer, TokenId};
use crate::error::{PipelineError, ScorerError};

use super::vocabulary::Vocabulary;

#[derive(Debug, Deserialize)]
struct TableFile {
    vocabulary: Vec<String>,
    #[serde(default)]
    transitions: HashMap<String, HashMap<String, f64>>,
}

/// Deterministic scorer backed by a next-token table. Ignores its context.
#[derive(Debug, Clone)]
pub struct TableScorer {
    vocabulary: Vocabulary,
    rows: HashMap<TokenId, Vec<f32>>,
}

impl TableScorer {
    /// Load a table file.
    pub fn load(path: &Path, names: &SpecialTokenNames) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Vocabulary {
            message: format!("Failed to read {:?}: {}", path, e),
        })?;
        let scorer = Self::from_json(&content, names)?;
        tracing::info!(
            "Loaded transition table from {:?}: {} tokens, {} rows",
            path,
            scorer.vocabulary.len(),
            scorer.rows.len()
        );
        Ok(scorer)
    }

    /// Parse a table from its JSON text.
    pub fn from_json(content: &str, names: &SpecialTokenNames) -> Result<Self, PipelineError> {
        let file: TableFile = serde_json::from_str(content).map_err(|e| {
            PipelineError::Vocabulary {
                message: format!("invalid transition table: {e}"),
            }
        })?;
        let vocabulary = Vocabulary::from_tokens(file.vocabulary, names)?;

        let lookup = |token: &str| {
            vocabulary
                .token_to_id(token)
                .ok_or_else(|| PipelineError::Vocabulary {
                    message: format!("transition table references unknown token {token:?}"),
                })
        };

        let mut rows = HashMap::with_capacity(file.transitions.len());
        for (prev, nexts) in &file.transitions {
            let prev_id = lookup(prev)?;
            let mut weights = vec![0.0f64; vocabulary.len()];
            for (next, &weight) in nexts {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(PipelineError::Vocabulary {
                        message: format!("weight {prev:?} -> {next:?} must be finite and >= 0"),
                    });
                }
                weights[lookup(next)? as usize] += weight;
            }

            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                rows.insert(
                    prev_id,
                    weights.iter().map(|w| (w / total) as f32).collect(),
                );
            }
        }

        Ok(Self { vocabulary, rows })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

impl SequenceScorer for TableScorer {
    type Context = ();

    fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn score(&self, _context: &(), prefix: &[TokenId]) -> Result<Vec<f32>, ScorerError> {
        let last = prefix
            .last()
            .ok_or_else(|| ScorerError::InvalidInput("empty prefix".to_string()))?;

        match self.rows.get(last) {
            Some(row) => Ok(row.clone()),
            None => {
                let mut probs = vec![0.0; self.vocabulary.len()];
                probs[self.vocabulary.special().end as usize] = 1.0;
                Ok(probs)
            }
        }
    }
}
