//! Greedy decoding: always take the single most probable next token.

use crate::error::DecodeError;
use crate::math::safe_ln;

use super::beam::Beam;
use super::beam_search::{check_special_tokens, DecodeOutcome, StopReason};
use super::scorer::{validate_distribution, SequenceScorer, SpecialTokens};
use super::top_k::argmax;

/// Greedy decoder. Equivalent to a beam search of width 1 and kept as the
/// reference for it.
#[derive(Debug, Clone)]
pub struct GreedyDecoder {
    max_steps: usize,
    special: SpecialTokens,
    sum_tolerance: Option<f64>,
    length_norm_exponent: f64,
}

impl GreedyDecoder {
    pub fn new(max_steps: usize, special: SpecialTokens) -> Self {
        Self {
            max_steps,
            special,
            sum_tolerance: Some(1e-3),
            length_norm_exponent: 1.0,
        }
    }

    /// Exponent used for the reported `normalized_score`.
    pub fn with_length_exponent(mut self, alpha: f64) -> Self {
        self.length_norm_exponent = alpha;
        self
    }

    /// Override the distribution sum check (`None` disables it).
    pub fn with_sum_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.sum_tolerance = tolerance;
        self
    }

    pub fn decode<S>(&self, scorer: &S, context: &S::Context) -> Result<DecodeOutcome, DecodeError>
    where
        S: SequenceScorer + ?Sized,
    {
        if self.max_steps < 1 {
            return Err(DecodeError::InvalidConfiguration(
                "max_steps must be >= 1".into(),
            ));
        }
        let alpha = self.length_norm_exponent;
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(DecodeError::InvalidConfiguration(format!(
                "length_norm_exponent must be a positive finite number (got {alpha})"
            )));
        }
        let vocab_size = scorer.vocab_size();
        check_special_tokens(self.special, vocab_size)?;

        let mut beam = Beam::seed(self.special.start);
        let mut stop_reason = StopReason::MaxSteps;
        let mut steps = 0;

        for step in 0..self.max_steps {
            let failure = |message: String| DecodeError::ScoringFailure {
                step,
                prefix: beam.tokens().to_vec(),
                message,
            };
            let probs = scorer
                .score(context, beam.tokens())
                .map_err(|e| failure(e.to_string()))?;
            validate_distribution(&probs, vocab_size, self.sum_tolerance).map_err(failure)?;

            let (token, p) = argmax(&probs)
                .ok_or_else(|| failure("empty distribution".to_string()))?;
            beam = beam.extend(token, safe_ln(p), self.special.end);
            steps = step + 1;

            if beam.is_finished() {
                stop_reason = StopReason::AllFinished;
                break;
            }
        }

        Ok(DecodeOutcome::from_beam(
            &beam,
            self.special,
            alpha,
            stop_reason,
            steps,
            steps,
        ))
    }
}
