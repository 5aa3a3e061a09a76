//! Beam search over a [`SequenceScorer`].
//!
//! Each step scores every unfinished beam, expands it by its `beam_width` most
//! probable next tokens, merges the expansions with the finished beams carried
//! over from the previous step, and keeps the best `beam_width` of the pool.
//! The search stops when every kept beam has emitted the end token, when
//! `max_steps` is reached, or when the optional wall-clock limit expires.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DecodingConfig, TimeoutPolicy};
use crate::error::DecodeError;
use crate::math::safe_ln;

use super::beam::{Beam, BeamFrontier};
use super::scorer::{validate_distribution, SequenceScorer, SpecialTokens, TokenId};
use super::top_k::top_k;

/// Why the search loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every beam in the frontier emitted the end token.
    AllFinished,
    /// The step bound was reached.
    MaxSteps,
    /// The wall-clock limit expired between steps.
    Deadline,
}

/// The selected caption and how the search got there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeOutcome {
    /// Caption token ids, without the start token or a trailing end token
    pub tokens: Vec<TokenId>,

    /// Cumulative log-probability of the selected beam
    pub log_prob: f64,

    /// `log_prob / len^alpha`, the value the beam was selected by
    pub normalized_score: f64,

    /// Whether the selected beam emitted the end token
    pub finished: bool,

    /// Set when the search was cut short by the wall-clock limit
    pub truncated: bool,

    /// Why the loop ended
    pub stop_reason: StopReason,

    /// Steps completed
    pub steps: usize,

    /// Number of scorer invocations
    pub scorer_calls: usize,
}

impl DecodeOutcome {
    pub(crate) fn from_beam(
        beam: &Beam,
        special: SpecialTokens,
        alpha: f64,
        stop_reason: StopReason,
        steps: usize,
        scorer_calls: usize,
    ) -> Self {
        Self {
            tokens: beam.caption_tokens(special.end).to_vec(),
            log_prob: beam.log_prob(),
            normalized_score: beam.normalized_score(alpha),
            finished: beam.is_finished(),
            truncated: stop_reason == StopReason::Deadline,
            stop_reason,
            steps,
            scorer_calls,
        }
    }
}

impl DecodingConfig {
    /// Range-check the search parameters.
    pub fn check(&self) -> Result<(), DecodeError> {
        if self.beam_width < 1 {
            return Err(DecodeError::InvalidConfiguration(
                "beam_width must be >= 1".into(),
            ));
        }
        if self.max_steps < 1 {
            return Err(DecodeError::InvalidConfiguration(
                "max_steps must be >= 1".into(),
            ));
        }
        if !self.length_norm_exponent.is_finite() || self.length_norm_exponent <= 0.0 {
            return Err(DecodeError::InvalidConfiguration(format!(
                "length_norm_exponent must be a positive finite number (got {})",
                self.length_norm_exponent
            )));
        }
        if self.timeout_ms == Some(0) {
            return Err(DecodeError::InvalidConfiguration(
                "timeout_ms must be > 0 when set".into(),
            ));
        }
        if self.check_sum && (!self.sum_tolerance.is_finite() || self.sum_tolerance <= 0.0) {
            return Err(DecodeError::InvalidConfiguration(format!(
                "sum_tolerance must be a positive finite number (got {})",
                self.sum_tolerance
            )));
        }
        Ok(())
    }
}

/// Reject special token ids the scorer cannot produce.
pub(crate) fn check_special_tokens(
    special: SpecialTokens,
    vocab_size: usize,
) -> Result<(), DecodeError> {
    if vocab_size == 0 {
        return Err(DecodeError::InvalidConfiguration(
            "scorer vocabulary is empty".into(),
        ));
    }
    for (name, id) in [("start", special.start), ("end", special.end)] {
        if id as usize >= vocab_size {
            return Err(DecodeError::InvalidConfiguration(format!(
                "{name} token id {id} is outside the scorer vocabulary ({vocab_size})"
            )));
        }
    }
    Ok(())
}

/// Beam search decoder.
#[derive(Debug, Clone)]
pub struct BeamSearchDecoder {
    config: DecodingConfig,
    special: SpecialTokens,
}

impl BeamSearchDecoder {
    pub fn new(config: DecodingConfig, special: SpecialTokens) -> Self {
        Self { config, special }
    }

    pub fn config(&self) -> &DecodingConfig {
        &self.config
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    /// Search for the highest-scoring caption for `context`.
    ///
    /// Fails with [`DecodeError::InvalidConfiguration`] before any scorer call
    /// if the parameters are out of range, and with
    /// [`DecodeError::ScoringFailure`] as soon as the scorer errors or returns
    /// a malformed distribution.
    pub fn decode<S>(&self, scorer: &S, context: &S::Context) -> Result<DecodeOutcome, DecodeError>
    where
        S: SequenceScorer + ?Sized,
    {
        self.config.check()?;
        check_special_tokens(self.special, scorer.vocab_size())?;

        let started = Instant::now();
        let deadline = self.config.timeout_ms.map(Duration::from_millis);
        let alpha = self.config.length_norm_exponent;

        let mut frontier = BeamFrontier::seed(self.special.start, self.config.beam_width);
        let mut stop_reason = StopReason::MaxSteps;
        let mut steps = 0;
        let mut scorer_calls = 0;

        for step in 0..self.config.max_steps {
            let (next, calls) = self.expand(scorer, context, frontier, step)?;
            frontier = next;
            steps = step + 1;
            scorer_calls += calls;

            tracing::trace!(
                step,
                frontier = frontier.len(),
                finished = frontier.beams().iter().filter(|b| b.is_finished()).count(),
                best = frontier.beams().first().map(Beam::log_prob),
                "beam search step"
            );

            if frontier.all_finished() {
                stop_reason = StopReason::AllFinished;
                break;
            }
            if steps < self.config.max_steps {
                if let Some(limit) = deadline {
                    if started.elapsed() >= limit {
                        stop_reason = StopReason::Deadline;
                        break;
                    }
                }
            }
        }

        let best = frontier.best(alpha).ok_or_else(|| DecodeError::ScoringFailure {
            step: steps,
            prefix: vec![self.special.start],
            message: "search produced no candidates".to_string(),
        })?;
        let outcome =
            DecodeOutcome::from_beam(best, self.special, alpha, stop_reason, steps, scorer_calls);

        tracing::debug!(
            "Beam search finished after {} steps ({:?}, {} scorer calls, width {}): {} tokens, score {:.4}",
            outcome.steps,
            outcome.stop_reason,
            outcome.scorer_calls,
            self.config.beam_width,
            outcome.tokens.len(),
            outcome.normalized_score,
        );

        if stop_reason == StopReason::Deadline {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::warn!(
                "Beam search hit its {}ms limit after {} steps",
                self.config.timeout_ms.unwrap_or_default(),
                steps
            );
            if self.config.timeout_policy == TimeoutPolicy::Fail {
                return Err(DecodeError::Timeout {
                    elapsed_ms,
                    steps,
                    partial: Box::new(outcome),
                });
            }
        }

        Ok(outcome)
    }

    /// Run one step: carry finished beams, expand the rest, prune.
    ///
    /// Returns the new frontier and the number of scorer calls made.
    fn expand<S>(
        &self,
        scorer: &S,
        context: &S::Context,
        frontier: BeamFrontier,
        step: usize,
    ) -> Result<(BeamFrontier, usize), DecodeError>
    where
        S: SequenceScorer + ?Sized,
    {
        let width = self.config.beam_width;
        let (mut pool, active): (Vec<Beam>, Vec<Beam>) =
            frontier.into_beams().into_iter().partition(Beam::is_finished);

        let distributions = self.score_all(scorer, context, &active, step)?;

        pool.reserve(active.len() * width);
        for (beam, probs) in active.iter().zip(&distributions) {
            for (token, p) in top_k(probs, width) {
                pool.push(beam.extend(token, safe_ln(p), self.special.end));
            }
        }

        Ok((BeamFrontier::from_candidates(pool, width), active.len()))
    }

    /// Score every active beam. With `parallel_scoring` the calls run on the
    /// rayon pool; `collect` only returns once all of them have.
    fn score_all<S>(
        &self,
        scorer: &S,
        context: &S::Context,
        active: &[Beam],
        step: usize,
    ) -> Result<Vec<Vec<f32>>, DecodeError>
    where
        S: SequenceScorer + ?Sized,
    {
        let vocab_size = scorer.vocab_size();
        let tolerance = self.config.check_sum.then_some(self.config.sum_tolerance);

        let score_one = |beam: &Beam| -> Result<Vec<f32>, DecodeError> {
            let failure = |message: String| DecodeError::ScoringFailure {
                step,
                prefix: beam.tokens().to_vec(),
                message,
            };
            let probs = scorer
                .score(context, beam.tokens())
                .map_err(|e| failure(e.to_string()))?;
            validate_distribution(&probs, vocab_size, tolerance).map_err(failure)?;
            Ok(probs)
        };

        if self.config.parallel_scoring && active.len() > 1 {
            active.par_iter().map(score_one).collect()
        } else {
            active.iter().map(score_one).collect()
        }
    }
}
