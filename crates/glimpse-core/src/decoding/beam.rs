//! Beam values and the per-step frontier.

use std::cmp::Ordering;

use super::scorer::TokenId;

/// One candidate caption: its tokens (starting with the start token), the
/// summed log-probability along them, and whether the end token was emitted.
///
/// Beams are values. Extending one produces a new beam and leaves the parent
/// untouched for its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
    tokens: Vec<TokenId>,
    log_prob: f64,
    finished: bool,
}

impl Beam {
    /// The initial beam: the start token alone, log-probability 0.
    pub fn seed(start: TokenId) -> Self {
        Self {
            tokens: vec![start],
            log_prob: 0.0,
            finished: false,
        }
    }

    /// A new beam with `token` appended and `log_prob` added to the score.
    pub fn extend(&self, token: TokenId, log_prob: f64, end: TokenId) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.push(token);
        Self {
            tokens,
            log_prob: self.log_prob + log_prob,
            finished: token == end,
        }
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn log_prob(&self) -> f64 {
        self.log_prob
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Tokens produced by the search, i.e. everything after the start token.
    pub fn generated_len(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    /// `log_prob / len^alpha` over the generated tokens.
    pub fn normalized_score(&self, alpha: f64) -> f64 {
        let len = self.generated_len().max(1) as f64;
        self.log_prob / len.powf(alpha)
    }

    /// Generated tokens with the start token and a trailing end token removed.
    pub fn caption_tokens(&self, end: TokenId) -> &[TokenId] {
        let generated = self.tokens.get(1..).unwrap_or(&[]);
        match generated.split_last() {
            Some((&last, rest)) if self.finished && last == end => rest,
            _ => generated,
        }
    }
}

/// Ranking used for pruning and final selection: higher score first, then the
/// shorter sequence, then the lexicographically smaller token sequence.
pub fn rank(a_score: f64, a: &Beam, b_score: f64, b: &Beam) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then(a.tokens.len().cmp(&b.tokens.len()))
        .then_with(|| a.tokens.cmp(&b.tokens))
}

/// The set of at most `width` beams alive at a given step.
#[derive(Debug, Clone)]
pub struct BeamFrontier {
    beams: Vec<Beam>,
    width: usize,
}

impl BeamFrontier {
    /// Frontier before step 0: one seed beam.
    pub fn seed(start: TokenId, width: usize) -> Self {
        Self {
            beams: vec![Beam::seed(start)],
            width,
        }
    }

    /// Keep the best `width` candidates of a merged pool.
    pub fn from_candidates(mut pool: Vec<Beam>, width: usize) -> Self {
        pool.sort_by(|a, b| rank(a.log_prob, a, b.log_prob, b));
        pool.truncate(width);
        Self { beams: pool, width }
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn len(&self) -> usize {
        self.beams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beams.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn all_finished(&self) -> bool {
        self.beams.iter().all(Beam::is_finished)
    }

    /// Best beam by length-normalized score.
    pub fn best(&self, alpha: f64) -> Option<&Beam> {
        self.beams.iter().min_by(|a, b| {
            rank(a.normalized_score(alpha), a, b.normalized_score(alpha), b)
        })
    }

    pub fn into_beams(self) -> Vec<Beam> {
        self.beams
    }
}
