//! Caption decoding: beam search and greedy search over a next-token scorer.
//!
//! The decoder only sees token ids and probability vectors. Everything model
//! specific lives behind [`SequenceScorer`], so the same search runs against
//! the ONNX attention decoder, a lookup table, or a test double.
//!
//! # Usage
//!
//! ```rust,ignore
//! use glimpse_core::config::DecodingConfig;
//! use glimpse_core::decoding::BeamSearchDecoder;
//!
//! let decoder = BeamSearchDecoder::new(DecodingConfig::default(), vocabulary.special());
//! let outcome = decoder.decode(&scorer, &features)?;
//! println!("{:?} (score {:.3})", outcome.tokens, outcome.normalized_score);
//! ```

pub mod beam;
pub mod beam_search;
pub mod greedy;
pub mod scorer;
pub mod top_k;

pub use beam::{rank, Beam, BeamFrontier};
pub use beam_search::{BeamSearchDecoder, DecodeOutcome, StopReason};
pub use greedy::GreedyDecoder;
pub use scorer::{validate_distribution, SequenceScorer, SpecialTokens, TokenId};
pub use top_k::{argmax, top_k};
