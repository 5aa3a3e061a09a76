//! Glimpse Core - Embeddable image captioning library.
//!
//! Glimpse turns images into natural-language captions: a CNN encoder
//! produces a feature vector, an attention decoder scores next words, and a
//! beam search finds a high-likelihood word sequence.
//!
//! # Architecture
//!
//! ```text
//! Image → Validate → Decode → Encode (CNN) → Beam search over decoder → Render → JSON
//! ```
//!
//! The search in [`decoding`] only depends on the [`SequenceScorer`] trait,
//! so it runs unchanged against the ONNX decoder, a lookup table, or a test
//! double.
//!
//! # Usage
//!
//! ```rust,ignore
//! use glimpse_core::{Config, ImageProcessor};
//!
//! #[tokio::main]
//! async fn main() -> glimpse_core::Result<()> {
//!     let config = Config::load()?;
//!     let mut processor = ImageProcessor::new(&config);
//!     processor.load_captioner(&config)?;
//!
//!     let record = processor.process("./image.jpg".as_ref()).await?;
//!     println!("{}", record.caption);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod captioning;
pub mod config;
pub mod decoding;
pub mod encoder;
pub mod error;
pub mod eval;
pub mod math;
pub(crate) mod onnx;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use captioning::{CaptionGenerator, CaptionRenderer, TableScorer, Vocabulary};
pub use config::Config;
pub use decoding::{BeamSearchDecoder, DecodeOutcome, GreedyDecoder, SequenceScorer};
pub use error::{
    ConfigError, DecodeError, GlimpseError, PipelineError, PipelineResult, Result, ScorerError,
};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::ImageProcessor;
pub use types::{CaptionRecord, ProcessingStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
