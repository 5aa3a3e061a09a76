//! Error types for the Glimpse captioning pipeline.
//!
//! Errors are organized by stage: configuration, search, scoring, and the
//! image pipeline around them. Each carries the context needed to act on it
//! (file paths, search step, offending prefix).

use std::path::PathBuf;
use thiserror::Error;

use crate::decoding::{DecodeOutcome, TokenId};

/// Top-level error type for Glimpse operations.
#[derive(Error, Debug)]
pub enum GlimpseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Beam search / greedy search errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors surfaced by a search over a [`SequenceScorer`](crate::decoding::SequenceScorer).
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Width, step bound, or length exponent is out of range. Raised before
    /// the scorer is ever called.
    #[error("Invalid decoder configuration: {0}")]
    InvalidConfiguration(String),

    /// The scorer failed or returned a malformed distribution.
    #[error("Scoring failed at step {step} for prefix {prefix:?}: {message}")]
    ScoringFailure {
        step: usize,
        prefix: Vec<TokenId>,
        message: String,
    },

    /// The wall-clock limit expired between steps. `partial` holds the best
    /// beam found so far, marked truncated.
    #[error("Decoding timed out after {elapsed_ms}ms ({steps} steps completed)")]
    Timeout {
        elapsed_ms: u64,
        steps: usize,
        partial: Box<DecodeOutcome>,
    },
}

/// Errors returned by scorer implementations.
#[derive(Error, Debug)]
pub enum ScorerError {
    /// The underlying model failed to produce an output
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The context or prefix cannot be scored
    #[error("Invalid scorer input: {0}")]
    InvalidInput(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Feature extraction failed
    #[error("Feature extraction failed for {path}: {message}")]
    Embedding { path: PathBuf, message: String },

    /// Model loading or setup failed
    #[error("Model error: {message}")]
    Model { message: String },

    /// Vocabulary loading or validation failed
    #[error("Vocabulary error: {message}")]
    Vocabulary { message: String },

    /// Caption generation failed for a file
    #[error("Captioning failed for {path}: {source}")]
    Caption {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// Caption search hit its wall-clock limit under the `fail` policy.
    /// `partial` is the best caption found before the limit.
    #[error("Caption search for {path} timed out after {timeout_ms}ms")]
    CaptionTimeout {
        path: PathBuf,
        timeout_ms: u64,
        partial: Box<DecodeOutcome>,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for Glimpse results.
pub type Result<T> = std::result::Result<T, GlimpseError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
