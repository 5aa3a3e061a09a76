//! Core data types for the Glimpse captioning pipeline.
//!
//! These types represent the output of captioning an image.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::decoding::DecodeOutcome;

/// The complete output for a captioned image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRecord {
    // === File Identification ===
    /// Path to the source file
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// BLAKE3 hash of the file contents
    pub content_hash: String,

    // === Image Properties ===
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Detected format ("jpeg", "png", "webp", etc.)
    pub format: String,

    /// File size in bytes
    pub file_size: u64,

    // === Caption ===
    /// Caption text
    pub caption: String,

    /// Caption words in order
    pub words: Vec<String>,

    /// How the search produced the caption
    pub search: DecodeOutcome,

    /// BLAKE3 hash of the vocabulary used to render the caption
    pub vocabulary_hash: String,
}

/// Summary counts for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Captions cut short by the search deadline
    pub truncated: usize,
}

impl ProcessingStats {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}
