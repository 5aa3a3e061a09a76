//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where the encoder and decoder models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.glimpse/models"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
                "tiff".to_string(),
                "tif".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Memory layout of the encoder input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`, as TensorFlow-exported CNNs expect
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`
    Nchw,
}

/// Image encoder (CNN feature extractor) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Square input size in pixels
    pub image_size: u32,

    /// Per-channel mean subtracted after scaling pixels to [0, 1]
    pub mean: [f32; 3],

    /// Per-channel divisor applied after mean subtraction
    pub std: [f32; 3],

    /// Input tensor layout
    pub layout: TensorLayout,

    /// Output tensor to read features from. `None` uses the first output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model: "inception-v3".to_string(),
            image_size: 299,
            mean: [0.485, 0.456, 0.406],
            std: [1.0, 1.0, 1.0],
            layout: TensorLayout::Nhwc,
            output: None,
        }
    }
}

/// Attention decoder model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderModelConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Name of the image feature input. `None` picks the first float input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features_input: Option<String>,

    /// Name of the token prefix input. `None` picks the second input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_input: Option<String>,

    /// Name of the logits output. `None` uses the first output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logits_output: Option<String>,
}

impl Default for DecoderModelConfig {
    fn default() -> Self {
        Self {
            model: "show-attend-tell".to_string(),
            features_input: None,
            tokens_input: None,
            logits_output: None,
        }
    }
}

/// Vocabulary file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Vocabulary file: a `.json` word map or one token per line
    pub path: String,

    /// Token that seeds every caption
    pub start_token: String,

    /// Token that terminates a caption
    pub end_token: String,

    /// Token rendered for ids with no word
    pub unknown_token: String,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            path: "~/.glimpse/vocabulary/word_map.json".to_string(),
            start_token: "<start>".to_string(),
            end_token: "<end>".to_string(),
            unknown_token: "<unk>".to_string(),
        }
    }
}

/// What a search does when its wall-clock limit expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Return the best beam so far, marked truncated
    #[default]
    Partial,
    /// Return `DecodeError::Timeout` carrying the best beam so far
    Fail,
}

/// Beam search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// Number of beams kept per step. 1 is greedy decoding.
    pub beam_width: usize,

    /// Upper bound on generated tokens
    pub max_steps: usize,

    /// Alpha in `log_prob / len^alpha` for final selection
    pub length_norm_exponent: f64,

    /// Reject scorer outputs whose sum is not 1 within `sum_tolerance`
    pub check_sum: bool,

    /// Allowed `|sum - 1|` for a scorer distribution
    pub sum_tolerance: f64,

    /// Score the beams of a step on the rayon pool
    pub parallel_scoring: bool,

    /// Wall-clock limit for one search, checked between steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Behavior when `timeout_ms` expires
    pub timeout_policy: TimeoutPolicy,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            beam_width: 3,
            max_steps: 20,
            length_norm_exponent: 1.0,
            check_sum: true,
            sum_tolerance: 1e-3,
            parallel_scoring: false,
            timeout_ms: None,
            timeout_policy: TimeoutPolicy::Partial,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json", "jsonl" or "text")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
