//! CNN image encoding.
//!
//! Turns a decoded image into the fixed-size feature vector the caption
//! decoder is conditioned on, using a convolutional encoder running locally
//! via ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use glimpse_core::encoder::{FeatureExtractor, ImageEncoder};
//! use glimpse_core::Config;
//!
//! let config = Config::default();
//! let encoder = ImageEncoder::load(&config.encoder, &config.model_dir())?;
//! let features = encoder.extract(&decoded.image, &decoded.path)?;
//! ```

pub mod preprocess;
pub(crate) mod session;

use std::path::Path;

use image::DynamicImage;

use crate::config::EncoderConfig;
use crate::error::PipelineError;

pub use self::preprocess::Preprocessor;
use self::session::EncoderSession;

/// The encoder ONNX model filename.
const ENCODER_MODEL_FILENAME: &str = "encoder.onnx";

/// Anything that can turn an image into a feature vector.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, image: &DynamicImage, path: &Path) -> Result<Vec<f32>, PipelineError>;
}

/// CNN feature extractor backed by an ONNX model.
pub struct ImageEncoder {
    session: EncoderSession,
    preprocessor: Preprocessor,
}

impl ImageEncoder {
    /// Load the encoder from the model directory.
    ///
    /// Expects the ONNX model at `{model_dir}/{model}/encoder.onnx`.
    pub fn load(config: &EncoderConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let model_path = model_dir.join(&config.model).join(ENCODER_MODEL_FILENAME);

        if !model_path.exists() {
            return Err(PipelineError::Model {
                message: format!("Encoder model not found at {:?}", model_path),
            });
        }

        tracing::info!("Loading image encoder from {:?}", model_path);
        let session = EncoderSession::load(&model_path, config.output.as_deref())?;

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(config),
        })
    }

    pub fn image_size(&self) -> u32 {
        self.preprocessor.image_size()
    }
}

impl FeatureExtractor for ImageEncoder {
    fn extract(&self, image: &DynamicImage, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let tensor = self.preprocessor.apply(image);
        self.session.run(&tensor, path)
    }
}
