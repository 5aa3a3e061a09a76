//! ONNX attention decoder exposed as a [`SequenceScorer`].
//!
//! The model takes the image features `[1, D]` (float) and the token prefix
//! `[1, T]` (int64) and returns next-token logits, either `[1, V]` or
//! `[1, T, V]`. Recurrent state is rebuilt from the full prefix on every call.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::config::DecoderModelConfig;
use crate::decoding::{SequenceScorer, TokenId};
use crate::error::{PipelineError, ScorerError};
use crate::math::softmax;
use crate::onnx;

/// The decoder ONNX model filename.
const DECODER_MODEL_FILENAME: &str = "decoder.onnx";

/// Attention decoder session.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`; parallel
/// scoring therefore serializes on the session.
pub struct AttentionDecoder {
    session: Mutex<Session>,
    features_input: String,
    tokens_input: String,
    logits_output: String,
    vocab_size: usize,
}

impl AttentionDecoder {
    /// Load the decoder from the model directory.
    ///
    /// Expects the ONNX model at `{model_dir}/{model}/decoder.onnx`.
    pub fn load(
        config: &DecoderModelConfig,
        model_dir: &Path,
        vocab_size: usize,
    ) -> Result<Self, PipelineError> {
        let model_path = model_dir.join(&config.model).join(DECODER_MODEL_FILENAME);

        if !model_path.exists() {
            return Err(PipelineError::Model {
                message: format!("Decoder model not found at {:?}", model_path),
            });
        }

        tracing::info!("Loading attention decoder from {:?}", model_path);
        let session =
            onnx::open_session(&model_path).map_err(|message| PipelineError::Model { message })?;

        let inputs = onnx::input_names(&session);
        let features_input = onnx::pick_name(config.features_input.as_deref(), &inputs, "features");
        let tokens_input = config
            .tokens_input
            .clone()
            .or_else(|| inputs.iter().find(|n| **n != features_input).cloned())
            .unwrap_or_else(|| "tokens".to_string());
        let logits_output = onnx::pick_name(
            config.logits_output.as_deref(),
            &onnx::output_names(&session),
            "logits",
        );

        tracing::debug!(
            "Decoder inputs: features={:?}, tokens={:?}; output: {:?}; vocabulary {}",
            features_input,
            tokens_input,
            logits_output,
            vocab_size
        );

        Ok(Self {
            session: Mutex::new(session),
            features_input,
            tokens_input,
            logits_output,
            vocab_size,
        })
    }
}

impl SequenceScorer for AttentionDecoder {
    type Context = [f32];

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn score(&self, features: &[f32], prefix: &[TokenId]) -> Result<Vec<f32>, ScorerError> {
        if features.is_empty() {
            return Err(ScorerError::InvalidInput("empty feature vector".to_string()));
        }
        if prefix.is_empty() {
            return Err(ScorerError::InvalidInput("empty prefix".to_string()));
        }

        let features_shape = vec![1i64, features.len() as i64];
        let features_value = Value::from_array((features_shape, features.to_vec()))
            .map_err(|e| ScorerError::Inference(format!("Failed to create features tensor: {e}")))?;
        let token_ids: Vec<i64> = prefix.iter().map(|&t| t as i64).collect();
        let tokens_value = Value::from_array((vec![1i64, token_ids.len() as i64], token_ids))
            .map_err(|e| ScorerError::Inference(format!("Failed to create tokens tensor: {e}")))?;

        let inputs = ort::inputs![
            self.features_input.as_str() => features_value,
            self.tokens_input.as_str() => tokens_value
        ];

        let mut session = self
            .session
            .lock()
            .map_err(|e| ScorerError::Inference(format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| ScorerError::Inference(format!("ONNX inference failed: {e}")))?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.logits_output)
            .ok_or_else(|| {
                ScorerError::Inference(format!("Model did not produce {}", self.logits_output))
            })?;

        let (shape, data) = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| ScorerError::Inference(format!("Failed to extract logits: {e}")))?;

        let logits = onnx::last_row(shape, data).map_err(ScorerError::Inference)?;
        if logits.len() != self.vocab_size {
            return Err(ScorerError::Inference(format!(
                "decoder produced {} logits, vocabulary has {}",
                logits.len(),
                self.vocab_size
            )));
        }

        Ok(softmax(&logits))
    }
}
