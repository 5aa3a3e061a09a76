//! ONNX session for the CNN feature extractor.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;
use crate::onnx;

/// Wraps an ONNX Runtime session for the image encoder.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct EncoderSession {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl EncoderSession {
    pub fn load(model_path: &Path, output: Option<&str>) -> Result<Self, PipelineError> {
        let session = onnx::open_session(model_path).map_err(|message| PipelineError::Model {
            message,
        })?;

        let input_name = onnx::pick_name(None, &onnx::input_names(&session), "input");
        let output_name = onnx::pick_name(output, &onnx::output_names(&session), "features");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Run the encoder on a preprocessed batch of one and return the
    /// flattened feature vector.
    pub fn run(&self, tensor: &Array4<f32>, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let failure = |message: String| PipelineError::Embedding {
            path: path.to_path_buf(),
            message,
        };

        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = tensor.iter().copied().collect();
        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| failure(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| failure(format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| failure(format!("ONNX inference failed: {e}")))?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .ok_or_else(|| failure(format!("Model did not produce {}", self.output_name)))?;

        let (shape, data) = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| failure(format!("Failed to extract features: {e}")))?;

        // [1, D] pooled or [1, H, W, C] spatial: keep every value.
        onnx::flatten_single(shape, data).map_err(failure)
    }
}
