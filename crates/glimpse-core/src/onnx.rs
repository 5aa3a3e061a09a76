//! Shared ONNX Runtime helpers for the encoder and decoder sessions.

use std::path::Path;

use ort::session::Session;

/// Build a session from a model file.
pub(crate) fn open_session(model_path: &Path) -> Result<Session, String> {
    let session = Session::builder()
        .map_err(|e| format!("Failed to create ONNX session builder: {e}"))?
        .commit_from_file(model_path)
        .map_err(|e| format!("Failed to load ONNX model {:?}: {e}", model_path))?;

    tracing::debug!(
        "Loaded ONNX model from {:?} (inputs: {:?}, outputs: {:?})",
        model_path,
        input_names(&session),
        output_names(&session),
    );
    Ok(session)
}

pub(crate) fn input_names(session: &Session) -> Vec<String> {
    session
        .inputs()
        .iter()
        .map(|i| i.name().to_string())
        .collect()
}

pub(crate) fn output_names(session: &Session) -> Vec<String> {
    session
        .outputs()
        .iter()
        .map(|o| o.name().to_string())
        .collect()
}

/// The configured name if given, otherwise the first available one.
pub(crate) fn pick_name(
    configured: Option<&str>,
    available: &[String],
    fallback: &str,
) -> String {
    configured
        .map(str::to_string)
        .or_else(|| available.first().cloned())
        .unwrap_or_else(|| fallback.to_string())
}

/// All values of a `[1, ...]` output, flattened in row-major order.
pub(crate) fn flatten_single(shape: &[i64], data: &[f32]) -> Result<Vec<f32>, String> {
    match shape.first() {
        None => return Err("output tensor has no dimensions".to_string()),
        Some(&batch) if batch != 1 => {
            return Err(format!("expected a batch of one, got shape {:?}", shape))
        }
        Some(_) => {}
    }
    let expected = shape.iter().try_fold(1usize, |acc, &d| {
        usize::try_from(d).ok().and_then(|d| acc.checked_mul(d))
    });
    match expected {
        Some(n) if n == data.len() && n > 0 => Ok(data.to_vec()),
        _ => Err(format!(
            "output shape {:?} does not match {} values",
            shape,
            data.len()
        )),
    }
}

/// Values of the last row of a `[1, ..., N]` output, i.e. the features or
/// logits at the final position of the only batch entry.
pub(crate) fn last_row(shape: &[i64], data: &[f32]) -> Result<Vec<f32>, String> {
    let width = match shape {
        [] => return Err("output tensor has no dimensions".to_string()),
        [n] => *n,
        [batch, .., n] if *batch == 1 => *n,
        _ => return Err(format!("expected a batch of one, got shape {:?}", shape)),
    };
    let width = usize::try_from(width).map_err(|_| format!("bad output shape {:?}", shape))?;
    if width == 0 || data.len() < width {
        return Err(format!(
            "output shape {:?} does not match {} values",
            shape,
            data.len()
        ));
    }
    Ok(data[data.len() - width..].to_vec())
}
