//! Processor setup: config overrides and model loading.

use anyhow::Context;
use glimpse_core::{Config, ImageProcessor};

use super::types::resolve_format;
use super::{CaptionArgs, CaptionContext};

/// Validate input, load config and models, and assemble the caption context.
pub fn setup_processor(args: &CaptionArgs) -> anyhow::Result<CaptionContext> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    let mut config = Config::load()?;
    apply_overrides(&mut config, args);
    config.decoding.check()?;

    let mut processor = ImageProcessor::new(&config);
    processor.load_captioner(&config).with_context(|| {
        format!(
            "Captioner could not be loaded.\n\n  Hint: expected {}/{}/encoder.onnx, \
             {}/{}/decoder.onnx and a vocabulary at {}",
            config.model_dir().display(),
            config.encoder.model,
            config.model_dir().display(),
            config.decoder.model,
            config.vocabulary_path().display()
        )
    })?;

    Ok(CaptionContext {
        processor,
        format: resolve_format(args.format, &config.output.format),
        pretty: config.output.pretty,
    })
}

/// Apply search flags on top of the `[decoding]` section.
pub(crate) fn apply_overrides(config: &mut Config, args: &CaptionArgs) {
    let decoding = &mut config.decoding;
    if let Some(width) = args.beam_width {
        decoding.beam_width = width;
    }
    if let Some(steps) = args.max_steps {
        decoding.max_steps = steps;
    }
    if let Some(alpha) = args.length_alpha {
        decoding.length_norm_exponent = alpha;
    }
    if args.parallel_scoring {
        decoding.parallel_scoring = true;
    }
    if let Some(timeout) = args.timeout_ms {
        decoding.timeout_ms = Some(timeout);
    }
}
