//! The `glimpse caption` command.

mod batch;
mod setup;
pub mod types;

pub use types::OutputFormat;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::Args;
use glimpse_core::{ImageProcessor, OutputFormat as CoreOutputFormat, OutputWriter};

use batch::caption_batch;
use setup::setup_processor;

/// Arguments for the `caption` command.
#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Image file or directory to caption
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of candidate captions kept per step
    #[arg(long)]
    pub beam_width: Option<usize>,

    /// Maximum number of generated words
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Length normalization exponent (must be > 0)
    #[arg(long)]
    pub length_alpha: Option<f64>,

    /// Score the beams of a step in parallel
    #[arg(long)]
    pub parallel_scoring: bool,

    /// Wall-clock limit for one search, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Skip images already present in the output file
    #[arg(long)]
    pub skip_existing: bool,
}

/// Values match the clap defaults above.
impl Default for CaptionArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            format: None,
            beam_width: None,
            max_steps: None,
            length_alpha: None,
            parallel_scoring: false,
            timeout_ms: None,
            skip_existing: false,
        }
    }
}

/// Everything assembled by `setup_processor()`.
pub(crate) struct CaptionContext {
    pub processor: ImageProcessor,
    pub format: CoreOutputFormat,
    pub pretty: bool,
}

pub async fn execute(args: CaptionArgs) -> anyhow::Result<()> {
    let ctx = setup_processor(&args)?;

    let files = ctx.processor.discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to caption", files.len());

    if args.input.is_file() {
        caption_single(ctx, &args).await
    } else {
        caption_batch(ctx, &args, files).await
    }
}

async fn caption_single(ctx: CaptionContext, args: &CaptionArgs) -> anyhow::Result<()> {
    let record = ctx.processor.process(&args.input).await?;

    if let Some(ref output_path) = args.output {
        let file = File::create(output_path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), ctx.format, ctx.pretty);
        writer.write(&record)?;
        writer.flush()?;
        tracing::info!("Output written to {:?}", output_path);
    } else {
        let mut writer = OutputWriter::new(io::stdout().lock(), ctx.format, true);
        writer.write(&record)?;
        writer.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_args_default_leaves_search_to_config() {
        let args = CaptionArgs::default();
        assert!(args.beam_width.is_none());
        assert!(args.max_steps.is_none());
        assert!(args.length_alpha.is_none());
        assert!(args.timeout_ms.is_none());
    }

    #[test]
    fn caption_args_default_bool_flags_are_false() {
        let args = CaptionArgs::default();
        assert!(!args.parallel_scoring);
        assert!(!args.skip_existing);
    }

    #[test]
    fn caption_args_default_output_is_stdout() {
        let args = CaptionArgs::default();
        assert!(args.output.is_none());
        assert!(args.format.is_none());
        assert_eq!(args.input, PathBuf::new());
    }
}
