//! Glimpse CLI - Image captioning with an attention decoder and beam search.
//!
//! Glimpse takes images as input and outputs captions together with the
//! statistics of the search that produced them.
//!
//! # Usage
//!
//! ```bash
//! # Caption a single image
//! glimpse caption image.jpg
//!
//! # Caption a directory with a wider beam
//! glimpse caption ./photos/ --beam-width 5 --output captions.jsonl -f jsonl
//!
//! # Run the search against a lookup table
//! glimpse search --table bigrams.json
//!
//! # Score a caption against references
//! glimpse evaluate --hypothesis "a dog runs" --reference "a dog is running"
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Glimpse - Image captioning with an attention decoder and beam search.
#[derive(Parser, Debug)]
#[command(name = "glimpse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption an image or every image in a directory
    Caption(cli::caption::CaptionArgs),

    /// Run the decoder against a lookup-table scorer
    Search(cli::search::SearchArgs),

    /// Compute sentence BLEU for a caption
    Evaluate(cli::evaluate::EvaluateArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match glimpse_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `glimpse config path`."
            );
            glimpse_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Glimpse v{}", glimpse_core::VERSION);

    match cli.command {
        Commands::Caption(args) => cli::caption::execute(args).await,
        Commands::Search(args) => cli::search::execute(args),
        Commands::Evaluate(args) => cli::evaluate::execute(args),
        Commands::Config(args) => cli::config::execute(args),
    }
}
