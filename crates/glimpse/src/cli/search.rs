//! The `glimpse search` command: run the decoder against a lookup table.
//!
//! Useful for inspecting search behavior (beam width, length normalization)
//! without any model files.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use glimpse_core::config::{DecodingConfig, SpecialTokenNames};
use glimpse_core::{
    BeamSearchDecoder, CaptionRenderer, Config, DecodeOutcome, GreedyDecoder, TableScorer,
};
use serde::Serialize;

/// Arguments for the `search` command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Transition table (JSON with `vocabulary` and `transitions`)
    #[arg(long)]
    pub table: PathBuf,

    /// Number of candidate captions kept per step
    #[arg(long)]
    pub beam_width: Option<usize>,

    /// Maximum number of generated words
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Length normalization exponent
    #[arg(long)]
    pub length_alpha: Option<f64>,

    /// Pick the most probable word at every step instead of searching
    #[arg(long)]
    pub greedy: bool,
}

#[derive(Debug, Serialize)]
struct SearchReport {
    decoder: &'static str,
    caption: String,
    words: Vec<String>,
    #[serde(flatten)]
    outcome: DecodeOutcome,
}

pub fn execute(args: SearchArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let decoding = decoding_config(&config, &args);
    decoding.check()?;

    let names = SpecialTokenNames::from(&config.vocabulary);
    let scorer = TableScorer::load(&args.table, &names)?;

    let report = run_search(&scorer, decoding, args.greedy)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn decoding_config(config: &Config, args: &SearchArgs) -> DecodingConfig {
    let mut decoding = config.decoding.clone();
    if let Some(width) = args.beam_width {
        decoding.beam_width = width;
    }
    if let Some(steps) = args.max_steps {
        decoding.max_steps = steps;
    }
    if let Some(alpha) = args.length_alpha {
        decoding.length_norm_exponent = alpha;
    }
    decoding
}

fn run_search(
    scorer: &TableScorer,
    decoding: DecodingConfig,
    greedy: bool,
) -> anyhow::Result<SearchReport> {
    let special = scorer.vocabulary().special();

    let (decoder, outcome) = if greedy {
        let tolerance = decoding.check_sum.then_some(decoding.sum_tolerance);
        let outcome = GreedyDecoder::new(decoding.max_steps, special)
            .with_sum_tolerance(tolerance)
            .with_length_exponent(decoding.length_norm_exponent)
            .decode(scorer, &())?;
        ("greedy", outcome)
    } else {
        let outcome = BeamSearchDecoder::new(decoding, special).decode(scorer, &())?;
        ("beam", outcome)
    };
    tracing::debug!(
        "{} search: {} steps, {} scorer calls",
        decoder,
        outcome.steps,
        outcome.scorer_calls
    );

    let renderer = CaptionRenderer::new(Arc::new(scorer.vocabulary().clone()));
    let caption = renderer.render(&outcome.tokens);
    Ok(SearchReport {
        decoder,
        caption: caption.text,
        words: caption.words,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "vocabulary": ["<start>", "<end>", "<unk>", "a", "dog", "cat", "runs"],
        "transitions": {
            "<start>": { "a": 1.0 },
            "a": { "dog": 0.6, "cat": 0.4 },
            "dog": { "runs": 1.0 },
            "runs": { "<end>": 1.0 }
        }
    }"#;

    fn scorer() -> TableScorer {
        TableScorer::from_json(TABLE, &SpecialTokenNames::default()).unwrap()
    }

    fn args() -> SearchArgs {
        SearchArgs {
            table: PathBuf::from("table.json"),
            beam_width: None,
            max_steps: None,
            length_alpha: None,
            greedy: false,
        }
    }

    #[test]
    fn beam_search_renders_table_caption() {
        let report = run_search(&scorer(), DecodingConfig::default(), false).unwrap();
        assert_eq!(report.decoder, "beam");
        assert_eq!(report.caption, "a dog runs");
        assert!(report.outcome.finished);
    }

    #[test]
    fn greedy_matches_on_a_chain() {
        let report = run_search(&scorer(), DecodingConfig::default(), true).unwrap();
        assert_eq!(report.decoder, "greedy");
        assert_eq!(report.words, vec!["a", "dog", "runs"]);
    }

    #[test]
    fn report_flattens_outcome() {
        let report = run_search(&scorer(), DecodingConfig::default(), false).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["caption"], "a dog runs");
        assert!(json["stop_reason"].is_string());
        assert!(json["scorer_calls"].as_u64().unwrap() > 0);
    }

    #[test]
    fn flags_override_config() {
        let args = SearchArgs {
            beam_width: Some(1),
            max_steps: Some(2),
            length_alpha: Some(0.5),
            ..args()
        };
        let decoding = decoding_config(&Config::default(), &args);
        assert_eq!(decoding.beam_width, 1);
        assert_eq!(decoding.max_steps, 2);
        assert_eq!(decoding.length_norm_exponent, 0.5);

        let report = run_search(&scorer(), decoding, false).unwrap();
        assert_eq!(report.words, vec!["a", "dog"]);
        assert!(!report.outcome.finished);
    }

    #[test]
    fn greedy_reports_requested_exponent() {
        let decoding = DecodingConfig {
            length_norm_exponent: 0.5,
            ..DecodingConfig::default()
        };
        let report = run_search(&scorer(), decoding, true).unwrap();
        let outcome = &report.outcome;
        let len = (outcome.tokens.len() + 1) as f64;
        assert!((outcome.normalized_score - outcome.log_prob / len.powf(0.5)).abs() < 1e-12);
    }

    #[test]
    fn invalid_width_is_an_error() {
        let decoding = DecodingConfig {
            beam_width: 0,
            ..DecodingConfig::default()
        };
        assert!(run_search(&scorer(), decoding, false).is_err());
    }
}
