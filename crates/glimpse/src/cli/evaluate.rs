//! The `glimpse evaluate` command.

use clap::Args;
use glimpse_core::eval::sentence_bleu_text;

/// Arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Candidate caption
    #[arg(long)]
    pub hypothesis: String,

    /// Reference caption; repeat for several references
    #[arg(short, long = "reference", required = true)]
    pub references: Vec<String>,
}

pub fn execute(args: EvaluateArgs) -> anyhow::Result<()> {
    let bleu = sentence_bleu_text(&args.hypothesis, &args.references);
    tracing::debug!(
        "BLEU {:.4} ({} words against {} references)",
        bleu.score,
        bleu.hypothesis_len,
        args.references.len()
    );
    println!("{}", serde_json::to_string_pretty(&bleu)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: EvaluateArgs,
    }

    #[test]
    fn collects_repeated_references() {
        let harness = Harness::try_parse_from([
            "evaluate",
            "--hypothesis",
            "a dog runs",
            "--reference",
            "a dog is running",
            "-r",
            "the dog runs",
        ])
        .unwrap();
        assert_eq!(harness.args.hypothesis, "a dog runs");
        assert_eq!(harness.args.references.len(), 2);
    }

    #[test]
    fn reference_is_required() {
        assert!(Harness::try_parse_from(["evaluate", "--hypothesis", "a dog"]).is_err());
    }
}
