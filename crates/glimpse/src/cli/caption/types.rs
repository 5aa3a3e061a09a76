//! CLI enum types for the caption command.

use clap::ValueEnum;
use glimpse_core::OutputFormat as CoreOutputFormat;

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
    /// One `path<TAB>caption` line per image
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
            OutputFormat::Text => CoreOutputFormat::Text,
        }
    }
}

/// The flag wins; otherwise `output.format` from the config, then JSON.
pub fn resolve_format(flag: Option<OutputFormat>, configured: &str) -> CoreOutputFormat {
    flag.map(CoreOutputFormat::from)
        .or_else(|| CoreOutputFormat::parse(configured))
        .unwrap_or(CoreOutputFormat::Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_config() {
        assert_eq!(
            resolve_format(Some(OutputFormat::Text), "jsonl"),
            CoreOutputFormat::Text
        );
    }

    #[test]
    fn config_format_used_without_flag() {
        assert_eq!(resolve_format(None, "jsonl"), CoreOutputFormat::JsonLines);
        assert_eq!(resolve_format(None, "bogus"), CoreOutputFormat::Json);
    }

    #[test]
    fn display_matches_value_names() {
        for format in OutputFormat::value_variants() {
            let name = format.to_string();
            assert_eq!(OutputFormat::from_str(&name, false).unwrap(), *format);
        }
    }
}
