//! Logging setup on top of `tracing`.
//!
//! Logs go to stderr so stdout stays clean for captions and JSON.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbose` when it is set.
pub fn init(verbose: bool, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    if json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Install the subscriber from the `[logging]` section, with CLI overrides.
pub fn init_from_config(
    config: &glimpse_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let verbose = verbose_override || is_verbose_level(&config.logging.level);
    let json_format = json_logs_override || config.logging.format == "json";
    init(verbose, json_format);
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn is_verbose_level(level: &str) -> bool {
    matches!(level.to_ascii_lowercase().as_str(), "debug" | "trace")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_levels() {
        assert!(is_verbose_level("debug"));
        assert!(is_verbose_level("TRACE"));
        assert!(!is_verbose_level("info"));
        assert!(!is_verbose_level("warn"));
    }

    #[test]
    fn default_directive_follows_verbosity() {
        assert_eq!(default_directive(true), "debug");
        assert_eq!(default_directive(false), "info");
    }
}
