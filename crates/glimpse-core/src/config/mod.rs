//! Configuration management for Glimpse.
//!
//! Configuration is loaded from `~/.glimpse/config.toml` (or the platform
//! config directory) with defaults for every field.

mod types;
mod validate;

pub use types::*;

use crate::decoding::SpecialTokens;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Glimpse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Image encoder settings
    pub encoder: EncoderConfig,

    /// Attention decoder model settings
    pub decoder: DecoderModelConfig,

    /// Vocabulary settings
    pub vocabulary: VocabularyConfig,

    /// Beam search settings
    pub decoding: DecodingConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.glimpse.glimpse/config.toml
    /// - Linux: ~/.config/glimpse/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\glimpse\config\config.toml
    ///
    /// Falls back to ~/.glimpse/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "glimpse", "glimpse")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".glimpse").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved vocabulary file path (with ~ expansion).
    pub fn vocabulary_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.vocabulary.path);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Names of the reserved vocabulary entries, resolved to ids when a
/// vocabulary is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTokenNames {
    pub start: String,
    pub end: String,
    pub unknown: String,
}

impl Default for SpecialTokenNames {
    fn default() -> Self {
        Self::from(&VocabularyConfig::default())
    }
}

impl From<&VocabularyConfig> for SpecialTokenNames {
    fn from(config: &VocabularyConfig) -> Self {
        Self {
            start: config.start_token.clone(),
            end: config.end_token.clone(),
            unknown: config.unknown_token.clone(),
        }
    }
}

impl SpecialTokenNames {
    /// Resolve against an ordered token list.
    pub(crate) fn resolve(&self, tokens: &[String]) -> Result<SpecialTokens, String> {
        let find = |name: &str| {
            tokens
                .iter()
                .position(|t| t == name)
                .map(|i| i as u32)
                .ok_or_else(|| format!("vocabulary has no {name:?} token"))
        };
        Ok(SpecialTokens {
            start: find(&self.start)?,
            end: find(&self.end)?,
            unknown: find(&self.unknown)?,
        })
    }
}
