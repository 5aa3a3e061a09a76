//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.encoder.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "encoder.image_size must be > 0".into(),
            ));
        }
        if self.encoder.std.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ConfigError::ValidationError(
                "encoder.std entries must be finite and non-zero".into(),
            ));
        }
        self.decoding
            .check()
            .map_err(|e| ConfigError::ValidationError(format!("decoding: {e}")))?;

        let v = &self.vocabulary;
        if v.start_token == v.end_token {
            return Err(ConfigError::ValidationError(
                "vocabulary.start_token and vocabulary.end_token must differ".into(),
            ));
        }
        if !matches!(self.output.format.as_str(), "json" | "jsonl" | "text") {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be json, jsonl or text (got {:?})",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_beam_width() {
        let mut config = Config::default();
        config.decoding.beam_width = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("beam_width"));
    }

    #[test]
    fn test_validate_rejects_zero_max_steps() {
        let mut config = Config::default();
        config.decoding.max_steps = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_steps"));
    }

    #[test]
    fn test_validate_rejects_bad_length_exponent() {
        let mut config = Config::default();
        config.decoding.length_norm_exponent = 0.0;
        assert!(config.validate().is_err());

        config.decoding.length_norm_exponent = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("length_norm_exponent"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.decode_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("decode_timeout_ms"));

        let mut config = Config::default();
        config.decoding.timeout_ms = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("decoding:"));
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_zero_std() {
        let mut config = Config::default();
        config.encoder.std = [1.0, 0.0, 1.0];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("encoder.std"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let mut config = Config::default();
        config.output.format = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }

    #[test]
    fn test_validate_rejects_same_start_and_end() {
        let mut config = Config::default();
        config.vocabulary.end_token = "<start>".to_string();
        assert!(config.validate().is_err());
    }
}
