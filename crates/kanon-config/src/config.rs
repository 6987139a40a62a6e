//! Configuration types.

use kanon_bind::BindOptions;
use kanon_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Root configuration.
///
/// Every section is optional in files and falls back to its defaults;
/// unknown keys anywhere are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KanonConfig {
    /// Binding behavior.
    #[serde(default)]
    pub binding: BindOptions,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl KanonConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> KanonConfigBuilder {
        KanonConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the log filter cannot be parsed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.enabled {
            kanon_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::InvalidValue {
                    field: "logging.level",
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty debug logging with source locations
    /// - Offending inputs echoed in error envelopes
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::KanonConfig;
    ///
    /// let config = KanonConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.binding.include_input);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            binding: BindOptions::default(),
            logging: LogConfig::development(),
            metrics: MetricsConfig::default(),
        }
    }

    /// Create a production configuration preset.
    ///
    /// - JSON logging at `info`
    /// - Offending inputs left out of error envelopes
    /// - Bodies must declare a JSON content type
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::KanonConfig;
    ///
    /// let config = KanonConfig::production();
    /// assert!(config.logging.json_format);
    /// assert!(!config.binding.include_input);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        Self {
            binding: BindOptions {
                include_input: false,
                require_json_content_type: true,
                ..BindOptions::default()
            },
            logging: LogConfig::production(),
            metrics: MetricsConfig::default(),
        }
    }

    /// Returns the options for a [`kanon_bind::Binder`].
    #[must_use]
    pub fn bind_options(&self) -> BindOptions {
        self.binding
    }

    /// Returns the telemetry settings.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .logging(self.logging.clone())
            .metrics(self.metrics.clone())
            .build()
    }
}

/// Builder for [`KanonConfig`].
#[derive(Debug, Default)]
pub struct KanonConfigBuilder {
    binding: Option<BindOptions>,
    logging: Option<LogConfig>,
    metrics: Option<MetricsConfig>,
}

impl KanonConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the binding configuration.
    #[must_use]
    pub fn binding(mut self, binding: BindOptions) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> KanonConfig {
        KanonConfig {
            binding: self.binding.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KanonConfig::default();
        assert!(config.binding.convert_header_underscores);
        assert!(config.binding.include_input);
        assert!(!config.binding.require_json_content_type);
        assert_eq!(config.logging.level, "info");
        assert!(config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(KanonConfig::development().validate().is_ok());
        assert!(KanonConfig::production().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = KanonConfig::default();
        config.logging.level = "kanon=shouting".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = KanonConfig::builder()
            .binding(BindOptions {
                convert_header_underscores: false,
                ..BindOptions::default()
            })
            .build();

        assert!(!config.bind_options().convert_header_underscores);
        assert_eq!(config.telemetry().logging, LogConfig::default());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = toml::from_str::<KanonConfig>("[server]\nport = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_key_in_section_rejected() {
        let result = toml::from_str::<KanonConfig>("[binding]\nstrict = true\n");
        assert!(result.is_err());
    }
}
