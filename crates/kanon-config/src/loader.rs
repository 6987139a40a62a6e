//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, `.env` files and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, KanonConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "KANON";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON)
/// 3. `.env` file, loaded into the process environment
/// 4. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use kanon_config::ConfigLoader;
///
/// # fn main() -> Result<(), kanon_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("kanon.toml")?
///     .with_dotenv()?
///     .with_env_prefix("KANON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: KanonConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: KanonConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = KanonConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = KanonConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = KanonConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, chosen by extension.
    /// The file replaces the current configuration; sections it omits take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - File format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [binding]
    ///     include_input = false
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(!config.binding.include_input);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(format.to_string()))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `KANON__BINDING__INCLUDE_INPUT=false` or `KANON__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the current directory or its parents, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but is invalid.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file is missing or invalid.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Apply overrides from explicit `(key, value)` pairs, as if they were
    /// environment variables under `prefix`.
    ///
    /// Keys outside the prefix or naming unknown settings are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvVar` for values of the wrong type.
    pub fn with_env_vars<I, K, V>(mut self, prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = prefix.to_uppercase();
        for (key, value) in vars {
            if key.as_ref().starts_with(&prefix) {
                self.apply_env_var(key.as_ref(), value.as_ref(), &prefix)?;
            }
        }
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    ///
    /// # Example
    ///
    /// ```
    /// use kanon_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert!(config.binding.convert_header_underscores);
    /// ```
    pub fn load(mut self) -> Result<KanonConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self = self.with_env_vars(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> KanonConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<KanonConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let flag = || {
            parse_bool(value).ok_or_else(|| ConfigError::EnvVar {
                var: key.to_string(),
                reason: "expected boolean",
            })
        };

        match parts.as_slice() {
            ["BINDING", "CONVERT_HEADER_UNDERSCORES"] => {
                self.config.binding.convert_header_underscores = flag()?;
            }
            ["BINDING", "INCLUDE_INPUT"] => {
                self.config.binding.include_input = flag()?;
            }
            ["BINDING", "REQUIRE_JSON_CONTENT_TYPE"] => {
                self.config.binding.require_json_content_type = flag()?;
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = flag()?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.json_format = match value.to_lowercase().as_str() {
                    "json" => true,
                    "pretty" => false,
                    _ => {
                        return Err(ConfigError::EnvVar {
                            var: key.to_string(),
                            reason: "expected 'json' or 'pretty'",
                        })
                    }
                };
            }
            ["LOGGING", "FILE_LINE_INFO"] => {
                self.config.logging.file_line_info = flag()?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                self.config.logging.include_target = flag()?;
            }

            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = flag()?;
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, KanonConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert!(config.logging.json_format);
        assert!(config.binding.require_json_content_type);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"binding": {"convert_header_underscores": false}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert!(!config.binding.convert_header_underscores);
        assert!(config.binding.include_input);
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\nlevel = \"kanon_bind=debug\"\njson_format = false").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.logging.level, "kanon_bind=debug");
        assert!(!config.logging.json_format);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_loader_rejects_unknown_file_keys() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"binding": {{"strict": true}}}}"#).unwrap();

        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_loader_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/kanon.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/kanon.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, KanonConfig::default());
    }

    #[test]
    fn test_loader_with_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "KANON_TEST_DOTENV_MARKER=1").unwrap();

        let loader = ConfigLoader::new().with_dotenv_file(file.path());
        assert!(loader.is_ok());
        assert_eq!(env::var("KANON_TEST_DOTENV_MARKER").as_deref(), Ok("1"));
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_vars(
                "KANON",
                [
                    ("KANON__BINDING__INCLUDE_INPUT", "false"),
                    ("KANON__LOGGING__FORMAT", "pretty"),
                    ("KANON__LOGGING__LEVEL", "debug"),
                    ("KANON__METRICS__ENABLED", "off"),
                    ("KANON__UNKNOWN__KEY", "ignored"),
                    ("OTHER__BINDING__INCLUDE_INPUT", "true"),
                ],
            )
            .unwrap()
            .load()
            .unwrap();

        assert!(!config.binding.include_input);
        assert!(!config.logging.json_format);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_env_override_invalid_boolean() {
        let result = ConfigLoader::new()
            .with_env_vars("KANON", [("KANON__BINDING__INCLUDE_INPUT", "sometimes")]);
        assert!(matches!(result, Err(ConfigError::EnvVar { .. })));
    }

    #[test]
    fn test_env_override_invalid_level_fails_validation() {
        let result = ConfigLoader::new()
            .with_env_vars("KANON", [("KANON__LOGGING__LEVEL", "kanon=shouting")])
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
