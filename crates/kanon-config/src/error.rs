//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format '{0}' (expected toml or json)")]
    UnsupportedFormat(String),

    /// Malformed TOML or an unknown key in it.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON or an unknown key in it.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file exists but is malformed.
    #[error("cannot load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// An override variable holds a value of the wrong shape.
    #[error("{var}: {reason}")]
    EnvVar {
        /// Full variable name, prefix included.
        var: String,
        /// What was expected.
        reason: &'static str,
    },

    /// A loaded value fails validation.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted setting name, e.g. `logging.level`.
        field: &'static str,
        /// Validation message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = ConfigError::FileNotFound("/etc/kanon/kanon.toml".into());
        assert_eq!(
            err.to_string(),
            "configuration file not found: /etc/kanon/kanon.toml"
        );
    }

    #[test]
    fn test_env_var_message() {
        let err = ConfigError::EnvVar {
            var: "KANON__BINDING__INCLUDE_INPUT".to_string(),
            reason: "expected boolean",
        };
        assert_eq!(
            err.to_string(),
            "KANON__BINDING__INCLUDE_INPUT: expected boolean"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(source);
        assert!(err.to_string().starts_with("invalid JSON configuration"));
    }
}
