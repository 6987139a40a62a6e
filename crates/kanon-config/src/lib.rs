//! Typed configuration for Kanon.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Layered configuration (defaults → file → `.env` → env)
//!
//! # Overview
//!
//! [`KanonConfig`] has three sections:
//!
//! - `binding` - [`kanon_bind::BindOptions`] for the binder
//! - `logging` - [`kanon_telemetry::LogConfig`]
//! - `metrics` - [`kanon_telemetry::MetricsConfig`]
//!
//! # Example
//!
//! ```no_run
//! use kanon_config::ConfigLoader;
//! use kanon_bind::Binder;
//!
//! # fn main() -> Result<(), kanon_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("kanon.toml")?
//!     .with_env_prefix("KANON")
//!     .load()?;
//!
//! let binder = Binder::new(config.bind_options());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [binding]
//! convert_header_underscores = true
//! include_input = false
//! require_json_content_type = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! json_format = true
//!
//! [metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `KANON__BINDING__INCLUDE_INPUT=false`
//! - `KANON__LOGGING__LEVEL=kanon_bind=debug`
//! - `KANON__LOGGING__FORMAT=pretty`
//! - `KANON__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{KanonConfig, KanonConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_file_format_parses() {
        let toml = r#"
            [binding]
            convert_header_underscores = true
            include_input = false
            require_json_content_type = true

            [logging]
            enabled = true
            level = "info"
            json_format = true

            [metrics]
            enabled = true
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.binding, KanonConfig::production().binding);
    }
}
