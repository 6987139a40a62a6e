//! # Kanon
//!
//! **Declarative request parameter binding and validation**
//!
//! Kanon turns a raw, already-parsed HTTP request into typed, validated
//! handler arguments:
//!
//! - **Descriptor tables** – Each endpoint declares its parameters once
//! - **Every source** – Path, query, headers, cookies and JSON bodies
//! - **All errors at once** – Every failing parameter is reported in a single 422 envelope
//! - **Observable** – Structured `tracing` logs and Prometheus counters
//!
//! ## Quick Start
//!
//! ```rust
//! use kanon::prelude::*;
//!
//! let endpoint = Endpoint::builder("read_item")
//!     .param(ParameterSpec::path("item_id", ParamType::Integer))
//!     .param(ParameterSpec::query("q", ParamType::String).optional())
//!     .build()
//!     .unwrap();
//!
//! let request = RawRequest::builder()
//!     .path_param("item_id", "42")
//!     .query("q=shoes")
//!     .build();
//!
//! let args = Binder::default().bind(&request, &endpoint).unwrap();
//! assert_eq!(args.get_i64("item_id"), Some(42));
//! assert_eq!(args.get_str("q"), Some("shoes"));
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! RawRequest → extract → coerce → constrain → BoundArguments
//!                                     ↓
//!                       ValidationErrors → 422 envelope
//! ```

#![doc(html_root_url = "https://docs.rs/kanon/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Binding engine
pub use kanon_bind as bind;

// Configuration
pub use kanon_config as config;

// Logging and metrics
pub use kanon_telemetry as telemetry;

pub mod tutorial;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use kanon::prelude::*;
///
/// let binder = Binder::new(BindOptions::default());
/// assert!(binder.options().include_input);
/// ```
pub mod prelude {
    pub use kanon_bind::{
        BindOptions, Binder, BoundArguments, Endpoint, ErrorEnvelope, ErrorKind, ExtraPolicy,
        FieldBuilder, FieldSpec, Location, ModelSpec, ParamSource, ParamType, ParameterSpec,
        RawRequest, SpecError, ValidationError, ValidationErrors, Value,
    };

    pub use kanon_config::{ConfigLoader, KanonConfig};

    pub use crate::tutorial::{Catalog, DispatchError, Operation};
}
