//! # Kanon Bind
//!
//! Typed request-parameter binding and validation.
//!
//! An endpoint declares its inputs once as a descriptor table. For every
//! request the [`Binder`] extracts each declared parameter from its source,
//! coerces it to the declared type, runs the declared constraints and either
//! hands the handler a complete set of [`BoundArguments`] or rejects the
//! request with every problem at once.
//!
//! ## Pipeline
//!
//! ```text
//!  RawRequest ──► extract ──► coerce_and_validate ──► Binder::bind
//!                 (per param)  (per param, independent)   │
//!                                                         ├─► BoundArguments
//!                                                         └─► ValidationErrors (422)
//! ```
//!
//! ## Sources
//!
//! | Source | Looked up by | Multiple values |
//! |--------|--------------|-----------------|
//! | [`ParamSource::Path`] | name | n/a |
//! | [`ParamSource::Query`] | alias or name | lists collect all, scalars take the last |
//! | [`ParamSource::Header`] | alias, or name with `_` → `-` | lists collect all, scalars take the last |
//! | [`ParamSource::Cookie`] | alias or name | scalars take the last |
//! | [`ParamSource::Body`] | whole JSON document, or member when embedded | n/a |
//!
//! Object-typed query, header and cookie parameters are *parameter models*:
//! they receive every pair at their source and validate it against the
//! model's fields.
//!
//! ## Example
//!
//! ```rust
//! use kanon_bind::{
//!     Binder, Endpoint, ErrorKind, FieldBuilder, FieldSpec, ModelSpec, ParamType,
//!     ParameterSpec, RawRequest,
//! };
//! use serde_json::json;
//!
//! let item = ModelSpec::new("Item")
//!     .field(FieldSpec::new("name", ParamType::String))
//!     .field(FieldSpec::new("price", ParamType::Float).gt(0.0));
//!
//! let endpoint = Endpoint::builder("create_item")
//!     .param(ParameterSpec::path("item_id", ParamType::Integer))
//!     .param(ParameterSpec::body("item", ParamType::object(item)))
//!     .build()
//!     .unwrap();
//!
//! let binder = Binder::default();
//!
//! let request = RawRequest::builder()
//!     .path_param("item_id", "7")
//!     .json(&json!({"name": "Foo", "price": 3.5}))
//!     .build();
//! let args = binder.bind(&request, &endpoint).unwrap();
//! assert_eq!(args.get_i64("item_id"), Some(7));
//!
//! let request = RawRequest::builder()
//!     .path_param("item_id", "seven")
//!     .json(&json!({"price": 0}))
//!     .build();
//! let errors = binder.bind(&request, &endpoint).unwrap_err();
//! let kinds: Vec<ErrorKind> = errors.iter().map(|e| e.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     [ErrorKind::TypeMismatch, ErrorKind::Missing, ErrorKind::OutOfRange]
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/kanon-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bind;
mod bound;
mod coerce;
mod constraint;
mod context;
mod error;
mod extract;
mod params;
mod spec;
mod validate;
mod value;

pub use bind::{BindOptions, Binder};
pub use bound::BoundArguments;
pub use coerce::parse_duration;
pub use context::{BodyPayload, RawRequest, RawRequestBuilder};
pub use error::{
    ErrorDetail, ErrorEnvelope, ErrorKind, Location, ParamSource, PathSegment, SpecError,
    ValidationError, ValidationErrors,
};
pub use extract::{extract, wire_name, ExtractOptions, RawValue};
pub use params::PathParams;
pub use spec::{
    Constraints, CustomValidator, Endpoint, EndpointBuilder, ExtraPolicy, FieldBuilder,
    FieldSpec, ModelSpec, ParamType, ParameterSpec, Pattern, Requirement, ValidatorFn,
};
pub use validate::{coerce_and_validate, FieldResult};
pub use value::Value;
