//! Result assembly.
//!
//! The [`Binder`] runs extraction and validation for every parameter of an
//! endpoint and assembles the outcome: either [`BoundArguments`] holding
//! every value, or [`ValidationErrors`] holding every failure in declared
//! parameter order. Parameters are checked independently, so one bad value
//! never hides another.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::extract::{extract, wire_name, ExtractOptions};
use crate::validate::coerce_and_validate;
use crate::{
    BoundArguments, Endpoint, ErrorEnvelope, Location, ParamSource, ParameterSpec, RawRequest,
    ValidationErrors,
};

/// Binding behavior shared by every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindOptions {
    /// Look headers up with `_` replaced by `-` unless overridden per
    /// parameter or aliased.
    pub convert_header_underscores: bool,
    /// Echo offending inputs in error envelopes.
    pub include_input: bool,
    /// Reject bodies sent without a JSON `Content-Type`.
    pub require_json_content_type: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            convert_header_underscores: true,
            include_input: true,
            require_json_content_type: false,
        }
    }
}

impl BindOptions {
    fn extract_options(self) -> ExtractOptions {
        ExtractOptions {
            convert_header_underscores: self.convert_header_underscores,
            require_json_content_type: self.require_json_content_type,
        }
    }
}

/// Binds raw requests to endpoint descriptor tables.
///
/// A binder holds no per-request state; share one across threads.
///
/// # Example
///
/// ```rust
/// use kanon_bind::{Binder, Endpoint, ErrorKind, ParamType, ParameterSpec, RawRequest};
///
/// let endpoint = Endpoint::builder("read_item")
///     .param(ParameterSpec::path("item_id", ParamType::Integer))
///     .build()
///     .unwrap();
/// let binder = Binder::default();
///
/// let ok = RawRequest::builder().path_param("item_id", "5").build();
/// assert_eq!(binder.bind(&ok, &endpoint).unwrap().get_i64("item_id"), Some(5));
///
/// let bad = RawRequest::builder().path_param("item_id", "abc").build();
/// let errors = binder.bind(&bad, &endpoint).unwrap_err();
/// assert_eq!(errors.errors()[0].kind(), ErrorKind::TypeMismatch);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Binder {
    options: BindOptions,
}

impl Binder {
    /// Creates a binder.
    #[must_use]
    pub fn new(options: BindOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Binds every parameter of `endpoint` from `request`.
    ///
    /// # Errors
    ///
    /// Returns every validation failure, in declared parameter order, if any
    /// parameter is missing or invalid.
    pub fn bind(
        &self,
        request: &RawRequest,
        endpoint: &Endpoint,
    ) -> Result<BoundArguments, ValidationErrors> {
        let extract_options = self.options.extract_options();
        let mut values = IndexMap::with_capacity(endpoint.params().len());
        let mut errors = Vec::new();

        for param in endpoint.params() {
            let raw = extract(request, param, &extract_options);
            let location = self.location(param);
            match coerce_and_validate(&raw, param.field(), &location) {
                Ok(value) => {
                    values.insert(param.name().to_string(), value);
                }
                Err(mut param_errors) => errors.append(&mut param_errors),
            }
        }

        if errors.is_empty() {
            debug!(endpoint = endpoint.name(), params = values.len(), "request bound");
            kanon_telemetry::record_binding(endpoint.name(), true);
            Ok(BoundArguments::new(values))
        } else {
            info!(endpoint = endpoint.name(), errors = errors.len(), "request rejected");
            kanon_telemetry::record_binding(endpoint.name(), false);
            for error in &errors {
                kanon_telemetry::record_validation_error(endpoint.name(), error.kind().as_str());
            }
            Err(ValidationErrors::new(errors))
        }
    }

    /// Renders the 422 response body for a rejected binding.
    #[must_use]
    pub fn envelope(&self, errors: &ValidationErrors) -> ErrorEnvelope {
        errors.to_envelope(self.options.include_input)
    }

    /// Location errors for `param` are reported under.
    ///
    /// Parameter models and a lone body parameter report their members
    /// directly under the source; everything else adds the wire name.
    #[must_use]
    pub fn location(&self, param: &ParameterSpec) -> Location {
        let root = Location::root(param.source());
        match param.source() {
            ParamSource::Body if param.is_embedded() => root.key(param.field().wire_name()),
            ParamSource::Body => root,
            _ if param.is_model() => root,
            _ => root.key(wire_name(param, &self.options.extract_options())),
        }
    }
}
