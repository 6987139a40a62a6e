//! Validation error types.
//!
//! Every failed check produces one [`ValidationError`] carrying where the
//! value came from, which check failed and a message. A failed binding
//! returns all of them at once as [`ValidationErrors`], which maps to an
//! HTTP 422 response.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    /// Path segments captured by the router (e.g. `/items/{item_id}`)
    Path,
    /// Query string pairs
    Query,
    /// HTTP headers
    Header,
    /// Cookies from the `Cookie` header
    Cookie,
    /// JSON request body
    Body,
}

impl ParamSource {
    /// Returns the lowercase name used in error locations.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required value was absent.
    Missing,
    /// The value could not be converted to the declared type.
    TypeMismatch,
    /// A numeric bound (gt/ge/lt/le) was violated.
    OutOfRange,
    /// A min/max length bound was violated.
    LengthViolation,
    /// A string did not match the declared pattern.
    PatternMismatch,
    /// The value is not one of the allowed values.
    EnumViolation,
    /// An undeclared field was sent to a model that forbids extras.
    ExtraFieldForbidden,
    /// A user-supplied validator rejected the value.
    CustomValidatorRejected,
}

impl ErrorKind {
    /// Returns the machine-readable name used in error envelopes.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::TypeMismatch => "type_mismatch",
            Self::OutOfRange => "out_of_range",
            Self::LengthViolation => "length_violation",
            Self::PatternMismatch => "pattern_mismatch",
            Self::EnumViolation => "enum_violation",
            Self::ExtraFieldForbidden => "extra_field_forbidden",
            Self::CustomValidatorRejected => "custom_validator_rejected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a field path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object member or parameter name
    Key(String),
    /// Position inside a list or set
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a value inside a request: its source plus a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    source: ParamSource,
    path: Vec<PathSegment>,
}

impl Location {
    /// Creates a location at the root of `source`.
    #[must_use]
    pub fn root(source: ParamSource) -> Self {
        Self {
            source,
            path: Vec::new(),
        }
    }

    /// Returns a child location one key deeper.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.path.push(PathSegment::Key(key.into()));
        child
    }

    /// Returns a child location one index deeper.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.path.push(PathSegment::Index(index));
        child
    }

    /// Returns the source.
    #[must_use]
    pub fn source(&self) -> ParamSource {
        self.source
    }

    /// Returns the path segments below the source.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Returns the path rendered with dots, e.g. `item.tags.1`.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}.{}", self.source, self.dotted())
        }
    }
}

/// A single failed check.
///
/// # Example
///
/// ```rust
/// use kanon_bind::{ErrorKind, Location, ParamSource, ValidationError};
///
/// let err = ValidationError::missing(Location::root(ParamSource::Path).key("item_id"));
/// assert_eq!(err.kind(), ErrorKind::Missing);
/// assert_eq!(err.field(), "item_id");
/// assert_eq!(err.to_string(), "path.item_id: field required");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    location: Location,
    kind: ErrorKind,
    message: String,
    input: Option<JsonValue>,
}

impl ValidationError {
    /// Creates an error of any kind.
    #[must_use]
    pub fn new(location: Location, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            location,
            kind,
            message: message.into(),
            input: None,
        }
    }

    /// Creates a `Missing` error.
    #[must_use]
    pub fn missing(location: Location) -> Self {
        Self::new(location, ErrorKind::Missing, "field required")
    }

    /// Creates a `TypeMismatch` error.
    #[must_use]
    pub fn type_mismatch(location: Location, expected: &str) -> Self {
        Self::new(
            location,
            ErrorKind::TypeMismatch,
            format!("input should be a valid {expected}"),
        )
    }

    /// Creates an `ExtraFieldForbidden` error.
    #[must_use]
    pub fn extra_forbidden(location: Location) -> Self {
        Self::new(
            location,
            ErrorKind::ExtraFieldForbidden,
            "extra inputs are not permitted",
        )
    }

    /// Attaches the offending input.
    #[must_use]
    pub fn with_input(mut self, input: JsonValue) -> Self {
        self.input = Some(input);
        self
    }

    /// Returns the location.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the dotted field path below the source.
    #[must_use]
    pub fn field(&self) -> String {
        self.location.dotted()
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending input, if recorded.
    #[must_use]
    pub fn input(&self) -> Option<&JsonValue> {
        self.input.as_ref()
    }

    fn to_detail(&self, include_input: bool) -> ErrorDetail {
        let mut loc = Vec::with_capacity(self.location.path.len() + 1);
        loc.push(PathSegment::Key(self.location.source.as_str().to_string()));
        loc.extend(self.location.path.iter().cloned());
        ErrorDetail {
            loc,
            kind: self.kind,
            msg: self.message.clone(),
            input: if include_input { self.input.clone() } else { None },
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Every failure of one binding attempt, in declared parameter order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} validation error(s): {}", .errors.len(), summary(&.errors))]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

fn summary(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Wraps a list of errors.
    #[must_use]
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Returns the errors.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over the errors.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns the first error reported for the dotted field path.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field() == field)
    }

    /// Returns the HTTP status code for a rejected binding.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        "VALIDATION_FAILED"
    }

    /// Builds the machine-readable response body.
    ///
    /// Offending inputs are only included when `include_input` is set, since
    /// they may echo secrets such as tokens back to the client.
    #[must_use]
    pub fn to_envelope(&self, include_input: bool) -> ErrorEnvelope {
        ErrorEnvelope {
            detail: self
                .errors
                .iter()
                .map(|e| e.to_detail(include_input))
                .collect(),
        }
    }

    /// Consumes the collection and returns the errors.
    #[must_use]
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Serializable 422 response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// One entry per failed check.
    pub detail: Vec<ErrorDetail>,
}

/// One entry of an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Source followed by the field path, e.g. `["query", "tags", 1]`.
    pub loc: Vec<PathSegment>,
    /// Machine-readable error kind.
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Human-readable message.
    pub msg: String,
    /// The offending input, when recorded and allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<JsonValue>,
}

/// Errors in a descriptor table, detected when it is built.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A `pattern` constraint is not a valid regular expression.
    #[error("invalid pattern for '{field}': {source}")]
    InvalidPattern {
        /// Field declaring the pattern.
        field: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A constraint is declared on a type it can never apply to, such as
    /// a numeric bound on a string.
    #[error("constraint '{constraint}' on '{field}' cannot apply to type {ty}")]
    ConstraintMismatch {
        /// Field declaring the constraint.
        field: String,
        /// Constraint name, e.g. `one_of`.
        constraint: &'static str,
        /// Type description.
        ty: String,
    },

    /// Two parameters of one endpoint share a logical name.
    #[error("duplicate parameter '{name}' in endpoint '{endpoint}'")]
    DuplicateParameter {
        /// Endpoint name.
        endpoint: String,
        /// Repeated logical name.
        name: String,
    },

    /// A type cannot be read from the declared source.
    #[error("parameter '{name}' of type {ty} cannot be read from {source_name}")]
    UnsupportedSource {
        /// Parameter name.
        name: String,
        /// Type description.
        ty: String,
        /// Source name.
        source_name: ParamSource,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loc(source: ParamSource, field: &str) -> Location {
        Location::root(source).key(field)
    }

    #[test]
    fn test_location_rendering() {
        let location = Location::root(ParamSource::Body).key("item").key("tags").index(1);
        assert_eq!(location.dotted(), "item.tags.1");
        assert_eq!(location.to_string(), "body.item.tags.1");
        assert_eq!(Location::root(ParamSource::Body).to_string(), "body");
    }

    #[test]
    fn test_missing_error() {
        let err = ValidationError::missing(loc(ParamSource::Query, "needy"));
        assert_eq!(err.kind(), ErrorKind::Missing);
        assert_eq!(err.field(), "needy");
        assert_eq!(err.location().source(), ParamSource::Query);
        assert!(err.to_string().contains("needy"));
    }

    #[test]
    fn test_type_mismatch_error() {
        let err = ValidationError::type_mismatch(loc(ParamSource::Path, "item_id"), "integer")
            .with_input(json!("abc"));
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.message(), "input should be a valid integer");
        assert_eq!(err.input(), Some(&json!("abc")));
    }

    #[test]
    fn test_errors_status_and_code() {
        let errors = ValidationErrors::new(vec![ValidationError::missing(loc(
            ParamSource::Cookie,
            "session_id",
        ))]);
        assert_eq!(errors.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(errors.error_code(), "VALIDATION_FAILED");
        assert_eq!(errors.len(), 1);
        assert!(errors.for_field("session_id").is_some());
        assert!(errors.to_string().starts_with("1 validation error(s)"));
    }

    #[test]
    fn test_envelope_shape() {
        let errors = ValidationErrors::new(vec![
            ValidationError::type_mismatch(loc(ParamSource::Path, "item_id"), "integer")
                .with_input(json!("abc")),
            ValidationError::missing(Location::root(ParamSource::Query).key("tags").index(0)),
        ]);

        let envelope = serde_json::to_value(errors.to_envelope(true)).unwrap();
        assert_eq!(
            envelope,
            json!({
                "detail": [
                    {
                        "loc": ["path", "item_id"],
                        "type": "type_mismatch",
                        "msg": "input should be a valid integer",
                        "input": "abc"
                    },
                    {
                        "loc": ["query", "tags", 0],
                        "type": "missing",
                        "msg": "field required"
                    }
                ]
            })
        );
    }

    #[test]
    fn test_envelope_hides_input_when_asked() {
        let errors = ValidationErrors::new(vec![ValidationError::type_mismatch(
            loc(ParamSource::Header, "x-token"),
            "integer",
        )
        .with_input(json!("secret"))]);

        let envelope = errors.to_envelope(false);
        assert_eq!(envelope.detail[0].input, None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::ExtraFieldForbidden.as_str(), "extra_field_forbidden");
        assert_eq!(
            serde_json::to_value(ErrorKind::CustomValidatorRejected).unwrap(),
            json!("custom_validator_rejected")
        );
        assert_eq!(ParamSource::Cookie.to_string(), "cookie");
    }
}
