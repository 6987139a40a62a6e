//! Parameter descriptor tables.
//!
//! An [`Endpoint`] is an ordered list of [`ParameterSpec`]s built once at
//! startup. Each spec says where a value comes from ([`ParamSource`]), what
//! it should become ([`ParamType`]) and which checks it must pass
//! ([`Constraints`], custom validators).
//!
//! ```rust
//! use kanon_bind::{Endpoint, FieldBuilder, ParamType, ParameterSpec};
//!
//! let endpoint = Endpoint::builder("read_user_item")
//!     .param(ParameterSpec::path("user_id", ParamType::Integer))
//!     .param(ParameterSpec::path("item_id", ParamType::String))
//!     .param(ParameterSpec::query("needy", ParamType::String))
//!     .param(ParameterSpec::query("q", ParamType::String).optional())
//!     .param(ParameterSpec::query("short", ParamType::Boolean).default(false))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(endpoint.params().len(), 5);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use crate::error::{ParamSource, SpecError};
use crate::Value;

/// Declared type of a parameter or model field.
#[derive(Debug, Clone)]
pub enum ParamType {
    /// Text, passed through unchanged.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// Finite 64-bit float.
    Float,
    /// Boolean from `true`/`1`/`false`/`0`.
    Boolean,
    /// Hyphenated UUID.
    Uuid,
    /// Timestamp (RFC 3339, naive ISO-8601 as UTC, or Unix seconds).
    DateTime,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
    /// Time of day (`HH:MM[:SS[.fff]]`).
    Time,
    /// Duration (ISO-8601 `PnWnDTnHnMnS` or seconds).
    Duration,
    /// One of a fixed set of strings.
    Enum(Arc<[String]>),
    /// Ordered list of items.
    List(Box<ParamType>),
    /// Deduplicated list of items.
    Set(Box<ParamType>),
    /// JSON object with arbitrary string keys and values of one type.
    Map(Box<ParamType>),
    /// Nested object.
    Object(Arc<ModelSpec>),
}

impl ParamType {
    /// Builds an enumeration type from its members.
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(members.into_iter().map(Into::into).collect())
    }

    /// Builds a list type.
    #[must_use]
    pub fn list(item: ParamType) -> Self {
        Self::List(Box::new(item))
    }

    /// Builds a set type.
    #[must_use]
    pub fn set(item: ParamType) -> Self {
        Self::Set(Box::new(item))
    }

    /// Builds a map type from its value type.
    #[must_use]
    pub fn map(item: ParamType) -> Self {
        Self::Map(Box::new(item))
    }

    /// Builds an object type from a model.
    #[must_use]
    pub fn object(model: ModelSpec) -> Self {
        Self::Object(Arc::new(model))
    }

    /// Returns true for lists and sets.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_))
    }

    /// Returns the allowed members of an enumeration type.
    #[must_use]
    pub fn enum_members(&self) -> Option<&[String]> {
        match self {
            Self::Enum(members) => Some(members),
            _ => None,
        }
    }

    /// Name used in type-mismatch messages.
    #[must_use]
    pub fn expected(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Boolean => "boolean",
            Self::Uuid => "UUID",
            Self::DateTime => "datetime",
            Self::Date => "date",
            Self::Time => "time",
            Self::Duration => "duration",
            Self::Enum(_) => "enumeration member",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "dictionary",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(members) => write!(f, "enum[{}]", members.join("|")),
            Self::List(item) => write!(f, "list[{item}]"),
            Self::Set(item) => write!(f, "set[{item}]"),
            Self::Map(item) => write!(f, "map[{item}]"),
            Self::Object(model) => write!(f, "{}", model.name()),
            other => f.write_str(other.expected()),
        }
    }
}

/// Compiled regular expression constraint.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Result<Regex, regex::Error>,
}

impl Pattern {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            regex: Regex::new(source),
        }
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `text` contains a match.
    ///
    /// Returns false when the pattern failed to compile; [`Endpoint`]
    /// construction rejects such patterns up front.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_ok_and(|r| r.is_match(text))
    }
}

/// Declared checks, applied after coercion in field order:
/// numeric bounds, length bounds, pattern, enum membership.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Value must be greater than this.
    pub gt: Option<f64>,
    /// Value must be greater than or equal to this.
    pub ge: Option<f64>,
    /// Value must be less than this.
    pub lt: Option<f64>,
    /// Value must be less than or equal to this.
    pub le: Option<f64>,
    /// Minimum length (characters or elements).
    pub min_length: Option<usize>,
    /// Maximum length (characters or elements).
    pub max_length: Option<usize>,
    /// Pattern a string must contain.
    pub pattern: Option<Pattern>,
    /// Allowed values, compared on their textual form.
    pub one_of: Option<Arc<[String]>>,
}

/// Outcome of a user-supplied check.
pub type ValidatorFn = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// A named user-supplied check run after the built-in constraints.
#[derive(Clone)]
pub struct CustomValidator {
    name: String,
    check: Arc<ValidatorFn>,
}

impl CustomValidator {
    /// Wraps a check function.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Returns the validator name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the check.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Whether a value must be present.
#[derive(Debug, Clone, Default)]
pub enum Requirement {
    /// Absence is a `Missing` error.
    #[default]
    Required,
    /// Absence yields this value, which is not validated.
    Default(Value),
    /// Absence yields `Null`; an explicit JSON `null` is accepted too.
    Optional,
}

/// What to do with input members a model does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtraPolicy {
    /// Drop them silently.
    #[default]
    Ignore,
    /// Report each one as `ExtraFieldForbidden`.
    Forbid,
}

/// A declared field: a model member, or the payload of a [`ParameterSpec`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    alias: Option<String>,
    ty: ParamType,
    constraints: Constraints,
    requirement: Requirement,
    validators: Vec<CustomValidator>,
    description: Option<String>,
}

impl FieldSpec {
    /// Declares a required field.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            ty,
            constraints: Constraints::default(),
            requirement: Requirement::Required,
            validators: Vec::new(),
            description: None,
        }
    }

    /// Logical name, used as the key of bound values.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire name override.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name looked up in the request: the alias if set, else the name.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &ParamType {
        &self.ty
    }

    /// Declared constraints.
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Presence rule.
    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// User-supplied checks in declaration order.
    #[must_use]
    pub fn validators(&self) -> &[CustomValidator] {
        &self.validators
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns true if absence is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self.requirement, Requirement::Required)
    }

    /// Returns true if an explicit `null` is acceptable.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(
            self.requirement,
            Requirement::Optional | Requirement::Default(Value::Null)
        )
    }

    /// Value used when the field is absent, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        match &self.requirement {
            Requirement::Required => None,
            Requirement::Default(value) => Some(value.clone()),
            Requirement::Optional => Some(Value::Null),
        }
    }

    /// Rejects patterns that failed to compile and constraints that can
    /// never apply to the field's type, here and in nested models.
    fn check_constraints(&self) -> Result<(), SpecError> {
        let c = &self.constraints;
        if let Some(Pattern {
            regex: Err(source), ..
        }) = &c.pattern
        {
            return Err(SpecError::InvalidPattern {
                field: self.name.clone(),
                source: source.clone(),
            });
        }

        let numeric = matches!(self.ty, ParamType::Integer | ParamType::Float);
        let sized = matches!(
            self.ty,
            ParamType::String | ParamType::List(_) | ParamType::Set(_) | ParamType::Map(_)
        );
        let text = matches!(self.ty, ParamType::String);
        let keyed = matches!(
            self.ty,
            ParamType::String | ParamType::Integer | ParamType::Boolean | ParamType::Enum(_)
        );
        let declared = [
            ("gt", c.gt.is_some(), numeric),
            ("ge", c.ge.is_some(), numeric),
            ("lt", c.lt.is_some(), numeric),
            ("le", c.le.is_some(), numeric),
            ("min_length", c.min_length.is_some(), sized),
            ("max_length", c.max_length.is_some(), sized),
            ("pattern", c.pattern.is_some(), text),
            ("one_of", c.one_of.is_some(), keyed),
        ];
        if let Some((constraint, _, _)) = declared.iter().find(|(_, set, fits)| *set && !*fits) {
            return Err(SpecError::ConstraintMismatch {
                field: self.name.clone(),
                constraint: *constraint,
                ty: self.ty.to_string(),
            });
        }

        let mut ty = &self.ty;
        while let ParamType::List(item) | ParamType::Set(item) | ParamType::Map(item) = ty {
            ty = item;
        }
        if let ParamType::Object(model) = ty {
            for field in model.fields() {
                field.check_constraints()?;
            }
        }
        Ok(())
    }
}

/// Builder methods shared by [`FieldSpec`] and [`ParameterSpec`].
pub trait FieldBuilder: Sized {
    /// Gives mutable access to the field being declared.
    fn field_mut(&mut self) -> &mut FieldSpec;

    /// Sets the wire name.
    #[must_use]
    fn alias(mut self, alias: impl Into<String>) -> Self {
        self.field_mut().alias = Some(alias.into());
        self
    }

    /// Requires `value > bound`.
    #[must_use]
    fn gt(mut self, bound: f64) -> Self {
        self.field_mut().constraints.gt = Some(bound);
        self
    }

    /// Requires `value >= bound`.
    #[must_use]
    fn ge(mut self, bound: f64) -> Self {
        self.field_mut().constraints.ge = Some(bound);
        self
    }

    /// Requires `value < bound`.
    #[must_use]
    fn lt(mut self, bound: f64) -> Self {
        self.field_mut().constraints.lt = Some(bound);
        self
    }

    /// Requires `value <= bound`.
    #[must_use]
    fn le(mut self, bound: f64) -> Self {
        self.field_mut().constraints.le = Some(bound);
        self
    }

    /// Requires at least `len` characters or elements.
    #[must_use]
    fn min_length(mut self, len: usize) -> Self {
        self.field_mut().constraints.min_length = Some(len);
        self
    }

    /// Allows at most `len` characters or elements.
    #[must_use]
    fn max_length(mut self, len: usize) -> Self {
        self.field_mut().constraints.max_length = Some(len);
        self
    }

    /// Requires a string to contain a match of `pattern`.
    #[must_use]
    fn pattern(mut self, pattern: &str) -> Self {
        self.field_mut().constraints.pattern = Some(Pattern::new(pattern));
        self
    }

    /// Restricts the value to a fixed set of textual forms.
    #[must_use]
    fn one_of<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_mut().constraints.one_of = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Makes the field optional with a default value.
    #[must_use]
    fn default(mut self, value: impl Into<Value>) -> Self {
        self.field_mut().requirement = Requirement::Default(value.into());
        self
    }

    /// Makes the field optional, defaulting to `Null`.
    #[must_use]
    fn optional(mut self) -> Self {
        self.field_mut().requirement = Requirement::Optional;
        self
    }

    /// Adds a custom validator.
    #[must_use]
    fn validator(mut self, validator: CustomValidator) -> Self {
        self.field_mut().validators.push(validator);
        self
    }

    /// Adds a custom validator from a closure.
    #[must_use]
    fn check<F>(self, name: &str, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator(CustomValidator::new(name, check))
    }

    /// Sets a description.
    #[must_use]
    fn describe(mut self, description: impl Into<String>) -> Self {
        self.field_mut().description = Some(description.into());
        self
    }
}

impl FieldBuilder for FieldSpec {
    fn field_mut(&mut self) -> &mut FieldSpec {
        self
    }
}

/// A nested object declaration.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    name: String,
    fields: Vec<FieldSpec>,
    extra: ExtraPolicy,
}

impl ModelSpec {
    /// Starts a model with no fields that ignores extras.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            extra: ExtraPolicy::Ignore,
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the extra-field policy.
    #[must_use]
    pub fn extra(mut self, policy: ExtraPolicy) -> Self {
        self.extra = policy;
        self
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Extra-field policy.
    #[must_use]
    pub fn extra_policy(&self) -> ExtraPolicy {
        self.extra
    }

    /// Returns true if a declared field answers to `wire_name`.
    #[must_use]
    pub fn declares(&self, wire_name: &str) -> bool {
        self.fields.iter().any(|f| f.wire_name() == wire_name)
    }
}

/// A request parameter: a field plus the source it is read from.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    source: ParamSource,
    field: FieldSpec,
    convert_underscores: Option<bool>,
    embed: bool,
}

impl ParameterSpec {
    /// Declares a required parameter.
    #[must_use]
    pub fn new(source: ParamSource, name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            source,
            field: FieldSpec::new(name, ty),
            convert_underscores: None,
            embed: false,
        }
    }

    /// Declares a path parameter.
    #[must_use]
    pub fn path(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(ParamSource::Path, name, ty)
    }

    /// Declares a query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(ParamSource::Query, name, ty)
    }

    /// Declares a header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(ParamSource::Header, name, ty)
    }

    /// Declares a cookie parameter.
    #[must_use]
    pub fn cookie(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(ParamSource::Cookie, name, ty)
    }

    /// Declares a body parameter.
    #[must_use]
    pub fn body(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(ParamSource::Body, name, ty)
    }

    /// Overrides underscore-to-hyphen conversion for a header parameter.
    #[must_use]
    pub fn convert_underscores(mut self, convert: bool) -> Self {
        self.convert_underscores = Some(convert);
        self
    }

    /// Reads a body parameter from the member named after it rather than
    /// from the whole document.
    #[must_use]
    pub fn embed(mut self) -> Self {
        self.embed = true;
        self
    }

    /// Source the value is read from.
    #[must_use]
    pub fn source(&self) -> ParamSource {
        self.source
    }

    /// The declared field.
    #[must_use]
    pub fn field(&self) -> &FieldSpec {
        &self.field
    }

    /// Logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &ParamType {
        self.field.ty()
    }

    /// Per-parameter underscore conversion, if overridden.
    #[must_use]
    pub fn convert_underscores_override(&self) -> Option<bool> {
        self.convert_underscores
    }

    /// Returns true if the body member named after this parameter is read.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embed
    }

    /// Returns true if this parameter reads every pair at its source.
    #[must_use]
    pub fn is_model(&self) -> bool {
        matches!(self.field.ty, ParamType::Object(_)) && self.source != ParamSource::Body
    }
}

impl FieldBuilder for ParameterSpec {
    fn field_mut(&mut self) -> &mut FieldSpec {
        &mut self.field
    }
}

/// An endpoint's descriptor table.
///
/// Immutable once built; share it behind an `Arc` or a `static`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: String,
    params: Vec<ParameterSpec>,
}

impl Endpoint {
    /// Starts a descriptor table.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Endpoint (operation) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Looks up a parameter by logical name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name() == name)
    }
}

/// Builder for [`Endpoint`].
#[derive(Debug)]
pub struct EndpointBuilder {
    name: String,
    params: Vec<ParameterSpec>,
}

impl EndpointBuilder {
    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Checks the table and builds the endpoint.
    ///
    /// When more than one body parameter is declared, all of them are
    /// embedded.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] for duplicate names, invalid patterns, or types
    /// that cannot be read from their declared source.
    pub fn build(mut self) -> Result<Endpoint, SpecError> {
        if let Err(error) = self.check() {
            warn!(endpoint = %self.name, %error, "invalid descriptor table");
            return Err(error);
        }

        let body_params = self
            .params
            .iter()
            .filter(|p| p.source == ParamSource::Body)
            .count();
        if body_params > 1 {
            for param in &mut self.params {
                if param.source == ParamSource::Body {
                    param.embed = true;
                }
            }
        }

        Ok(Endpoint {
            name: self.name,
            params: self.params,
        })
    }

    fn check(&self) -> Result<(), SpecError> {
        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name()) {
                return Err(SpecError::DuplicateParameter {
                    endpoint: self.name.clone(),
                    name: param.name().to_string(),
                });
            }
            let unsupported = match param.source {
                ParamSource::Path => {
                    param.ty().is_sequence()
                        || matches!(param.ty(), ParamType::Object(_) | ParamType::Map(_))
                }
                ParamSource::Query | ParamSource::Header | ParamSource::Cookie => {
                    needs_nesting(param.ty())
                }
                ParamSource::Body => false,
            };
            if unsupported {
                return Err(SpecError::UnsupportedSource {
                    name: param.name().to_string(),
                    ty: param.ty().to_string(),
                    source_name: param.source,
                });
            }
            param.field.check_constraints()?;
        }
        Ok(())
    }
}

/// Maps, objects inside sequences and objects nesting objects cannot be
/// spelled as flat key/value pairs.
fn needs_nesting(ty: &ParamType) -> bool {
    match ty {
        ParamType::Map(_) => true,
        ParamType::List(item) | ParamType::Set(item) => {
            matches!(**item, ParamType::Object(_) | ParamType::Map(_)) || item.is_sequence()
        }
        ParamType::Object(model) => model.fields().iter().any(|f| {
            matches!(f.ty(), ParamType::Object(_)) || needs_nesting(f.ty())
        }),
        _ => false,
    }
}
