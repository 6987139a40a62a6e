//! Bound arguments.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::Value;

/// Every parameter of an endpoint, coerced and validated.
///
/// Values are keyed by logical name and kept in declaration order. An
/// instance only exists once every parameter has passed, so handlers can
/// read values without re-checking them.
///
/// # Example
///
/// ```rust
/// use kanon_bind::{Binder, Endpoint, ParamType, ParameterSpec, PathParams, RawRequest};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct ReadItem {
///     item_id: i64,
/// }
///
/// let endpoint = Endpoint::builder("read_item")
///     .param(ParameterSpec::path("item_id", ParamType::Integer))
///     .build()
///     .unwrap();
/// let request = RawRequest::builder().path_param("item_id", "5").build();
///
/// let args = Binder::default().bind(&request, &endpoint).unwrap();
/// assert_eq!(args.get_i64("item_id"), Some(5));
///
/// let typed: ReadItem = args.deserialize().unwrap();
/// assert_eq!(typed.item_id, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundArguments {
    values: IndexMap<String, Value>,
}

impl BoundArguments {
    pub(crate) fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns an integer argument.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Returns a numeric argument as a float.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Returns a boolean argument.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns a string or enumeration argument.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns a UUID argument.
    #[must_use]
    pub fn get_uuid(&self, name: &str) -> Option<Uuid> {
        self.get(name).and_then(Value::as_uuid)
    }

    /// Returns true if `name` is bound to a non-null value.
    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the endpoint declares no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.values.iter()
    }

    /// Renders the arguments as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Deserializes the arguments into a handler's own type.
    ///
    /// Timestamps, durations and UUIDs arrive as their string forms, so the
    /// target fields should use types that deserialize from those (for
    /// example `chrono::DateTime` or `uuid::Uuid` with their serde features).
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the shape does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }

    /// Consumes the arguments and returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl<'a> IntoIterator for &'a BoundArguments {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
