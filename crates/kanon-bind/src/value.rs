//! Typed values produced by coercion.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A value after coercion to its declared type.
///
/// Serializes to the JSON a client would expect back: timestamps as RFC 3339,
/// durations as ISO-8601 (`PT1H30M`), UUIDs hyphenated.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit absence (`None` default or JSON `null`).
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Finite float.
    Float(f64),
    /// Text.
    Str(String),
    /// UUID.
    Uuid(Uuid),
    /// Timestamp with offset.
    DateTime(DateTime<FixedOffset>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Signed duration.
    Duration(TimeDelta),
    /// Member of an enumeration.
    Enum(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Deduplicated sequence, first occurrence kept.
    Set(Vec<Value>),
    /// Object with declared fields in declaration order.
    Object(IndexMap<String, Value>),
    /// Map entries in the order they were sent.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the number as a float; integers are widened.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns text or an enumeration member as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) | Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the UUID, if this is one.
    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the elements of a list or set.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the members of an object or the entries of a map.
    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(fields) | Self::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the textual form compared against enumeration members.
    pub(crate) fn enum_key(&self) -> Option<String> {
        match self {
            Self::Str(v) | Self::Enum(v) => Some(v.clone()),
            Self::Int(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            _ => None,
        }
    }

    /// Converts the value to JSON.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Formats a duration as ISO-8601, e.g. `P1DT2H3M4.5S` or `-PT30S`.
pub(crate) fn format_duration(delta: TimeDelta) -> String {
    let negative = delta < TimeDelta::zero();
    let delta = delta.abs();
    let days = delta.num_days();
    let hours = delta.num_hours() % 24;
    let minutes = delta.num_minutes() % 60;
    let seconds = delta.num_seconds() % 60;
    let nanos = delta.subsec_nanos();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('P');
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if nanos > 0 {
            let frac = format!("{nanos:09}");
            out.push_str(&format!("{seconds}.{}S", frac.trim_end_matches('0')));
        } else if seconds > 0 || (hours == 0 && minutes == 0) {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Str(v) | Self::Enum(v) => serializer.serialize_str(v),
            Self::Uuid(v) => serializer.serialize_str(&v.hyphenated().to_string()),
            Self::DateTime(v) => serializer.serialize_str(&v.to_rfc3339()),
            Self::Date(v) => serializer.serialize_str(&v.format("%Y-%m-%d").to_string()),
            Self::Time(v) => serializer.serialize_str(&v.format("%H:%M:%S%.f").to_string()),
            Self::Duration(v) => serializer.serialize_str(&format_duration(*v)),
            Self::List(items) | Self::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(fields) | Self::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
