//! Scalar coercion.
//!
//! Converts one raw input, either text from the path, query, headers or
//! cookies, or a JSON value from the body, into a typed [`Value`]. Composite
//! types (lists, sets, objects) are walked in [`crate::validate`]; this module
//! only sees their leaves.
//!
//! Rules:
//!
//! | Type | Text | JSON |
//! |------|------|------|
//! | string | as-is | strings only |
//! | integer | `i64` parse | integers, floats with no fraction, numeric strings |
//! | float | `f64` parse, finite | numbers, numeric strings |
//! | boolean | `true`/`1`/`false`/`0`, any case | booleans, `0`/`1`, token strings |
//! | uuid | `8-4-4-4-12` hex | strings |
//! | datetime | RFC 3339, naive ISO (UTC), Unix seconds | strings, integers |
//! | date | `YYYY-MM-DD` | strings |
//! | time | `HH:MM[:SS[.f]]` | strings |
//! | duration | ISO-8601 or seconds | strings, numbers |
//! | enum | as-is | strings |

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{ParamType, Value};

/// Formats accepted for naive (offset-less) timestamps.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Formats accepted for times of day.
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Largest duration accepted, in seconds (what fits in `i64` nanoseconds).
const MAX_DURATION_SECS: f64 = 9_223_372_036.0;

/// Coerces text to a scalar type. Returns `None` on failure.
pub(crate) fn coerce_text(text: &str, ty: &ParamType) -> Option<Value> {
    match ty {
        ParamType::String => Some(Value::Str(text.to_string())),
        ParamType::Integer => text.parse::<i64>().ok().map(Value::Int),
        ParamType::Float => parse_float(text).map(Value::Float),
        ParamType::Boolean => parse_bool(text).map(Value::Bool),
        ParamType::Uuid => parse_uuid(text).map(Value::Uuid),
        ParamType::DateTime => parse_datetime(text).map(Value::DateTime),
        ParamType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(Value::Date),
        ParamType::Time => parse_time(text).map(Value::Time),
        ParamType::Duration => parse_duration(text).map(Value::Duration),
        ParamType::Enum(_) => Some(Value::Enum(text.to_string())),
        ParamType::List(_) | ParamType::Set(_) | ParamType::Map(_) | ParamType::Object(_) => None,
    }
}

/// Coerces a JSON value to a scalar type. Returns `None` on failure.
pub(crate) fn coerce_json(json: &JsonValue, ty: &ParamType) -> Option<Value> {
    match (ty, json) {
        (ParamType::String, JsonValue::String(s)) => Some(Value::Str(s.clone())),
        (ParamType::Integer, JsonValue::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e18)
                .map(|f| f as i64)
        }).map(Value::Int),
        (ParamType::Float, JsonValue::Number(n)) => {
            n.as_f64().filter(|f| f.is_finite()).map(Value::Float)
        }
        (ParamType::Boolean, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
        (ParamType::Boolean, JsonValue::Number(n)) => match n.as_i64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },
        (ParamType::DateTime, JsonValue::Number(n)) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| Value::DateTime(dt.fixed_offset())),
        (ParamType::Duration, JsonValue::Number(n)) => {
            n.as_f64().and_then(duration_from_secs).map(Value::Duration)
        }
        (ParamType::String, _) => None,
        (_, JsonValue::String(s)) => coerce_text(s, ty),
        _ => None,
    }
}

fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

/// Accepts only the canonical hyphenated form.
fn parse_uuid(text: &str) -> Option<Uuid> {
    let bytes = text.as_bytes();
    if bytes.len() != 36 {
        return None;
    }
    for (i, b) in bytes.iter().enumerate() {
        let ok = match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_hexdigit(),
        };
        if !ok {
            return None;
        }
    }
    Uuid::try_parse(text).ok()
}

fn parse_datetime(text: &str) -> Option<DateTime<chrono::FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let secs = text.parse::<i64>().ok()?;
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset());
    }
    None
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}

fn duration_from_secs(secs: f64) -> Option<TimeDelta> {
    if !secs.is_finite() || secs.abs() >= MAX_DURATION_SECS {
        return None;
    }
    Some(TimeDelta::nanoseconds((secs * 1e9).round() as i64))
}

/// Parses an ISO-8601 duration (`P1W`, `P2DT3H`, `-PT1.5S`) or a number of
/// seconds (`90`, `1.5`).
///
/// Years and months are rejected because their length is not fixed.
///
/// # Example
///
/// ```rust
/// use chrono::TimeDelta;
/// use kanon_bind::parse_duration;
///
/// assert_eq!(parse_duration("PT1H30M"), Some(TimeDelta::minutes(90)));
/// assert_eq!(parse_duration("90"), Some(TimeDelta::seconds(90)));
/// assert_eq!(parse_duration("P1Y"), None);
/// ```
#[must_use]
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    if let Ok(secs) = text.parse::<f64>() {
        return duration_from_secs(secs);
    }

    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let rest = rest.strip_prefix('P').or_else(|| rest.strip_prefix('p'))?;

    let mut total = 0.0_f64;
    let mut in_time = false;
    let mut number = String::new();
    let mut components = 0;
    let mut time_components = 0;
    let mut last_unit_rank = 0_u8;

    for c in rest.chars() {
        match c {
            '0'..='9' | '.' | ',' => number.push(if c == ',' { '.' } else { c }),
            'T' | 't' => {
                if in_time || !number.is_empty() {
                    return None;
                }
                in_time = true;
                last_unit_rank = 2;
            }
            unit => {
                let (rank, factor) = match (in_time, unit.to_ascii_uppercase()) {
                    (false, 'W') => (1, 604_800.0),
                    (false, 'D') => (2, 86_400.0),
                    (true, 'H') => (3, 3_600.0),
                    (true, 'M') => (4, 60.0),
                    (true, 'S') => (5, 1.0),
                    _ => return None,
                };
                if rank <= last_unit_rank {
                    return None;
                }
                let value: f64 = number.parse().ok()?;
                // Only the smallest unit may carry a fraction.
                if value.fract() != 0.0 && rank != 5 {
                    return None;
                }
                total += value * factor;
                number.clear();
                components += 1;
                if in_time {
                    time_components += 1;
                }
                last_unit_rank = rank;
            }
        }
    }

    if !number.is_empty() || components == 0 || (in_time && time_components == 0) {
        return None;
    }
    duration_from_secs(if negative { -total } else { total })
}
