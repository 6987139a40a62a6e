//! Declared constraint checks.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. numeric bounds (`gt`, `ge`, `lt`, `le`)
//! 2. length bounds (`min_length`, `max_length`)
//! 3. pattern
//! 4. allowed values (`one_of`)
//! 5. custom validators, in declaration order

use crate::{ErrorKind, FieldSpec, Location, ValidationError, Value};

/// Runs every declared check on a coerced value.
///
/// Returns the first failure, or `None` if the value passes.
pub(crate) fn check(value: &Value, field: &FieldSpec, location: &Location) -> Option<ValidationError> {
    let failure = check_bounds(value, field)
        .or_else(|| check_length(value, field))
        .or_else(|| check_pattern(value, field))
        .or_else(|| check_allowed(value, field))
        .or_else(|| check_custom(value, field));

    failure.map(|(kind, message)| {
        ValidationError::new(location.clone(), kind, message).with_input(value.to_json())
    })
}

type Failure = (ErrorKind, String);

fn check_bounds(value: &Value, field: &FieldSpec) -> Option<Failure> {
    let n = value.as_f64()?;
    let c = field.constraints();
    let out_of_range = |message: String| Some((ErrorKind::OutOfRange, message));

    if let Some(bound) = c.gt {
        if n <= bound {
            return out_of_range(format!("input should be greater than {}", number(bound)));
        }
    }
    if let Some(bound) = c.ge {
        if n < bound {
            return out_of_range(format!(
                "input should be greater than or equal to {}",
                number(bound)
            ));
        }
    }
    if let Some(bound) = c.lt {
        if n >= bound {
            return out_of_range(format!("input should be less than {}", number(bound)));
        }
    }
    if let Some(bound) = c.le {
        if n > bound {
            return out_of_range(format!(
                "input should be less than or equal to {}",
                number(bound)
            ));
        }
    }
    None
}

fn check_length(value: &Value, field: &FieldSpec) -> Option<Failure> {
    let (len, what, unit) = match value {
        Value::Str(s) => (s.chars().count(), "string", "character"),
        Value::List(items) | Value::Set(items) => (items.len(), "list", "item"),
        Value::Map(entries) => (entries.len(), "dictionary", "item"),
        _ => return None,
    };
    let c = field.constraints();

    if let Some(min) = c.min_length {
        if len < min {
            return Some((
                ErrorKind::LengthViolation,
                format!("{what} should have at least {min} {}", plural(unit, min)),
            ));
        }
    }
    if let Some(max) = c.max_length {
        if len > max {
            return Some((
                ErrorKind::LengthViolation,
                format!("{what} should have at most {max} {}", plural(unit, max)),
            ));
        }
    }
    None
}

fn check_pattern(value: &Value, field: &FieldSpec) -> Option<Failure> {
    let pattern = field.constraints().pattern.as_ref()?;
    let Value::Str(text) = value else {
        return None;
    };
    if pattern.is_match(text) {
        None
    } else {
        Some((
            ErrorKind::PatternMismatch,
            format!("string should match pattern '{}'", pattern.as_str()),
        ))
    }
}

fn check_allowed(value: &Value, field: &FieldSpec) -> Option<Failure> {
    let allowed = field.constraints().one_of.as_ref()?;
    let key = value.enum_key()?;
    if allowed.iter().any(|a| *a == key) {
        None
    } else {
        Some((ErrorKind::EnumViolation, one_of_message(allowed)))
    }
}

fn check_custom(value: &Value, field: &FieldSpec) -> Option<Failure> {
    field.validators().iter().find_map(|validator| {
        validator
            .check(value)
            .err()
            .map(|message| (ErrorKind::CustomValidatorRejected, message))
    })
}

/// Renders `input should be 'a', 'b' or 'c'`.
pub(crate) fn one_of_message(allowed: &[String]) -> String {
    let quoted: Vec<String> = allowed.iter().map(|a| format!("'{a}'")).collect();
    match quoted.split_last() {
        None => "input should be one of no values".to_string(),
        Some((last, [])) => format!("input should be {last}"),
        Some((last, rest)) => format!("input should be {} or {last}", rest.join(", ")),
    }
}

fn number(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        format!("{bound}")
    }
}

fn plural(unit: &str, n: usize) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}
