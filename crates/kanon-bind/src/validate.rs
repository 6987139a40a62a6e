//! Coercion and validation of one field.
//!
//! [`coerce_and_validate`] turns a [`RawValue`] into a typed [`Value`] or
//! the complete list of problems with it. Composite types are walked here:
//! every list element and every object member is checked independently and
//! their errors are flattened with nested locations, so a single field can
//! report several failures at once.

use serde_json::{Map, Value as JsonValue};

use crate::coerce::{coerce_json, coerce_text};
use crate::constraint::{self, one_of_message};
use crate::extract::from_decoded;
use crate::{
    ErrorKind, ExtraPolicy, FieldSpec, Location, ModelSpec, ParamType, RawValue, ValidationError,
    Value,
};

/// Result of checking one field.
pub type FieldResult = Result<Value, Vec<ValidationError>>;

/// Coerces and validates `raw` against `field`, reporting at `location`.
///
/// - Absent values resolve to the declared default without validation, or
///   to a `Missing` error when the field is required.
/// - JSON `null` is accepted only by nullable fields.
/// - A coercion failure stops the checks for that value.
/// - Declared constraints run after coercion; the first failure is reported.
///
/// # Example
///
/// ```rust
/// use kanon_bind::{
///     coerce_and_validate, ErrorKind, FieldBuilder, FieldSpec, Location, ParamSource,
///     ParamType, RawValue, Value,
/// };
///
/// let field = FieldSpec::new("page", ParamType::Integer).ge(1.0);
/// let loc = Location::root(ParamSource::Query).key("page");
///
/// assert_eq!(coerce_and_validate(&RawValue::Text("3"), &field, &loc), Ok(Value::Int(3)));
///
/// let errors = coerce_and_validate(&RawValue::Text("0"), &field, &loc).unwrap_err();
/// assert_eq!(errors[0].kind(), ErrorKind::OutOfRange);
/// ```
pub fn coerce_and_validate(raw: &RawValue<'_>, field: &FieldSpec, location: &Location) -> FieldResult {
    match raw {
        RawValue::Absent => {
            return field
                .default_value()
                .ok_or_else(|| vec![ValidationError::missing(location.clone())]);
        }
        RawValue::Malformed(reason) => {
            return Err(vec![ValidationError::new(
                location.clone(),
                ErrorKind::TypeMismatch,
                format!("input should be valid JSON: {reason}"),
            )]);
        }
        RawValue::Undecodable => {
            return Err(vec![ValidationError::new(
                location.clone(),
                ErrorKind::TypeMismatch,
                "input should be valid UTF-8 text",
            )]);
        }
        RawValue::Json(JsonValue::Null) if field.is_nullable() => return Ok(Value::Null),
        _ => {}
    }

    let value = coerce(raw, field.ty(), location)?;
    match constraint::check(&value, field, location) {
        Some(error) => Err(vec![error]),
        None => Ok(value),
    }
}

fn coerce(raw: &RawValue<'_>, ty: &ParamType, location: &Location) -> FieldResult {
    match ty {
        ParamType::List(item) => coerce_sequence(raw, ty, item, location).map(Value::List),
        ParamType::Set(item) => coerce_sequence(raw, ty, item, location).map(|items| {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            Value::Set(unique)
        }),
        ParamType::Map(item) => match raw {
            RawValue::Json(JsonValue::Object(entries)) => {
                coerce_entries(entries, item, location).map(Value::Map)
            }
            other => Err(vec![mismatch(other, ty, location)]),
        },
        ParamType::Object(model) => match raw {
            RawValue::Json(JsonValue::Object(members)) => {
                validate_members(model, members, location).map(Value::Object)
            }
            RawValue::Pairs(pairs) => validate_pairs(model, pairs, location).map(Value::Object),
            other => Err(vec![mismatch(other, ty, location)]),
        },
        scalar => coerce_scalar(raw, scalar, location).map_err(|e| vec![e]),
    }
}

fn coerce_scalar(raw: &RawValue<'_>, ty: &ParamType, location: &Location) -> Result<Value, ValidationError> {
    let coerced = match raw {
        RawValue::Text(text) => coerce_text(text, ty),
        RawValue::Json(json) => coerce_json(json, ty),
        _ => None,
    };
    let value = coerced.ok_or_else(|| mismatch(raw, ty, location))?;

    if let Some(members) = ty.enum_members() {
        let member = value.as_str().unwrap_or_default();
        if !members.iter().any(|m| m == member) {
            return Err(ValidationError::new(
                location.clone(),
                ErrorKind::EnumViolation,
                one_of_message(members),
            )
            .with_input(raw_input(raw)));
        }
    }
    Ok(value)
}

fn coerce_sequence(
    raw: &RawValue<'_>,
    ty: &ParamType,
    item: &ParamType,
    location: &Location,
) -> Result<Vec<Value>, Vec<ValidationError>> {
    let elements: Vec<RawValue<'_>> = match raw {
        RawValue::Texts(texts) => texts.iter().copied().map(RawValue::Text).collect(),
        RawValue::Text(text) => vec![RawValue::Text(*text)],
        RawValue::Json(JsonValue::Array(items)) => items.iter().map(RawValue::Json).collect(),
        other => return Err(vec![mismatch(other, ty, location)]),
    };

    let mut values = Vec::with_capacity(elements.len());
    let mut errors = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        match coerce(element, item, &location.index(index)) {
            Ok(value) => values.push(value),
            Err(mut element_errors) => errors.append(&mut element_errors),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

type Members = indexmap::IndexMap<String, Value>;

/// Coerces every map entry; errors are reported under the entry's key.
fn coerce_entries(
    entries: &Map<String, JsonValue>,
    item: &ParamType,
    location: &Location,
) -> Result<Members, Vec<ValidationError>> {
    let mut values = Members::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (key, json) in entries {
        match coerce(&RawValue::Json(json), item, &location.key(key)) {
            Ok(value) => {
                values.insert(key.clone(), value);
            }
            Err(mut entry_errors) => errors.append(&mut entry_errors),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

fn validate_members(
    model: &ModelSpec,
    members: &Map<String, JsonValue>,
    location: &Location,
) -> Result<Members, Vec<ValidationError>> {
    let extras = members
        .iter()
        .filter(|(key, _)| !model.declares(key))
        .map(|(key, value)| (key.as_str(), value.clone()));

    validate_model(
        model,
        |wire| members.get(wire).map_or(RawValue::Absent, RawValue::Json),
        extras,
        location,
    )
}

fn validate_pairs(
    model: &ModelSpec,
    pairs: &[(String, Option<&str>)],
    location: &Location,
) -> Result<Members, Vec<ValidationError>> {
    let mut seen: Vec<&str> = Vec::new();
    for (key, _) in pairs {
        if !model.declares(key) && !seen.contains(&key.as_str()) {
            seen.push(key);
        }
    }
    let extras = seen.into_iter().map(|key| {
        let last = pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| *v)
            .map_or(JsonValue::Null, JsonValue::from);
        (key, last)
    });

    validate_model(
        model,
        |wire| {
            let values: Vec<Option<&str>> = pairs
                .iter()
                .filter(|(k, _)| k == wire)
                .map(|(_, v)| *v)
                .collect();
            let is_sequence = model
                .fields()
                .iter()
                .find(|f| f.wire_name() == wire)
                .is_some_and(|f| f.ty().is_sequence());
            from_decoded(values, is_sequence)
        },
        extras,
        location,
    )
}

/// Checks every declared field, then applies the extra-field policy.
fn validate_model<'r, F, E>(
    model: &ModelSpec,
    lookup: F,
    extras: E,
    location: &Location,
) -> Result<Members, Vec<ValidationError>>
where
    F: Fn(&str) -> RawValue<'r>,
    E: Iterator<Item = (&'r str, JsonValue)>,
{
    let mut values = Members::with_capacity(model.fields().len());
    let mut errors = Vec::new();

    for field in model.fields() {
        let raw = lookup(field.wire_name());
        match coerce_and_validate(&raw, field, &location.key(field.wire_name())) {
            Ok(value) => {
                values.insert(field.name().to_string(), value);
            }
            Err(mut field_errors) => errors.append(&mut field_errors),
        }
    }

    if model.extra_policy() == ExtraPolicy::Forbid {
        errors.extend(
            extras.map(|(key, input)| ValidationError::extra_forbidden(location.key(key)).with_input(input)),
        );
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

fn mismatch(raw: &RawValue<'_>, ty: &ParamType, location: &Location) -> ValidationError {
    let error = ValidationError::type_mismatch(location.clone(), ty.expected());
    match raw {
        RawValue::Absent | RawValue::Malformed(_) | RawValue::Undecodable => error,
        other => error.with_input(raw_input(other)),
    }
}

fn raw_input(raw: &RawValue<'_>) -> JsonValue {
    match raw {
        RawValue::Absent | RawValue::Malformed(_) | RawValue::Undecodable => JsonValue::Null,
        RawValue::Text(text) => JsonValue::from(*text),
        RawValue::Texts(texts) => JsonValue::from(texts.clone()),
        RawValue::Pairs(pairs) => pairs
            .iter()
            .map(|(k, v)| (k.clone(), v.map_or(JsonValue::Null, JsonValue::from)))
            .collect::<Map<_, _>>()
            .into(),
        RawValue::Json(json) => (*json).clone(),
    }
}
