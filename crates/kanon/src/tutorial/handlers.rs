//! Handlers of the tutorial operations.
//!
//! Each handler receives the arguments the binder produced and returns the
//! JSON response body.

use kanon_bind::{BoundArguments, Value};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

/// The stand-in item store paged by `list_items`.
pub const FAKE_ITEMS: [&str; 3] = ["Foo", "Bar", "Baz"];

const LONG_DESCRIPTION: &str = "This is an amazing item that has a long description";

/// Result of a handler.
pub type HandlerResult = Result<JsonValue, serde_json::Error>;

pub(super) fn root(_: &BoundArguments) -> HandlerResult {
    Ok(json!({ "message": "Hello World" }))
}

pub(super) fn read_item(args: &BoundArguments) -> HandlerResult {
    Ok(json!({ "item_id": args.get_i64("item_id") }))
}

pub(super) fn read_user_me(_: &BoundArguments) -> HandlerResult {
    Ok(json!({ "used_id": "the current user" }))
}

pub(super) fn read_user(args: &BoundArguments) -> HandlerResult {
    Ok(json!({ "user_id": args.get_str("user_id") }))
}

pub(super) fn get_model(args: &BoundArguments) -> HandlerResult {
    let model_name = args.get_str("model_name").unwrap_or_default();
    let message = match model_name {
        "alexnet" => "Deep Learning FTW!",
        "lenet" => "LeCNN all the images",
        _ => "Have some residuals",
    };
    Ok(json!({ "model_name": model_name, "message": message }))
}

pub(super) fn read_file(args: &BoundArguments) -> HandlerResult {
    Ok(json!({ "file_path": args.get_str("file_path") }))
}

pub(super) fn list_items(args: &BoundArguments) -> HandlerResult {
    let skip = args.get_i64("skip").unwrap_or(0);
    let limit = args.get_i64("limit").unwrap_or(10);
    let (start, end) = slice_bounds(FAKE_ITEMS.len(), skip, skip.saturating_add(limit));

    let items: Vec<JsonValue> = FAKE_ITEMS
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|name| json!({ "item_name": name }))
        .collect();
    Ok(JsonValue::Array(items))
}

/// Resolves `[start:stop]` against a sequence of `len` items.
///
/// Negative bounds count from the end; everything is clamped to the
/// sequence and an inverted range is empty.
fn slice_bounds(len: usize, start: i64, stop: i64) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolve = |index: i64| {
        let index = if index < 0 { index + len_i } else { index };
        usize::try_from(index.clamp(0, len_i)).unwrap_or(0)
    };
    let (start, stop) = (resolve(start), resolve(stop));
    (start, stop.max(start))
}

/// Adds `q` when non-empty and the long description unless `short`.
fn decorate(response: &mut Map<String, JsonValue>, args: &BoundArguments) {
    if let Some(q) = args.get_str("q").filter(|q| !q.is_empty()) {
        response.insert("q".to_string(), json!(q));
    }
    if !args.get_bool("short").unwrap_or(false) {
        response.insert("description".to_string(), json!(LONG_DESCRIPTION));
    }
}

pub(super) fn read_item_detail(args: &BoundArguments) -> HandlerResult {
    let mut response = Map::new();
    response.insert("item_id".to_string(), json!(args.get_str("item_id")));
    decorate(&mut response, args);
    Ok(JsonValue::Object(response))
}

pub(super) fn read_user_item(args: &BoundArguments) -> HandlerResult {
    let mut response = Map::new();
    response.insert("item_id".to_string(), json!(args.get_str("item_id")));
    response.insert("owner_id".to_string(), json!(args.get_i64("user_id")));
    response.insert("needy".to_string(), json!(args.get_str("needy")));
    decorate(&mut response, args);
    Ok(JsonValue::Object(response))
}

/// Typed view of the `Item` body model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Net price.
    pub price: f64,
    /// Optional tax added to the price.
    pub tax: Option<f64>,
}

#[derive(Deserialize)]
struct CreateItemArgs {
    item_id: i64,
    item: Item,
}

pub(super) fn create_item(args: &BoundArguments) -> HandlerResult {
    let CreateItemArgs { item_id, item } = args.deserialize()?;

    let mut response = match serde_json::to_value(&item)? {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    };
    if let Some(tax) = item.tax {
        response.insert("price_with_tax".to_string(), json!(item.price + tax));
    }
    response.insert("item_id".to_string(), json!(item_id));
    Ok(JsonValue::Object(response))
}

pub(super) fn read_items_filtered(args: &BoundArguments) -> HandlerResult {
    let q = args.get_str("q").map(str::to_lowercase);

    let items: Vec<JsonValue> = FAKE_ITEMS
        .iter()
        .filter(|name| {
            q.as_deref()
                .map_or(true, |q| name.to_lowercase().contains(q))
        })
        .map(|name| json!({ "item_name": name }))
        .collect();

    Ok(json!({
        "page": args.get_i64("page"),
        "tags": args.get("tags"),
        "q": args.get_str("q"),
        "items": items,
    }))
}

pub(super) fn read_headers(args: &BoundArguments) -> HandlerResult {
    Ok(json!({
        "User-Agent": args.get_str("user_agent"),
        "X-Token values": args.get("x_token"),
    }))
}

pub(super) fn read_cookies(args: &BoundArguments) -> HandlerResult {
    Ok(args.get("cookies").map_or(JsonValue::Null, Value::to_json))
}

pub(super) fn schedule_item(args: &BoundArguments) -> HandlerResult {
    let mut response = args.to_json();

    let start = args.get("start_datetime");
    let end = args.get("end_datetime");
    let after = args.get("process_after");
    if let (Some(Value::DateTime(start)), Some(Value::DateTime(end)), Some(Value::Duration(after))) =
        (start, end, after)
    {
        if let (Some(start_process), JsonValue::Object(map)) =
            (start.checked_add_signed(*after), &mut response)
        {
            let duration = end.signed_duration_since(start_process);
            map.insert(
                "start_process".to_string(),
                Value::DateTime(start_process).to_json(),
            );
            map.insert("duration".to_string(), Value::Duration(duration).to_json());
        }
    }
    Ok(response)
}

pub(super) fn tag_set(args: &BoundArguments) -> HandlerResult {
    Ok(json!({ "tags": args.get("tags") }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_bounds_in_range() {
        assert_eq!(slice_bounds(3, 0, 10), (0, 3));
        assert_eq!(slice_bounds(3, 1, 2), (1, 2));
        assert_eq!(slice_bounds(3, 5, 15), (3, 3));
    }

    #[test]
    fn test_slice_bounds_negative() {
        assert_eq!(slice_bounds(3, -1, 9), (2, 3));
        assert_eq!(slice_bounds(3, -10, 1), (0, 1));
        assert_eq!(slice_bounds(3, 2, -2), (2, 2));
    }
}
