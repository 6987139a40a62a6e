//! End-to-end binding tests.
//!
//! Each test builds a descriptor table, feeds a raw request through
//! [`Binder::bind`] and checks the bound values or the reported errors.

use kanon_bind::{
    Binder, BindOptions, Endpoint, ErrorKind, ExtraPolicy, FieldBuilder, FieldSpec, ModelSpec,
    ParamType, ParameterSpec, RawRequest, ValidationErrors, Value,
};
use proptest::prelude::*;
use serde_json::json;

fn read_item() -> Endpoint {
    Endpoint::builder("read_item")
        .param(ParameterSpec::path("item_id", ParamType::Integer))
        .build()
        .unwrap()
}

fn get_model() -> Endpoint {
    Endpoint::builder("get_model")
        .param(ParameterSpec::path(
            "model_name",
            ParamType::enumeration(["alexnet", "resnet", "lenet"]),
        ))
        .build()
        .unwrap()
}

fn read_cookies() -> Endpoint {
    let cookies = ModelSpec::new("Cookies")
        .field(FieldSpec::new("session_id", ParamType::String))
        .field(FieldSpec::new("tracker", ParamType::String).optional())
        .extra(ExtraPolicy::Forbid);
    Endpoint::builder("read_cookies")
        .param(ParameterSpec::cookie("cookies", ParamType::object(cookies)))
        .build()
        .unwrap()
}

fn filtered() -> Endpoint {
    Endpoint::builder("read_items_filtered")
        .param(ParameterSpec::query("tags", ParamType::list(ParamType::String)).default(Value::List(vec![])))
        .param(
            ParameterSpec::query("q", ParamType::String)
                .optional()
                .min_length(3)
                .max_length(50)
                .pattern("^[a-z ]+$"),
        )
        .param(ParameterSpec::query("page", ParamType::Integer).default(1_i64).ge(1.0))
        .build()
        .unwrap()
}

fn kinds(errors: &ValidationErrors) -> Vec<(String, ErrorKind)> {
    errors
        .iter()
        .map(|e| (e.location().to_string(), e.kind()))
        .collect()
}

// ============================================================================
// Path parameters
// ============================================================================

#[test]
fn test_path_integer_bound() {
    let request = RawRequest::builder().path_param("item_id", "5").build();
    let args = Binder::default().bind(&request, &read_item()).unwrap();

    assert_eq!(args.get("item_id"), Some(&Value::Int(5)));
    assert_eq!(args.len(), 1);
}

#[test]
fn test_path_integer_rejected() {
    let request = RawRequest::builder().path_param("item_id", "abc").build();
    let errors = Binder::default().bind(&request, &read_item()).unwrap_err();

    assert_eq!(kinds(&errors), [("path.item_id".to_string(), ErrorKind::TypeMismatch)]);
    assert_eq!(errors.status_code(), http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn test_missing_path_parameter() {
    let request = RawRequest::builder().build();
    let errors = Binder::default().bind(&request, &read_item()).unwrap_err();

    assert_eq!(kinds(&errors), [("path.item_id".to_string(), ErrorKind::Missing)]);
}

#[test]
fn test_enum_path_parameter() {
    let binder = Binder::default();

    let ok = RawRequest::builder().path_param("model_name", "resnet").build();
    assert_eq!(binder.bind(&ok, &get_model()).unwrap().get_str("model_name"), Some("resnet"));

    let bad = RawRequest::builder().path_param("model_name", "vgg16").build();
    let errors = binder.bind(&bad, &get_model()).unwrap_err();
    assert_eq!(kinds(&errors), [("path.model_name".to_string(), ErrorKind::EnumViolation)]);
}

// ============================================================================
// Query parameters
// ============================================================================

#[test]
fn test_query_defaults_applied() {
    let request = RawRequest::builder().build();
    let args = Binder::default().bind(&request, &filtered()).unwrap();

    assert_eq!(args.to_json(), json!({"tags": [], "q": null, "page": 1}));
}

#[test]
fn test_independent_violations_all_reported() {
    let request = RawRequest::builder().query("q=ab&page=0").build();
    let errors = Binder::default().bind(&request, &filtered()).unwrap_err();

    assert_eq!(
        kinds(&errors),
        [
            ("query.q".to_string(), ErrorKind::LengthViolation),
            ("query.page".to_string(), ErrorKind::OutOfRange),
        ]
    );
}

#[test]
fn test_pattern_checked_after_length() {
    let request = RawRequest::builder().query("q=Hello").build();
    let errors = Binder::default().bind(&request, &filtered()).unwrap_err();

    assert_eq!(kinds(&errors), [("query.q".to_string(), ErrorKind::PatternMismatch)]);
}

#[test]
fn test_query_list_in_request_order() {
    let request = RawRequest::builder().query("tags=b&tags=a&tags=b").build();
    let args = Binder::default().bind(&request, &filtered()).unwrap();

    assert_eq!(args.get("tags").unwrap().to_json(), json!(["b", "a", "b"]));
}

#[test]
fn test_query_set_deduplicates() {
    let endpoint = Endpoint::builder("tag_set")
        .param(ParameterSpec::query("tags", ParamType::set(ParamType::String)))
        .build()
        .unwrap();
    let request = RawRequest::builder().query("tags=b&tags=a&tags=b").build();
    let args = Binder::default().bind(&request, &endpoint).unwrap();

    assert_eq!(args.get("tags").unwrap().to_json(), json!(["b", "a"]));
}

#[test]
fn test_alias_used_for_lookup_and_location() {
    let endpoint = Endpoint::builder("aliased")
        .param(ParameterSpec::query("item_query", ParamType::Integer).alias("item-query"))
        .build()
        .unwrap();
    let binder = Binder::default();

    let ok = RawRequest::builder().query("item-query=4").build();
    assert_eq!(binder.bind(&ok, &endpoint).unwrap().get_i64("item_query"), Some(4));

    let wrong_name = RawRequest::builder().query("item_query=4").build();
    let errors = binder.bind(&wrong_name, &endpoint).unwrap_err();
    assert_eq!(kinds(&errors), [("query.item-query".to_string(), ErrorKind::Missing)]);
}

// ============================================================================
// Headers and cookies
// ============================================================================

#[test]
fn test_headers_with_underscore_conversion() {
    let endpoint = Endpoint::builder("read_headers")
        .param(ParameterSpec::header("user_agent", ParamType::String).optional())
        .param(ParameterSpec::header("x_token", ParamType::list(ParamType::String)).optional())
        .build()
        .unwrap();
    let request = RawRequest::builder()
        .header("User-Agent", "kanon-test")
        .header("X-Token", "foo")
        .header("X-Token", "bar")
        .build();

    let args = Binder::default().bind(&request, &endpoint).unwrap();
    assert_eq!(
        args.to_json(),
        json!({"user_agent": "kanon-test", "x_token": ["foo", "bar"]})
    );

    let literal = Binder::new(BindOptions {
        convert_header_underscores: false,
        ..BindOptions::default()
    });
    let args = literal.bind(&request, &endpoint).unwrap();
    assert_eq!(args.to_json(), json!({"user_agent": null, "x_token": null}));
}

#[test]
fn test_cookie_model_forbids_extras() {
    let request = RawRequest::builder()
        .cookie("session_id", "abc")
        .cookie("santa_tracker", "good-list")
        .build();
    let errors = Binder::default().bind(&request, &read_cookies()).unwrap_err();

    assert_eq!(
        kinds(&errors),
        [("cookie.santa_tracker".to_string(), ErrorKind::ExtraFieldForbidden)]
    );
}

#[test]
fn test_cookie_model_bound() {
    let request = RawRequest::builder()
        .cookie("session_id", "abc")
        .cookie("tracker", "t-1")
        .build();
    let args = Binder::default().bind(&request, &read_cookies()).unwrap();

    assert_eq!(
        args.get("cookies").unwrap().to_json(),
        json!({"session_id": "abc", "tracker": "t-1"})
    );
}

#[test]
fn test_cookie_model_missing_member() {
    let request = RawRequest::builder().build();
    let errors = Binder::default().bind(&request, &read_cookies()).unwrap_err();

    assert_eq!(kinds(&errors), [("cookie.session_id".to_string(), ErrorKind::Missing)]);
}

#[test]
fn test_cookie_model_with_non_ascii_neighbour() {
    let request = RawRequest::builder()
        .header("cookie", "session_id=abc; tracker=José")
        .build();
    let args = Binder::default().bind(&request, &read_cookies()).unwrap();

    assert_eq!(
        args.get("cookies").unwrap().to_json(),
        json!({"session_id": "abc", "tracker": "José"})
    );
}

fn read_name() -> Endpoint {
    Endpoint::builder("read_name")
        .param(ParameterSpec::header("x_name", ParamType::String))
        .build()
        .unwrap()
}

#[test]
fn test_non_ascii_header_bound() {
    let request = RawRequest::builder().header("x-name", "José").build();
    let args = Binder::default().bind(&request, &read_name()).unwrap();

    assert_eq!(args.to_json(), json!({"x_name": "José"}));
}

#[test]
fn test_invalid_utf8_header_reported() {
    let mut headers = http::HeaderMap::new();
    headers.insert("x-name", http::HeaderValue::from_bytes(b"Jos\xe9").unwrap());
    let request = RawRequest::builder().headers(headers).build();
    let errors = Binder::default().bind(&request, &read_name()).unwrap_err();

    assert_eq!(kinds(&errors), [("header.x-name".to_string(), ErrorKind::TypeMismatch)]);
}

// ============================================================================
// Body
// ============================================================================

fn create_item() -> Endpoint {
    let item = ModelSpec::new("Item")
        .field(FieldSpec::new("name", ParamType::String))
        .field(FieldSpec::new("description", ParamType::String).optional())
        .field(FieldSpec::new("price", ParamType::Float))
        .field(FieldSpec::new("tax", ParamType::Float).optional());
    Endpoint::builder("create_item")
        .param(ParameterSpec::path("item_id", ParamType::Integer))
        .param(ParameterSpec::body("item", ParamType::object(item)))
        .build()
        .unwrap()
}

#[test]
fn test_body_model_bound() {
    let request = RawRequest::builder()
        .path_param("item_id", "1")
        .json(&json!({"name": "Foo", "price": 50.5, "tax": 5}))
        .build();
    let args = Binder::default().bind(&request, &create_item()).unwrap();

    assert_eq!(
        args.get("item").unwrap().to_json(),
        json!({"name": "Foo", "description": null, "price": 50.5, "tax": 5.0})
    );
}

#[test]
fn test_body_errors_merge_with_path_errors() {
    let request = RawRequest::builder()
        .path_param("item_id", "x")
        .json(&json!({"name": "Foo", "price": "free"}))
        .build();
    let errors = Binder::default().bind(&request, &create_item()).unwrap_err();

    assert_eq!(
        kinds(&errors),
        [
            ("path.item_id".to_string(), ErrorKind::TypeMismatch),
            ("body.price".to_string(), ErrorKind::TypeMismatch),
        ]
    );
}

#[test]
fn test_missing_body() {
    let request = RawRequest::builder().path_param("item_id", "1").build();
    let errors = Binder::default().bind(&request, &create_item()).unwrap_err();

    assert_eq!(kinds(&errors), [("body".to_string(), ErrorKind::Missing)]);
}

#[test]
fn test_body_map_entries() {
    let endpoint = Endpoint::builder("create_index_weights")
        .param(ParameterSpec::body("weights", ParamType::map(ParamType::Float)))
        .build()
        .unwrap();

    let request = RawRequest::builder().json(&json!({"1": 0.5, "2": 3})).build();
    let args = Binder::default().bind(&request, &endpoint).unwrap();
    assert_eq!(args.to_json(), json!({"weights": {"1": 0.5, "2": 3.0}}));

    let request = RawRequest::builder().json(&json!({"1": 0.5, "2": "heavy"})).build();
    let errors = Binder::default().bind(&request, &endpoint).unwrap_err();
    assert_eq!(kinds(&errors), [("body.2".to_string(), ErrorKind::TypeMismatch)]);
}

#[test]
fn test_malformed_body() {
    let request = RawRequest::builder()
        .path_param("item_id", "1")
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .build();
    let errors = Binder::default().bind(&request, &create_item()).unwrap_err();

    assert_eq!(kinds(&errors), [("body".to_string(), ErrorKind::TypeMismatch)]);
}

#[test]
fn test_envelope_json() {
    let request = RawRequest::builder().path_param("item_id", "abc").build();
    let binder = Binder::default();
    let errors = binder.bind(&request, &read_item()).unwrap_err();

    assert_eq!(
        serde_json::to_value(binder.envelope(&errors)).unwrap(),
        json!({
            "detail": [{
                "loc": ["path", "item_id"],
                "type": "type_mismatch",
                "msg": "input should be a valid integer",
                "input": "abc"
            }]
        })
    );
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_integer_text_round_trips(n in any::<i64>()) {
        let request = RawRequest::builder().path_param("item_id", n.to_string()).build();
        let args = Binder::default().bind(&request, &read_item()).unwrap();
        prop_assert_eq!(args.get_i64("item_id"), Some(n));
    }

    #[test]
    fn prop_non_numeric_text_rejected(s in "[a-zA-Z_][a-zA-Z0-9_]{0,12}") {
        let request = RawRequest::builder().path_param("item_id", s).build();
        let errors = Binder::default().bind(&request, &read_item()).unwrap_err();
        prop_assert_eq!(errors.errors()[0].kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn prop_binding_is_idempotent(
        q in proptest::option::of("[a-z ]{0,60}"),
        page in proptest::option::of("-?[0-9]{1,3}|[a-z]{1,3}"),
        tags in proptest::collection::vec("[a-z]{1,4}", 0..4),
    ) {
        let mut query: Vec<(String, String)> = tags.into_iter().map(|t| ("tags".to_string(), t)).collect();
        if let Some(q) = q {
            query.push(("q".to_string(), q));
        }
        if let Some(page) = page {
            query.push(("page".to_string(), page));
        }
        let query = serde_urlencoded::to_string(&query).unwrap();
        let request = RawRequest::builder().query(query).build();
        let binder = Binder::default();
        let endpoint = filtered();

        let first = binder.bind(&request, &endpoint);
        let second = binder.bind(&request, &endpoint);
        prop_assert_eq!(first, second);
    }
}
