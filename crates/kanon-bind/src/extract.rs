//! Value extraction.
//!
//! [`extract`] pulls the raw input for one [`ParameterSpec`] out of a
//! [`RawRequest`]. It never fails: a value that is not there is
//! [`RawValue::Absent`], and a body that is not JSON is
//! [`RawValue::Malformed`] so the engine can report it alongside every
//! other problem with the request. Header values are decoded as UTF-8;
//! one that is not valid UTF-8 is [`RawValue::Undecodable`].

use http::HeaderValue;
use serde_json::Value as JsonValue;

use crate::context::BodyPayload;
use crate::{ParamSource, ParamType, ParameterSpec, RawRequest};

/// Extraction settings shared by every parameter of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Look headers up with `_` replaced by `-` unless an alias is set.
    pub convert_header_underscores: bool,
    /// Treat a body sent without a JSON `Content-Type` as malformed.
    pub require_json_content_type: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            convert_header_underscores: true,
            require_json_content_type: false,
        }
    }
}

/// Raw input for one parameter, borrowed from the request.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue<'r> {
    /// Nothing was sent under the parameter's wire name.
    Absent,
    /// A single text value.
    Text(&'r str),
    /// Every text value sent under the wire name, in request order.
    Texts(Vec<&'r str>),
    /// Every pair at the source, for parameter models. Keys of declared
    /// fields are their wire names; other keys are as sent. `None` marks a
    /// header value that is not valid UTF-8.
    Pairs(Vec<(String, Option<&'r str>)>),
    /// A JSON value from the body.
    Json(&'r JsonValue),
    /// The body could not be read as JSON.
    Malformed(String),
    /// A header value was sent but is not valid UTF-8 text.
    Undecodable,
}

impl RawValue<'_> {
    /// Returns true for [`RawValue::Absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Returns the name a parameter is looked up under at its source.
#[must_use]
pub fn wire_name(param: &ParameterSpec, options: &ExtractOptions) -> String {
    let field = param.field();
    match (param.source(), field.alias()) {
        (ParamSource::Header, None) => header_name(field.name(), convert(param, options)),
        (ParamSource::Header, Some(alias)) => alias.to_ascii_lowercase(),
        _ => field.wire_name().to_string(),
    }
}

fn convert(param: &ParameterSpec, options: &ExtractOptions) -> bool {
    param
        .convert_underscores_override()
        .unwrap_or(options.convert_header_underscores)
}

fn header_name(name: &str, convert_underscores: bool) -> String {
    let name = name.to_ascii_lowercase();
    if convert_underscores {
        name.replace('_', "-")
    } else {
        name
    }
}

/// Extracts the raw value for `param`.
///
/// # Example
///
/// ```rust
/// use kanon_bind::{extract, ExtractOptions, ParamType, ParameterSpec, RawRequest, RawValue};
///
/// let request = RawRequest::builder().header("user-agent", "curl/8.0").build();
/// let param = ParameterSpec::header("user_agent", ParamType::String);
///
/// let raw = extract(&request, &param, &ExtractOptions::default());
/// assert_eq!(raw, RawValue::Text("curl/8.0"));
/// ```
pub fn extract<'r>(
    request: &'r RawRequest,
    param: &ParameterSpec,
    options: &ExtractOptions,
) -> RawValue<'r> {
    if param.source() == ParamSource::Body {
        return extract_body(request, param, options);
    }
    if param.is_model() {
        return extract_model(request, param, options);
    }

    let name = wire_name(param, options);
    let values: Vec<&'r str> = match param.source() {
        ParamSource::Path => request.path_params().get(&name).into_iter().collect(),
        ParamSource::Query => request
            .query_pairs()
            .iter()
            .filter(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
            .collect(),
        ParamSource::Header => {
            return from_decoded(header_values(request, &name), param.ty().is_sequence())
        }
        ParamSource::Cookie => request
            .cookies()
            .iter()
            .filter(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
            .collect(),
        ParamSource::Body => Vec::new(),
    };

    from_occurrences(values, param.ty())
}

fn from_occurrences<'r>(mut values: Vec<&'r str>, ty: &ParamType) -> RawValue<'r> {
    if values.is_empty() {
        RawValue::Absent
    } else if ty.is_sequence() {
        RawValue::Texts(values)
    } else {
        // A scalar given several times takes the last occurrence.
        values.pop().map_or(RawValue::Absent, RawValue::Text)
    }
}

/// Like `from_occurrences`, for values that may have failed to decode.
pub(crate) fn from_decoded(mut values: Vec<Option<&str>>, sequence: bool) -> RawValue<'_> {
    if sequence {
        if values.is_empty() {
            return RawValue::Absent;
        }
        // One undecodable occurrence spoils the whole list.
        values
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .map_or(RawValue::Undecodable, RawValue::Texts)
    } else {
        match values.pop() {
            None => RawValue::Absent,
            Some(Some(text)) => RawValue::Text(text),
            Some(None) => RawValue::Undecodable,
        }
    }
}

fn header_values<'r>(request: &'r RawRequest, name: &str) -> Vec<Option<&'r str>> {
    request.headers().get_all(name).iter().map(decode).collect()
}

fn decode(value: &HeaderValue) -> Option<&str> {
    std::str::from_utf8(value.as_bytes()).ok()
}

fn extract_model<'r>(
    request: &'r RawRequest,
    param: &ParameterSpec,
    options: &ExtractOptions,
) -> RawValue<'r> {
    let ParamType::Object(model) = param.ty() else {
        return RawValue::Absent;
    };

    let pairs: Vec<(String, Option<&'r str>)> = match param.source() {
        ParamSource::Query => request
            .query_pairs()
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.as_str())))
            .collect(),
        ParamSource::Cookie => request
            .cookies()
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.as_str())))
            .collect(),
        ParamSource::Header => {
            let convert_underscores = convert(param, options);
            request
                .headers()
                .iter()
                .map(|(name, value)| {
                    let key = model
                        .fields()
                        .iter()
                        .find(|f| {
                            let expected = f.alias().map_or_else(
                                || header_name(f.name(), convert_underscores),
                                str::to_ascii_lowercase,
                            );
                            expected == name.as_str()
                        })
                        .map_or_else(|| name.as_str().to_string(), |f| f.wire_name().to_string());
                    (key, decode(value))
                })
                .collect()
        }
        ParamSource::Path | ParamSource::Body => Vec::new(),
    };

    RawValue::Pairs(pairs)
}

fn extract_body<'r>(
    request: &'r RawRequest,
    param: &ParameterSpec,
    options: &ExtractOptions,
) -> RawValue<'r> {
    let document = match request.payload() {
        BodyPayload::Empty => return RawValue::Absent,
        BodyPayload::Malformed(reason) => return RawValue::Malformed(reason.clone()),
        BodyPayload::Json(document) => document,
    };

    if options.require_json_content_type && !request.has_json_content_type() {
        return RawValue::Malformed("expected a JSON content type".to_string());
    }

    if param.is_embedded() {
        document
            .get(param.field().wire_name())
            .map_or(RawValue::Absent, RawValue::Json)
    } else {
        RawValue::Json(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtraPolicy, FieldBuilder, FieldSpec, ModelSpec};
    use serde_json::json;

    fn opts() -> ExtractOptions {
        ExtractOptions::default()
    }

    #[test]
    fn test_path_lookup() {
        let request = RawRequest::builder().path_param("item_id", "5").build();

        let found = extract(&request, &ParameterSpec::path("item_id", ParamType::Integer), &opts());
        assert_eq!(found, RawValue::Text("5"));

        let missing = extract(&request, &ParameterSpec::path("user_id", ParamType::Integer), &opts());
        assert!(missing.is_absent());
    }

    #[test]
    fn test_alias_is_resolved_before_lookup() {
        let request = RawRequest::builder().query("item-query=foo&item_query=bar").build();
        let param = ParameterSpec::query("item_query", ParamType::String).alias("item-query");

        assert_eq!(extract(&request, &param, &opts()), RawValue::Text("foo"));
    }

    #[test]
    fn test_query_scalar_takes_last_occurrence() {
        let request = RawRequest::builder().query("q=a&q=b").build();
        let param = ParameterSpec::query("q", ParamType::String);

        assert_eq!(extract(&request, &param, &opts()), RawValue::Text("b"));
    }

    #[test]
    fn test_query_list_collects_in_order() {
        let request = RawRequest::builder().query("tags=b&x=1&tags=a").build();
        let param = ParameterSpec::query("tags", ParamType::list(ParamType::String));

        assert_eq!(extract(&request, &param, &opts()), RawValue::Texts(vec!["b", "a"]));
    }

    #[test]
    fn test_header_underscore_conversion() {
        let request = RawRequest::builder()
            .header("x-token", "one")
            .header("x-token", "two")
            .header("strange_header", "raw")
            .build();

        let list = ParameterSpec::header("x_token", ParamType::list(ParamType::String));
        assert_eq!(extract(&request, &list, &opts()), RawValue::Texts(vec!["one", "two"]));

        let converted = ParameterSpec::header("strange_header", ParamType::String);
        assert!(extract(&request, &converted, &opts()).is_absent());

        let verbatim = converted.convert_underscores(false);
        assert_eq!(extract(&request, &verbatim, &opts()), RawValue::Text("raw"));

        let global_off = ExtractOptions {
            convert_header_underscores: false,
            ..opts()
        };
        let plain = ParameterSpec::header("strange_header", ParamType::String);
        assert_eq!(extract(&request, &plain, &global_off), RawValue::Text("raw"));
    }

    #[test]
    fn test_cookie_lookup() {
        let request = RawRequest::builder().cookie("ads_id", "abc").build();
        let param = ParameterSpec::cookie("ads_id", ParamType::String);

        assert_eq!(extract(&request, &param, &opts()), RawValue::Text("abc"));
    }

    #[test]
    fn test_cookie_model_receives_every_pair() {
        let request = RawRequest::builder()
            .cookie("session_id", "s1")
            .cookie("santa_tracker", "x")
            .build();
        let model = ModelSpec::new("Cookies")
            .field(FieldSpec::new("session_id", ParamType::String))
            .extra(ExtraPolicy::Forbid);
        let param = ParameterSpec::cookie("cookies", ParamType::object(model));

        assert_eq!(
            extract(&request, &param, &opts()),
            RawValue::Pairs(vec![
                ("session_id".to_string(), Some("s1")),
                ("santa_tracker".to_string(), Some("x")),
            ])
        );
    }

    #[test]
    fn test_header_model_maps_declared_names() {
        let request = RawRequest::builder()
            .header("x-tag", "a")
            .header("host", "example.com")
            .build();
        let model = ModelSpec::new("CommonHeaders")
            .field(FieldSpec::new("x_tag", ParamType::list(ParamType::String)));
        let param = ParameterSpec::header("headers", ParamType::object(model));

        let RawValue::Pairs(pairs) = extract(&request, &param, &opts()) else {
            panic!("expected pairs");
        };
        assert!(pairs.contains(&("x_tag".to_string(), Some("a"))));
        assert!(pairs.contains(&("host".to_string(), Some("example.com"))));
    }

    #[test]
    fn test_header_values_decode_as_utf8() {
        let request = RawRequest::builder().header("x-name", "José").build();
        let param = ParameterSpec::header("x_name", ParamType::String);

        assert_eq!(extract(&request, &param, &opts()), RawValue::Text("José"));
    }

    #[test]
    fn test_invalid_utf8_header_is_undecodable() {
        let mut headers = http::HeaderMap::new();
        headers.append("x-tag", HeaderValue::from_static("ok"));
        headers.append("x-tag", HeaderValue::from_bytes(b"\xff").unwrap());
        let request = RawRequest::builder().headers(headers).build();

        let scalar = ParameterSpec::header("x_tag", ParamType::String);
        assert_eq!(extract(&request, &scalar, &opts()), RawValue::Undecodable);

        let list = ParameterSpec::header("x_tag", ParamType::list(ParamType::String));
        assert_eq!(extract(&request, &list, &opts()), RawValue::Undecodable);

        let model = ModelSpec::new("Tags").field(FieldSpec::new("x_tag", ParamType::String));
        let grouped = ParameterSpec::header("tags", ParamType::object(model));
        let RawValue::Pairs(pairs) = extract(&request, &grouped, &opts()) else {
            panic!("expected pairs");
        };
        assert_eq!(
            pairs,
            vec![("x_tag".to_string(), Some("ok")), ("x_tag".to_string(), None)]
        );
    }

    #[test]
    fn test_body_whole_document_and_embedded() {
        let document = json!({"item": {"name": "Foo"}, "importance": 5});
        let request = RawRequest::builder().json(&document).build();

        let whole = ParameterSpec::body("item", ParamType::String);
        assert_eq!(extract(&request, &whole, &opts()), RawValue::Json(&document));

        let embedded = ParameterSpec::body("importance", ParamType::Integer).embed();
        assert_eq!(extract(&request, &embedded, &opts()), RawValue::Json(&json!(5)));

        let absent = ParameterSpec::body("user", ParamType::String).embed();
        assert!(extract(&request, &absent, &opts()).is_absent());
    }

    #[test]
    fn test_body_empty_and_malformed() {
        let param = ParameterSpec::body("item", ParamType::String);

        let empty = RawRequest::builder().build();
        assert!(extract(&empty, &param, &opts()).is_absent());

        let broken = RawRequest::builder().body("{").build();
        assert!(matches!(extract(&broken, &param, &opts()), RawValue::Malformed(_)));
    }

    #[test]
    fn test_body_content_type_requirement() {
        let request = RawRequest::builder()
            .header("content-type", "text/plain")
            .body("{\"name\": \"Foo\"}")
            .build();
        let param = ParameterSpec::body("item", ParamType::String);
        let strict = ExtractOptions {
            require_json_content_type: true,
            ..opts()
        };

        assert!(matches!(extract(&request, &param, &strict), RawValue::Malformed(_)));
        assert!(matches!(extract(&request, &param, &opts()), RawValue::Json(_)));
    }

    #[test]
    fn test_wire_name_for_headers() {
        let options = opts();
        assert_eq!(
            wire_name(&ParameterSpec::header("User_Agent", ParamType::String), &options),
            "user-agent"
        );
        assert_eq!(
            wire_name(
                &ParameterSpec::header("token", ParamType::String).alias("X-Auth_Token"),
                &options
            ),
            "x-auth_token"
        );
        assert_eq!(
            wire_name(&ParameterSpec::query("q", ParamType::String), &options),
            "q"
        );
    }
}
