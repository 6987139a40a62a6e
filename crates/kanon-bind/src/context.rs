//! The raw request handed to the binder.
//!
//! [`RawRequest`] holds everything the host layer has already parsed and
//! buffered: path parameters, query pairs, headers, cookies and the body.
//! The binder only reads from it, so one request can be bound any number of
//! times (and from several threads) with identical results.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value as JsonValue;

use crate::PathParams;

/// Materialized request body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyPayload {
    /// No body bytes were sent.
    Empty,
    /// The body parsed as JSON.
    Json(JsonValue),
    /// The body could not be parsed as JSON; holds the parser message.
    Malformed(String),
}

impl BodyPayload {
    fn parse(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(e) => Self::Malformed(e.to_string()),
        }
    }
}

/// An already-parsed request, as seen by the binder.
///
/// # Example
///
/// ```rust
/// use kanon_bind::RawRequest;
///
/// let request = RawRequest::builder()
///     .path_param("item_id", "5")
///     .query("q=shoes&tags=a&tags=b")
///     .header("user-agent", "curl/8.0")
///     .cookie("session_id", "abc")
///     .build();
///
/// assert_eq!(request.path_params().get("item_id"), Some("5"));
/// assert_eq!(request.query_all("tags").collect::<Vec<_>>(), vec!["a", "b"]);
/// assert_eq!(request.header("User-Agent"), Some("curl/8.0"));
/// assert_eq!(request.cookie("session_id"), Some("abc"));
/// ```
#[derive(Debug, Clone)]
pub struct RawRequest {
    path_params: PathParams,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    cookies: Vec<(String, String)>,
    body: Bytes,
    payload: BodyPayload,
}

impl RawRequest {
    /// Creates a request from its parsed parts.
    ///
    /// The query string is decoded as `application/x-www-form-urlencoded`,
    /// cookies are read from every `Cookie` header and the body is parsed as
    /// JSON once, up front.
    #[must_use]
    pub fn new(
        path_params: PathParams,
        query_string: Option<&str>,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        let query = query_string.map(parse_query).unwrap_or_default();
        let cookies = parse_cookies(&headers);
        let payload = BodyPayload::parse(&body);
        Self {
            path_params,
            query,
            headers,
            cookies,
            body,
            payload,
        }
    }

    /// Creates a request from an `http::Request` whose body is already buffered.
    #[must_use]
    pub fn from_http(request: &http::Request<Bytes>, path_params: PathParams) -> Self {
        Self::new(
            path_params,
            request.uri().query(),
            request.headers().clone(),
            request.body().clone(),
        )
    }

    /// Returns a builder, mostly useful in tests and tooling.
    #[must_use]
    pub fn builder() -> RawRequestBuilder {
        RawRequestBuilder::new()
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Returns the decoded query pairs in request order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns every query value given for `name`, in request order.
    pub fn query_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
    }

    /// Returns the cookies in the order they were sent.
    #[must_use]
    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// Returns a cookie value by name; the last occurrence wins.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as parsed at construction time.
    #[must_use]
    pub fn payload(&self) -> &BodyPayload {
        &self.payload
    }

    /// Returns true if the `Content-Type` header names a JSON media type.
    #[must_use]
    pub fn has_json_content_type(&self) -> bool {
        self.header(CONTENT_TYPE.as_str()).is_some_and(|ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            essence == "application/json"
                || (essence.starts_with("application/") && essence.ends_with("+json"))
        })
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    // Percent-decoding is lossy, so a malformed query cannot fail here; an
    // error would leave the request with no query pairs at all.
    serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_default()
}

fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut cookies = Vec::new();
    for header in headers.get_all(COOKIE) {
        for pair in header.as_bytes().split(|b| *b == b';') {
            // Pairs are decoded one at a time so that one non-UTF-8 cookie
            // does not hide its neighbours.
            let Ok(pair) = std::str::from_utf8(pair) else {
                continue;
            };
            if let Some((name, value)) = pair.trim().split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim().trim_matches('"');
                cookies.push((name.to_string(), value.to_string()));
            }
        }
    }
    cookies
}

/// Builder for [`RawRequest`].
#[derive(Debug, Default)]
pub struct RawRequestBuilder {
    path_params: PathParams,
    query: Option<String>,
    headers: HeaderMap,
    cookies: Vec<(String, String)>,
    body: Bytes,
}

impl RawRequestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a captured path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Replaces all path parameters.
    #[must_use]
    pub fn path_params(mut self, params: PathParams) -> Self {
        self.path_params = params;
        self
    }

    /// Sets the raw query string (without the leading `?`).
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Appends a header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a cookie; all cookies are sent in one `Cookie` header.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Sets the raw body bytes.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and the matching `Content-Type` header.
    #[must_use]
    pub fn json(mut self, body: &JsonValue) -> Self {
        self.body = Bytes::from(body.to_string());
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(mut self) -> RawRequest {
        if !self.cookies.is_empty() {
            let line = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            if let Ok(value) = HeaderValue::from_str(&line) {
                self.headers.append(COOKIE, value);
            }
        }
        RawRequest::new(
            self.path_params,
            self.query.as_deref(),
            self.headers,
            self.body,
        )
    }
}
