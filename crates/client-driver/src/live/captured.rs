//! `CapturedRequest`: an owned snapshot of one inbound HTTP request.

use super::{BodyError, LiveRequest, ParamMap};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Request, Uri};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Owned snapshot of a request: the body is collected once, up front, and
/// every expectation is matched against the same bytes.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    method: String,
    path: String,
    query: Option<String>,
    params: ParamMap,
    headers: HeaderMap,
    body: Result<Bytes, BodyError>,
    received_at: DateTime<Utc>,
}

impl CapturedRequest {
    /// Start an empty request, mainly for exercising matchers directly.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: None,
            params: ParamMap::new(),
            headers: HeaderMap::new(),
            body: Ok(Bytes::new()),
            received_at: Utc::now(),
        }
    }

    /// Capture a hyper request, collecting its body.
    ///
    /// A body that fails to arrive is kept as [`BodyError::Read`]; matching
    /// then treats any body constraint as unmet instead of failing the handler.
    pub async fn from_request<B>(req: Request<B>) -> Self
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let (parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) => {
                warn!(
                    "Failed to read request body for {} {}: {}",
                    parts.method,
                    parts.uri.path(),
                    e
                );
                Err(BodyError::Read(e.to_string()))
            }
        };
        Self::from_parts(parts.method.as_str(), &parts.uri, parts.headers, body)
    }

    fn from_parts(
        method: &str,
        uri: &Uri,
        headers: HeaderMap,
        body: Result<Bytes, BodyError>,
    ) -> Self {
        let mut params = ParamMap::new();
        if let Some(query) = uri.query() {
            parse_params(query, &mut params);
        }

        let mut captured = Self {
            method: method.to_string(),
            path: decode_path(uri.path()),
            query: uri.query().map(str::to_string),
            params,
            headers,
            body,
            received_at: Utc::now(),
        };
        captured.merge_form_params();
        captured
    }

    /// Form posts contribute their fields to the parameter map, like a servlet container does.
    fn merge_form_params(&mut self) {
        let is_form = self
            .content_type()
            .map(|ct| ct.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE))
            .unwrap_or(false);
        if !is_form {
            return;
        }
        if let Ok(bytes) = &self.body {
            if let Ok(text) = std::str::from_utf8(bytes) {
                parse_params(text, &mut self.params);
            }
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        parse_params(query, &mut self.params);
        self.query = Some(query.to_string());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Set every value of a parameter at once; an empty iterator leaves the
    /// key present with no values.
    pub fn with_param_values<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.params
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Append a header value. Invalid names or values are skipped with a warning.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!("Skipping invalid header {}: {:?}", name, value),
        }
        self
    }

    pub fn with_content_type(self, content_type: &str) -> Self {
        self.with_header(CONTENT_TYPE.as_str(), content_type)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Ok(body.into());
        self
    }

    pub fn with_body_error(mut self, error: BodyError) -> Self {
        self.body = Err(error);
        self
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn summary(&self) -> RequestSummary {
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &self.headers {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let body = match &self.body {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(e) => Some(format!("<{e}>")),
        };

        RequestSummary {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            params: self.params.clone(),
            headers,
            body,
            received_at: self.received_at.to_rfc3339(),
        }
    }
}

impl LiveRequest for CapturedRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path_info(&self) -> &str {
        &self.path
    }

    fn params(&self) -> &ParamMap {
        &self.params
    }

    fn header_values(&self, name: &str) -> Option<Vec<&str>> {
        if !self.headers.contains_key(name) {
            return None;
        }
        // Present but non-text values leave an empty list, which no pattern accepts.
        Some(
            self.headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect(),
        )
    }

    fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    fn body_text(&self) -> Result<&str, BodyError> {
        match &self.body {
            Ok(bytes) => std::str::from_utf8(bytes).map_err(|_| BodyError::NotUtf8),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Serializable view of a captured request for diagnostics and verification reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: ParamMap,
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub received_at: String,
}

impl fmt::Display for RequestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(ref query) = self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Parse `a=1&b=2&a=3` style input (query strings and form bodies) into `into`,
/// URL-decoding keys and values and keeping every occurrence.
///
/// A bare `flag` with no `=` registers the key with no value, unlike `flag=`
/// which carries one empty value.
pub fn parse_params(raw: &str, into: &mut ParamMap) {
    for pair in raw.split('&').filter(|s| !s.is_empty()) {
        match pair.split_once('=') {
            Some((key, value)) => into
                .entry(decode_component(key))
                .or_default()
                .push(decode_component(value)),
            None => {
                into.entry(decode_component(pair)).or_default();
            }
        }
    }
}

/// Percent-decode a request path. `+` is literal in paths.
fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| spaced.clone())
}
