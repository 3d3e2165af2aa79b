//! Type definitions for expected requests and canned responses.

use crate::pattern::Pattern;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

// ============================================================================
// Method
// ============================================================================

/// HTTP method an expectation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }

    /// Parse a request-line method. HTTP methods are case-sensitive, so
    /// `get` is not `GET`.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            "TRACE" => Some(Method::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request specification
// ============================================================================

/// Parameter name to every value the request must carry for it.
/// Order of the values is kept for display but is not significant for matching.
pub type ParamSpec = BTreeMap<String, Vec<Pattern>>;

/// Header name to the pattern at least one of its values must satisfy.
pub type HeaderSpec = BTreeMap<String, Pattern>;

/// Body constraint: both content and content type must be accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodySpec {
    pub content: Pattern,
    pub content_type: Pattern,
}

/// Immutable description of a request the client is expected to send.
///
/// Built with [`ExpectedRequest::builder`](super::ExpectedRequestBuilder).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedRequest {
    pub(super) method: Method,
    pub(super) path: Pattern,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(super) params: ParamSpec,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(super) headers: HeaderSpec,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub(super) excluded_headers: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) body: Option<BodySpec>,
}

impl ExpectedRequest {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &Pattern {
        &self.path
    }

    pub fn params(&self) -> &ParamSpec {
        &self.params
    }

    pub fn headers(&self) -> &HeaderSpec {
        &self.headers
    }

    pub fn excluded_headers(&self) -> &BTreeSet<String> {
        &self.excluded_headers
    }

    pub fn body(&self) -> Option<&BodySpec> {
        self.body.as_ref()
    }
}

impl fmt::Display for ExpectedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .flat_map(|(name, values)| values.iter().map(move |v| format!("{name}={v}")))
                .collect();
            write!(f, " params[{}]", params.join(", "))?;
        }
        if !self.headers.is_empty() {
            let headers: Vec<String> = self
                .headers
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            write!(f, " headers[{}]", headers.join(", "))?;
        }
        if !self.excluded_headers.is_empty() {
            let excluded: Vec<&str> = self.excluded_headers.iter().map(String::as_str).collect();
            write!(f, " without[{}]", excluded.join(", "))?;
        }
        if let Some(ref body) = self.body {
            write!(f, " body[{} as {}]", body.content, body.content_type)?;
        }
        Ok(())
    }
}

// ============================================================================
// Response specification
// ============================================================================

/// Canned response written back when an expectation is matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedResponse {
    pub(super) status: u16,
    pub(super) body: Option<Bytes>,
    pub(super) content_type: Option<String>,
    pub(super) headers: Vec<(String, String)>,
    pub(super) delay: Duration,
}

impl ExpectedResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Extra headers in insertion order; a name may repeat.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Simulated latency applied before the response is written.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

// ============================================================================
// Repeat policy
// ============================================================================

/// How many live requests an expectation absorbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "count")]
pub enum Times {
    /// Single use: consumed by the first matching request
    #[default]
    Once,
    /// Consumed by exactly `n` matching requests, then falls through
    Exactly(u32),
    /// Reusable stub: never exhausted and satisfied even if never hit
    AnyTimes,
}

impl Times {
    /// Whether an expectation matched `count` times may absorb another request.
    pub fn allows(&self, count: u32) -> bool {
        match self {
            Times::Once => count < 1,
            Times::Exactly(n) => count < *n,
            Times::AnyTimes => true,
        }
    }

    /// Whether `count` matches fulfil this policy at verification time.
    pub fn is_satisfied_by(&self, count: u32) -> bool {
        match self {
            Times::Once => count == 1,
            Times::Exactly(n) => count == *n,
            Times::AnyTimes => true,
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Once => f.write_str("once"),
            Times::Exactly(n) => write!(f, "exactly {n} times"),
            Times::AnyTimes => f.write_str("any number of times"),
        }
    }
}
