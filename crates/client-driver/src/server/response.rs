//! Response construction helpers.

use crate::expectation::ExpectedResponse;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Build an HTTP response with headers.
///
/// Falls back to a bare 500 in the unlikely case `Response::builder()` fails.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder.body(Full::new(body.into())).unwrap_or_else(|_| {
        // Only reachable with a header the expectation builders would have rejected
        let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

pub fn json_response<T: Serialize>(
    status: StatusCode,
    extra_headers: &[(&str, &str)],
    body: &T,
) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    let headers = std::iter::once(("Content-Type", "application/json"))
        .chain(extra_headers.iter().copied());
    build_response_with_headers(status, headers, json)
}

/// Render a matched expectation's canned response.
pub fn render_expected(expected: &ExpectedResponse) -> Response<Full<Bytes>> {
    // Status was validated by the builder
    let status =
        StatusCode::from_u16(expected.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = expected
        .content_type()
        .map(|ct| ("Content-Type", ct));
    let headers = expected
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .chain(content_type);
    let body = expected.body().cloned().unwrap_or_default();
    build_response_with_headers(status, headers, body)
}
