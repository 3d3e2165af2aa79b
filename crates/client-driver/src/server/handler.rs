//! Request handling for the stub server.

use super::response::{json_response, render_expected};
use crate::live::{CapturedRequest, LiveRequest, RequestSummary};
use crate::registry::{Dispatch, ExpectationRegistry, NearMiss};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header set on every diagnostic response for an unmatched request.
pub const UNEXPECTED_HEADER: &str = "x-client-driver-unexpected";

/// Shared, immutable per-session state handed to every connection.
pub(crate) struct HandlerContext {
    pub registry: Arc<ExpectationRegistry>,
    pub unexpected_status: StatusCode,
    pub near_miss_limit: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnexpectedRequestBody<'a> {
    error: &'static str,
    request: &'a RequestSummary,
    near_misses: &'a [NearMiss],
}

/// Route one request: serve the first matching expectation or answer with a diagnostic.
pub(crate) async fn handle_request<B>(
    req: Request<B>,
    ctx: Arc<HandlerContext>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: fmt::Display,
{
    let captured = CapturedRequest::from_request(req).await;

    match ctx.registry.dispatch(&captured, ctx.near_miss_limit) {
        Dispatch::Matched(matched) => {
            let delay = matched.response.delay();
            if !delay.is_zero() {
                debug!("Delaying response for {} by {:?}", matched.id, delay);
                tokio::time::sleep(delay).await;
            }
            Ok(render_expected(&matched.response))
        }
        Dispatch::Unexpected(unexpected) => {
            warn!(
                "Unexpected request {} {}: no expectation matched ({} pending candidates)",
                captured.method(),
                captured.path_info(),
                unexpected.near_misses.len()
            );
            let body = UnexpectedRequestBody {
                error: "No expectation matched this request",
                request: &unexpected.request,
                near_misses: &unexpected.near_misses,
            };
            Ok(json_response(
                ctx.unexpected_status,
                &[(UNEXPECTED_HEADER, "true")],
                &body,
            ))
        }
    }
}
