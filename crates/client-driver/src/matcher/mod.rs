//! Request matching: decides whether a live request satisfies an expected one.
//!
//! Matching is the conjunction of independent clauses (method, path,
//! parameters, body, headers, excluded headers). `is_match` stops at the
//! first failing clause; `diagnose` evaluates all of them and explains each
//! failure, which is what the server uses to describe near misses.
//!
//! # Module Structure
//!
//! - `params` - exact key set plus order-independent value pairing
//! - `report` - `Clause`, `Mismatch`, `MatchReport`

mod params;
mod report;


pub use report::{Clause, MatchReport, Mismatch};

use crate::expectation::{ExpectedRequest, Method};
use crate::live::LiveRequest;
use crate::pattern::Pattern;
use similar::TextDiff;
use tracing::debug;

/// Decides whether a live request satisfies an expectation.
///
/// Implementations must be pure: the registry calls them while holding its lock.
pub trait RequestMatcher: Send + Sync {
    fn is_match(&self, live: &dyn LiveRequest, expected: &ExpectedRequest) -> bool;

    fn diagnose(&self, live: &dyn LiveRequest, expected: &ExpectedRequest) -> MatchReport;
}

/// The standard clause set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestMatcher;

type ClauseCheck = fn(&dyn LiveRequest, &ExpectedRequest) -> Result<(), String>;

/// Cheap clauses first so `is_match` rarely reaches the body. Same order as [`Clause::ALL`].
const CLAUSES: [(Clause, ClauseCheck); 6] = [
    (Clause::Method, check_method),
    (Clause::Path, check_path),
    (Clause::Params, check_params),
    (Clause::Headers, check_headers),
    (Clause::ExcludedHeaders, check_excluded_headers),
    (Clause::Body, check_body),
];

impl RequestMatcher for DefaultRequestMatcher {
    fn is_match(&self, live: &dyn LiveRequest, expected: &ExpectedRequest) -> bool {
        CLAUSES
            .iter()
            .all(|(_, check)| check(live, expected).is_ok())
    }

    fn diagnose(&self, live: &dyn LiveRequest, expected: &ExpectedRequest) -> MatchReport {
        let mismatches = CLAUSES
            .iter()
            .filter_map(|(clause, check)| {
                check(live, expected).err().map(|reason| Mismatch {
                    clause: *clause,
                    reason,
                })
            })
            .collect();
        MatchReport { mismatches }
    }
}

fn check_method(live: &dyn LiveRequest, expected: &ExpectedRequest) -> Result<(), String> {
    match Method::parse(live.method()) {
        Some(method) if method == expected.method() => Ok(()),
        _ => Err(format!(
            "expected {}, got {}",
            expected.method(),
            live.method()
        )),
    }
}

fn check_path(live: &dyn LiveRequest, expected: &ExpectedRequest) -> Result<(), String> {
    if expected.path().accepts(live.path_info()) {
        Ok(())
    } else {
        Err(format!(
            "expected {}, got {:?}",
            expected.path(),
            live.path_info()
        ))
    }
}

fn check_params(live: &dyn LiveRequest, expected: &ExpectedRequest) -> Result<(), String> {
    params::check_params(expected.params(), live.params())
}

fn check_headers(live: &dyn LiveRequest, expected: &ExpectedRequest) -> Result<(), String> {
    for (name, pattern) in expected.headers() {
        let Some(values) = live.header_values(name) else {
            return Err(format!("header '{name}' was not sent"));
        };
        if !values.iter().any(|v| pattern.accepts(v)) {
            return Err(format!(
                "header '{name}' values {values:?} do not match {pattern}"
            ));
        }
    }
    Ok(())
}

fn check_excluded_headers(
    live: &dyn LiveRequest,
    expected: &ExpectedRequest,
) -> Result<(), String> {
    match expected
        .excluded_headers()
        .iter()
        .find(|name| live.header_values(name).is_some())
    {
        Some(name) => Err(format!("header '{name}' must not be sent")),
        None => Ok(()),
    }
}

fn check_body(live: &dyn LiveRequest, expected: &ExpectedRequest) -> Result<(), String> {
    let Some(spec) = expected.body() else {
        return Ok(());
    };

    let Some(content_type) = live.content_type() else {
        return Err(format!(
            "expected content type {}, none sent",
            spec.content_type
        ));
    };
    if !spec.content_type.accepts(content_type) {
        return Err(format!(
            "expected content type {}, got {content_type:?}",
            spec.content_type
        ));
    }

    let body = match live.body_text() {
        Ok(body) => body,
        Err(e) => {
            debug!("Body unavailable for matching: {}", e);
            return Err(e.to_string());
        }
    };
    if spec.content.accepts(body) {
        Ok(())
    } else {
        Err(describe_body_mismatch(&spec.content, body))
    }
}

fn describe_body_mismatch(expected: &Pattern, actual: &str) -> String {
    match expected.as_literal() {
        Some(literal) if literal.contains('\n') || actual.contains('\n') => {
            let diff = TextDiff::from_lines(literal, actual)
                .unified_diff()
                .context_radius(2)
                .header("expected", "actual")
                .to_string();
            format!("body differs:\n{diff}")
        }
        Some(literal) => format!("expected body {literal:?}, got {actual:?}"),
        None => format!("body {actual:?} does not match {expected}"),
    }
}
