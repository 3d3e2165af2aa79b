//! Type definitions for the expectation registry and verification reports.

use crate::expectation::{ExpectedRequest, ExpectedResponse, Times};
use crate::live::RequestSummary;
use crate::matcher::Mismatch;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Registration-order identifier of an expectation within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExpectationId(pub(super) u64);

impl fmt::Display for ExpectationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered (expected request, canned response) pair and its consumption state.
#[derive(Debug, Clone)]
pub struct Expectation {
    pub id: ExpectationId,
    pub request: Arc<ExpectedRequest>,
    pub response: Arc<ExpectedResponse>,
    pub times: Times,
    pub match_count: u32,
}

impl Expectation {
    /// Whether another matching request may still consume this expectation.
    pub fn is_consumable(&self) -> bool {
        self.times.allows(self.match_count)
    }

    pub fn is_satisfied(&self) -> bool {
        self.times.is_satisfied_by(self.match_count)
    }

    pub fn summary(&self) -> ExpectationSummary {
        ExpectationSummary {
            id: self.id,
            request: self.request.to_string(),
            times: self.times,
            match_count: self.match_count,
        }
    }
}

/// Result of a successful `find_and_consume`.
#[derive(Debug, Clone)]
pub struct MatchedExpectation {
    pub id: ExpectationId,
    pub response: Arc<ExpectedResponse>,
    /// Match count including this request
    pub match_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectationSummary {
    pub id: ExpectationId,
    pub request: String,
    pub times: Times,
    pub match_count: u32,
}

impl fmt::Display for ExpectationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (expected {}, matched {})",
            self.id, self.request, self.times, self.match_count
        )
    }
}

/// A pending expectation ranked by how close it came to matching a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearMiss {
    pub id: ExpectationId,
    pub request: String,
    pub satisfied_clauses: usize,
    pub mismatches: Vec<Mismatch>,
}

/// A request that no expectation absorbed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnexpectedRequest {
    pub request: RequestSummary,
    pub near_misses: Vec<NearMiss>,
}

impl fmt::Display for UnexpectedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.request)?;
        if self.near_misses.is_empty() {
            return write!(f, " (no pending expectations)");
        }
        for miss in &self.near_misses {
            write!(f, "\n      closest {} {}", miss.id, miss.request)?;
            for mismatch in &miss.mismatches {
                write!(f, "\n        - {mismatch}")?;
            }
        }
        Ok(())
    }
}

/// Outcome of routing one request through the registry.
#[derive(Debug, Clone)]
pub enum Dispatch {
    Matched(MatchedExpectation),
    Unexpected(UnexpectedRequest),
}

/// Everything that went wrong in a session: expectations never satisfied and
/// requests nobody expected.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub unsatisfied: Vec<ExpectationSummary>,
    pub unexpected: Vec<UnexpectedRequest>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.unsatisfied.is_empty() && self.unexpected.is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "All expectations were satisfied");
        }
        write!(f, "Client driver verification failed")?;
        if !self.unsatisfied.is_empty() {
            write!(f, "\n  {} unmet expectation(s):", self.unsatisfied.len())?;
            for expectation in &self.unsatisfied {
                write!(f, "\n    {expectation}")?;
            }
        }
        if !self.unexpected.is_empty() {
            write!(f, "\n  {} unexpected request(s):", self.unexpected.len())?;
            for request in &self.unexpected {
                write!(f, "\n    {request}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for VerificationReport {}
