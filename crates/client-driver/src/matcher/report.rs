//! Clause-by-clause outcome of matching one request against one expectation.

use serde::Serialize;
use std::fmt;

/// The independent checks an expectation is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Clause {
    Method,
    Path,
    Params,
    Headers,
    ExcludedHeaders,
    Body,
}

impl Clause {
    /// Evaluation order of the default matcher and order of reported mismatches.
    pub const ALL: [Clause; 6] = [
        Clause::Method,
        Clause::Path,
        Clause::Params,
        Clause::Headers,
        Clause::ExcludedHeaders,
        Clause::Body,
    ];
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Clause::Method => "method",
            Clause::Path => "path",
            Clause::Params => "params",
            Clause::Body => "body",
            Clause::Headers => "headers",
            Clause::ExcludedHeaders => "excluded headers",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub clause: Clause,
    pub reason: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.clause, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub mismatches: Vec<Mismatch>,
}

impl MatchReport {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Number of clauses that held; higher is a nearer miss.
    pub fn satisfied(&self) -> usize {
        Clause::ALL.len() - self.mismatches.len()
    }

    pub fn failed(&self, clause: Clause) -> bool {
        self.mismatches.iter().any(|m| m.clause == clause)
    }
}
