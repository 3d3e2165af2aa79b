//! Expectation registry: the ordered, thread-safe store of pending expectations.
//!
//! The test registers expectations while server tasks look them up. A single
//! mutex serializes scan-and-consume against registration and reset, so two
//! racing requests can never both claim a single-use expectation.

mod types;


pub use types::{
    Dispatch, Expectation, ExpectationId, ExpectationSummary, MatchedExpectation, NearMiss,
    UnexpectedRequest, VerificationReport,
};

use crate::expectation::{ExpectedRequest, ExpectedResponse, Times};
use crate::live::{CapturedRequest, LiveRequest, RequestSummary};
use crate::matcher::{DefaultRequestMatcher, RequestMatcher};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryState {
    expectations: Vec<Expectation>,
    unexpected: Vec<UnexpectedRequest>,
    next_id: u64,
}

impl RegistryState {
    /// Index of the first consumable expectation the request matches, in registration order.
    fn position(&self, matcher: &dyn RequestMatcher, live: &dyn LiveRequest) -> Option<usize> {
        self.expectations
            .iter()
            .position(|e| e.is_consumable() && matcher.is_match(live, &e.request))
    }

    fn consume(&mut self, index: usize) -> MatchedExpectation {
        let expectation = &mut self.expectations[index];
        expectation.match_count += 1;
        MatchedExpectation {
            id: expectation.id,
            response: Arc::clone(&expectation.response),
            match_count: expectation.match_count,
        }
    }

    fn record_unexpected(&mut self, unexpected: UnexpectedRequest) {
        debug!(
            "Recorded unexpected request {} ({} total)",
            unexpected.request,
            self.unexpected.len() + 1
        );
        self.unexpected.push(unexpected);
    }

    fn near_misses(
        &self,
        matcher: &dyn RequestMatcher,
        live: &dyn LiveRequest,
        limit: usize,
    ) -> Vec<NearMiss> {
        let mut misses: Vec<NearMiss> = self
            .expectations
            .iter()
            .filter(|e| e.is_consumable())
            .map(|e| {
                let report = matcher.diagnose(live, &e.request);
                NearMiss {
                    id: e.id,
                    request: e.request.to_string(),
                    satisfied_clauses: report.satisfied(),
                    mismatches: report.mismatches,
                }
            })
            .collect();
        // Stable sort keeps registration order among equally close candidates
        misses.sort_by(|a, b| b.satisfied_clauses.cmp(&a.satisfied_clauses));
        misses.truncate(limit);
        misses
    }
}

pub struct ExpectationRegistry {
    matcher: Arc<dyn RequestMatcher>,
    state: Mutex<RegistryState>,
}

impl ExpectationRegistry {
    pub fn new() -> Self {
        Self::with_matcher(Arc::new(DefaultRequestMatcher))
    }

    pub fn with_matcher(matcher: Arc<dyn RequestMatcher>) -> Self {
        Self {
            matcher,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Append a single-use expectation.
    pub fn register(&self, request: ExpectedRequest, response: ExpectedResponse) -> ExpectationId {
        self.register_with_times(request, response, Times::Once)
    }

    pub fn register_with_times(
        &self,
        request: ExpectedRequest,
        response: ExpectedResponse,
        times: Times,
    ) -> ExpectationId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = ExpectationId(state.next_id);
        debug!("Registered expectation {} {} ({})", id, request, times);
        state.expectations.push(Expectation {
            id,
            request: Arc::new(request),
            response: Arc::new(response),
            times,
            match_count: 0,
        });
        id
    }

    /// Atomically find the first consumable expectation matching `live` and consume it.
    ///
    /// Returns `None` without side effects when nothing matches.
    pub fn find_and_consume(&self, live: &dyn LiveRequest) -> Option<MatchedExpectation> {
        let mut state = self.state.lock();
        let index = state.position(self.matcher.as_ref(), live)?;
        Some(state.consume(index))
    }

    /// Route a captured request: consume a match, or record it as unexpected
    /// together with its `near_miss_limit` closest pending expectations.
    pub fn dispatch(&self, live: &CapturedRequest, near_miss_limit: usize) -> Dispatch {
        let mut state = self.state.lock();
        if let Some(index) = state.position(self.matcher.as_ref(), live) {
            let matched = state.consume(index);
            debug!(
                "Request {} {} matched expectation {}",
                live.method(),
                live.path_info(),
                matched.id
            );
            return Dispatch::Matched(matched);
        }

        let unexpected = UnexpectedRequest {
            request: live.summary(),
            near_misses: state.near_misses(self.matcher.as_ref(), live, near_miss_limit),
        };
        state.record_unexpected(unexpected.clone());
        Dispatch::Unexpected(unexpected)
    }

    /// Pending expectations ranked by how many clauses `live` satisfies.
    pub fn near_misses(&self, live: &dyn LiveRequest, limit: usize) -> Vec<NearMiss> {
        self.state
            .lock()
            .near_misses(self.matcher.as_ref(), live, limit)
    }

    /// Record a request no expectation absorbed, as `dispatch` does on a miss.
    pub fn record_unexpected(&self, request: RequestSummary, near_misses: Vec<NearMiss>) {
        self.state.lock().record_unexpected(UnexpectedRequest {
            request,
            near_misses,
        });
    }

    /// Expectations not yet satisfied; empty means every expectation was met.
    pub fn verify(&self) -> Vec<ExpectationSummary> {
        self.state
            .lock()
            .expectations
            .iter()
            .filter(|e| !e.is_satisfied())
            .map(Expectation::summary)
            .collect()
    }

    pub fn unexpected_requests(&self) -> Vec<UnexpectedRequest> {
        self.state.lock().unexpected.clone()
    }

    /// Unmet expectations and unexpected requests, taken under one lock.
    pub fn report(&self) -> VerificationReport {
        let state = self.state.lock();
        VerificationReport {
            unsatisfied: state
                .expectations
                .iter()
                .filter(|e| !e.is_satisfied())
                .map(Expectation::summary)
                .collect(),
            unexpected: state.unexpected.clone(),
        }
    }

    pub fn match_count(&self, id: ExpectationId) -> Option<u32> {
        self.state
            .lock()
            .expectations
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.match_count)
    }

    /// Drop every expectation and recorded unexpected request.
    ///
    /// Identifiers keep increasing across resets so stale ids never alias new ones.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        info!(
            "Resetting registry ({} expectations, {} unexpected requests)",
            state.expectations.len(),
            state.unexpected.len()
        );
        state.expectations.clear();
        state.unexpected.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExpectationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
