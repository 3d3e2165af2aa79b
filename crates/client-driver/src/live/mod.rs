//! Read-only view of an inbound request, as seen by the matcher.
//!
//! `LiveRequest` is the boundary to the HTTP host: the matcher never touches
//! hyper types directly. `CapturedRequest` is the implementation the server
//! builds for every request it receives.

mod captured;

#[cfg(test)]
mod tests;

pub use captured::{parse_params, CapturedRequest, RequestSummary};

use std::collections::BTreeMap;
use thiserror::Error;

/// Parameter name to every value received for it, in arrival order.
pub type ParamMap = BTreeMap<String, Vec<String>>;

/// Why the request body could not be presented as text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    #[error("Failed to read request body: {0}")]
    Read(String),
    #[error("Request body is not valid UTF-8")]
    NotUtf8,
}

pub trait LiveRequest {
    fn method(&self) -> &str;

    fn path_info(&self) -> &str;

    /// Query string and form parameters merged, every occurrence kept.
    fn params(&self) -> &ParamMap;

    /// All values sent for `name` (case-insensitive), or `None` when the header
    /// was not sent at all.
    fn header_values(&self, name: &str) -> Option<Vec<&str>>;

    fn content_type(&self) -> Option<&str>;

    fn body_text(&self) -> Result<&str, BodyError>;
}
