//! Error type shared by the builders, the registry and the server session.

use crate::registry::VerificationReport;
use crate::server::ServerState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid parameter name '{0}'")]
    InvalidParamName(String),
    #[error("Invalid header name '{0}'")]
    InvalidHeaderName(String),
    #[error("Invalid value for header '{0}'")]
    InvalidHeaderValue(String),
    #[error("Header '{0}' is both required and excluded")]
    ConflictingHeader(String),
    #[error("Invalid status code {0}")]
    InvalidStatus(u16),
    #[error("Invalid content type '{0}'")]
    InvalidContentType(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Driver is {actual}, expected {expected}")]
    InvalidState {
        expected: ServerState,
        actual: ServerState,
    },
    #[error(transparent)]
    Verification(#[from] VerificationReport),
}
