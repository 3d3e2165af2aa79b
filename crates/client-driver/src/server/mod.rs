//! Embedded stub server: one listener per `ClientDriver` session.
//!
//! # Module Structure
//!
//! - `driver` - `ClientDriver` session object, lifecycle and accept loop
//! - `handler` - per-request routing through the registry
//! - `response` - hyper response construction helpers

mod driver;
mod handler;
mod response;

#[cfg(test)]
mod tests;

pub use driver::ClientDriver;
pub use handler::UNEXPECTED_HEADER;

use std::fmt;

/// Lifecycle of a driver's listener.
///
/// `Stopped -> Starting -> Running -> Stopping -> Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ServerState::Starting,
            2 => ServerState::Running,
            3 => ServerState::Stopping,
            _ => ServerState::Stopped,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Stopped => "stopped",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}
