//! Expected requests, canned responses and repeat policy.
//!
//! ## Module Structure
//!
//! - `types`: value types (`Method`, `ExpectedRequest`, `ExpectedResponse`, `Times`)
//! - `request`: `ExpectedRequestBuilder`
//! - `response`: `ExpectedResponseBuilder`
//!
//! Builders collect input and validate it in `build()`, producing values the
//! registry and matcher only ever read.

mod request;
mod response;
mod types;


pub use request::ExpectedRequestBuilder;
pub use response::ExpectedResponseBuilder;
pub use types::{
    BodySpec, ExpectedRequest, ExpectedResponse, HeaderSpec, Method, ParamSpec, Times,
};
