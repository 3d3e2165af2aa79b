//! Client driver: an embedded HTTP test double.
//!
//! A test registers expectations ("when a request like X arrives, respond
//! with Y") against a [`ClientDriver`], points the client under test at
//! [`ClientDriver::base_url`], and finally calls [`ClientDriver::verify`] to
//! assert that exactly the expected traffic occurred.
//!
//! ```no_run
//! use client_driver::{ClientDriver, DriverConfig, ExpectedRequest, ExpectedResponse, Method, Pattern};
//!
//! # async fn run() -> Result<(), client_driver::DriverError> {
//! let driver = ClientDriver::launch(DriverConfig::default()).await?;
//!
//! driver.add_expectation(
//!     ExpectedRequest::builder(Method::Get, "/orders")
//!         .with_param("status", "open")
//!         .with_header("Accept", Pattern::regex("application/.*json")?)
//!         .build()?,
//!     ExpectedResponse::builder(200)
//!         .with_body(r#"{"orders":[]}"#)
//!         .with_content_type("application/json")
//!         .build()?,
//! );
//!
//! // ... exercise the client against driver.base_url() ...
//!
//! driver.verify()?;
//! driver.shutdown().await;
//! # Ok(())
//! # }
//! ```

// ===== Matching core =====
pub mod expectation;
pub mod live;
pub mod matcher;
pub mod pattern;
pub mod registry;

// ===== Server session =====
pub mod config;
pub mod error;
pub mod logging;
pub mod server;

pub use config::DriverConfig;
pub use error::DriverError;
pub use expectation::{
    BodySpec, ExpectedRequest, ExpectedRequestBuilder, ExpectedResponse,
    ExpectedResponseBuilder, Method, Times,
};
pub use live::{BodyError, CapturedRequest, LiveRequest};
pub use matcher::{DefaultRequestMatcher, MatchReport, RequestMatcher};
pub use pattern::Pattern;
pub use registry::{ExpectationId, ExpectationRegistry, VerificationReport};
pub use server::{ClientDriver, ServerState};
