//! Builder for [`ExpectedResponse`].

use super::request::validate_header_name;
use super::types::ExpectedResponse;
use crate::error::DriverError;
use bytes::Bytes;
use hyper::header::HeaderValue;
use hyper::StatusCode;
use std::time::Duration;

#[derive(Debug)]
pub struct ExpectedResponseBuilder {
    status: u16,
    body: Option<Bytes>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    delay: Duration,
    error: Option<DriverError>,
}

impl ExpectedResponse {
    pub fn builder(status: u16) -> ExpectedResponseBuilder {
        ExpectedResponseBuilder {
            status,
            body: None,
            content_type: None,
            headers: Vec::new(),
            delay: Duration::ZERO,
            error: None,
        }
    }
}

impl ExpectedResponseBuilder {
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        if HeaderValue::from_str(&content_type).is_err() {
            self.fail(DriverError::InvalidContentType(content_type));
            return self;
        }
        self.content_type = Some(content_type);
        self
    }

    /// Add a response header. Calling it twice with the same name sends both values.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Err(e) = validate_header_name(&name) {
            self.fail(e);
            return self;
        }
        if HeaderValue::from_str(&value).is_err() {
            self.fail(DriverError::InvalidHeaderValue(name));
            return self;
        }
        self.headers.push((name, value));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build(self) -> Result<ExpectedResponse, DriverError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        StatusCode::from_u16(self.status).map_err(|_| DriverError::InvalidStatus(self.status))?;

        Ok(ExpectedResponse {
            status: self.status,
            body: self.body,
            content_type: self.content_type,
            headers: self.headers,
            delay: self.delay,
        })
    }

    fn fail(&mut self, error: DriverError) {
        self.error.get_or_insert(error);
    }
}
