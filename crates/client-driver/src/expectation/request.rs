//! Builder for [`ExpectedRequest`].

use super::types::{BodySpec, ExpectedRequest, HeaderSpec, Method, ParamSpec};
use crate::error::DriverError;
use crate::pattern::Pattern;
use hyper::header::HeaderName;
use std::collections::BTreeSet;

/// Chainable builder; the first invalid input is kept and reported by [`build`](Self::build).
#[derive(Debug)]
pub struct ExpectedRequestBuilder {
    method: Method,
    path: Pattern,
    params: ParamSpec,
    headers: HeaderSpec,
    excluded_headers: BTreeSet<String>,
    body: Option<BodySpec>,
    error: Option<DriverError>,
}

impl ExpectedRequest {
    pub fn builder(method: Method, path: impl Into<Pattern>) -> ExpectedRequestBuilder {
        ExpectedRequestBuilder {
            method,
            path: path.into(),
            params: ParamSpec::new(),
            headers: HeaderSpec::new(),
            excluded_headers: BTreeSet::new(),
            body: None,
            error: None,
        }
    }
}

impl ExpectedRequestBuilder {
    /// Expect a parameter value. Repeat the call with the same name to expect
    /// the parameter several times, in any order.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Pattern>) -> Self {
        let name = name.into();
        if name.is_empty() {
            self.fail(DriverError::InvalidParamName(name));
            return self;
        }
        self.params.entry(name).or_default().push(value.into());
        self
    }

    /// Expect the parameter name to be present with no values at all.
    pub fn with_valueless_param(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            self.fail(DriverError::InvalidParamName(name));
            return self;
        }
        self.params.entry(name).or_default();
        self
    }

    pub fn with_params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Pattern>,
    {
        params
            .into_iter()
            .fold(self, |builder, (name, value)| builder.with_param(name, value))
    }

    /// Require a header with at least one value accepted by `value`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Pattern>) -> Self {
        let name = name.into();
        if let Err(e) = validate_header_name(&name) {
            self.fail(e);
            return self;
        }
        self.headers.insert(name, value.into());
        self
    }

    /// Require that a header is not sent at all.
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if let Err(e) = validate_header_name(&name) {
            self.fail(e);
            return self;
        }
        self.excluded_headers.insert(name);
        self
    }

    pub fn with_body(
        mut self,
        content: impl Into<Pattern>,
        content_type: impl Into<Pattern>,
    ) -> Self {
        self.body = Some(BodySpec {
            content: content.into(),
            content_type: content_type.into(),
        });
        self
    }

    pub fn build(self) -> Result<ExpectedRequest, DriverError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let required: BTreeSet<String> = self.headers.keys().map(|k| k.to_lowercase()).collect();
        if let Some(conflict) = self
            .excluded_headers
            .iter()
            .find(|name| required.contains(&name.to_lowercase()))
        {
            return Err(DriverError::ConflictingHeader(conflict.clone()));
        }

        Ok(ExpectedRequest {
            method: self.method,
            path: self.path,
            params: self.params,
            headers: self.headers,
            excluded_headers: self.excluded_headers,
            body: self.body,
        })
    }

    fn fail(&mut self, error: DriverError) {
        self.error.get_or_insert(error);
    }
}

pub(super) fn validate_header_name(name: &str) -> Result<(), DriverError> {
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|_| DriverError::InvalidHeaderName(name.to_string()))
}
