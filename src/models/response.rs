// src/models/response.rs

//! Raw upstream responses and single-attempt results.

use crate::error::TransportError;

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// A response received from the upstream, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Total hits reported by a paginated upstream search.
    pub fn total_count(&self) -> Option<usize> {
        self.header(TOTAL_COUNT_HEADER)
            .and_then(|value| value.trim().parse().ok())
    }

    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.status)
    }
}

/// Result of invoking the transport once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Response(UpstreamResponse),
    Failed(TransportError),
}

impl Attempt {
    pub fn status(&self) -> Option<u16> {
        match self {
            Attempt::Response(response) => Some(response.status),
            Attempt::Failed(_) => None,
        }
    }
}

impl From<std::result::Result<UpstreamResponse, TransportError>> for Attempt {
    fn from(result: std::result::Result<UpstreamResponse, TransportError>) -> Self {
        match result {
            Ok(response) => Attempt::Response(response),
            Err(error) => Attempt::Failed(error),
        }
    }
}
