// src/models/outcome.rs

//! Classified result of an upstream call.

use serde::Serialize;

use crate::error::UpstreamError;

/// Why a call ended as an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The last attempt answered with a 5xx status
    ServerError,
    /// The last attempt timed out
    Timeout,
    /// The last attempt failed below HTTP (connection, I/O, interruption)
    Transport,
    /// A success status with a body that could not be decoded
    MalformedResponse,
}

/// Tagged outcome of a call once retries are exhausted or a response settled it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success(T),
    NotFound {
        uri: String,
    },
    /// The upstream rejected a payload we sent
    UpstreamBadRequest {
        body: String,
    },
    /// `status` is `None` when no attempt produced a response
    UpstreamFailure {
        status: Option<u16>,
        reason: FailureReason,
    },
    Unknown {
        status: u16,
    },
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::NotFound { uri } => Outcome::NotFound { uri },
            Outcome::UpstreamBadRequest { body } => Outcome::UpstreamBadRequest { body },
            Outcome::UpstreamFailure { status, reason } => {
                Outcome::UpstreamFailure { status, reason }
            }
            Outcome::Unknown { status } => Outcome::Unknown { status },
        }
    }

    /// Like [`Outcome::map`], but the mapping may itself fail into another outcome.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::NotFound { uri } => Outcome::NotFound { uri },
            Outcome::UpstreamBadRequest { body } => Outcome::UpstreamBadRequest { body },
            Outcome::UpstreamFailure { status, reason } => {
                Outcome::UpstreamFailure { status, reason }
            }
            Outcome::Unknown { status } => Outcome::Unknown { status },
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a `Result` for callers that propagate with `?`.
    pub fn into_result(self) -> Result<T, UpstreamError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::NotFound { uri } => Err(UpstreamError::NotFound { uri }),
            Outcome::UpstreamBadRequest { body } => Err(UpstreamError::BadRequest { body }),
            Outcome::UpstreamFailure {
                status,
                reason: FailureReason::Timeout,
            } => Err(UpstreamError::GatewayTimeout { status }),
            Outcome::UpstreamFailure { status, .. } => Err(UpstreamError::BadGateway { status }),
            Outcome::Unknown { status } => Err(UpstreamError::Unknown { status }),
        }
    }

    /// HTTP status a gateway should answer its own caller with.
    pub fn gateway_status(&self) -> u16 {
        match self {
            Outcome::Success(_) => 200,
            Outcome::NotFound { .. } => 404,
            Outcome::UpstreamBadRequest { .. } => 400,
            Outcome::UpstreamFailure {
                reason: FailureReason::Timeout,
                ..
            } => 504,
            Outcome::UpstreamFailure { .. } => 502,
            Outcome::Unknown { .. } => 500,
        }
    }
}

/// One page of a paginated upstream search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total hits across all pages
    pub total: usize,
}

impl<T> Page<T> {
    /// Index (1-based) of the first record on `page` with `per_page` records per page.
    pub fn first_record(page: usize, per_page: usize) -> usize {
        page.saturating_sub(1) * per_page + 1
    }
}
