// src/retry/classify.rs

//! Attempt and status classification.
//!
//! Two separate questions are answered here: whether an attempt is worth
//! repeating (inside the retry loop), and what a settled attempt means for
//! the caller (after the loop).

use crate::models::{Attempt, FailureReason, HttpMethod, Outcome, UpstreamResponse};

/// Whether the attempt failed in a way another attempt may fix.
pub fn is_retryable(attempt: &Attempt) -> bool {
    match attempt {
        Attempt::Response(response) => response.is_server_error(),
        Attempt::Failed(error) => error.is_transient(),
    }
}

/// Caller-facing class of an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NotFound,
    BadRequest,
    ServerError,
    Unknown,
}

/// Classify a status for a request sent with `method`.
///
/// 400 only means "bad payload" for methods that send one; on other methods
/// it is as unexpected as any other unhandled status.
pub fn classify_status(method: HttpMethod, status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        404 => StatusClass::NotFound,
        400 if method.sends_payload() => StatusClass::BadRequest,
        500.. => StatusClass::ServerError,
        _ => StatusClass::Unknown,
    }
}

/// Turn the last attempt of a call into a classified outcome.
///
/// `last_status` is the most recent status any attempt of the call received;
/// it is reported when the final attempt failed below HTTP.
pub fn classify(
    method: HttpMethod,
    uri: &str,
    attempt: Attempt,
    last_status: Option<u16>,
) -> Outcome<UpstreamResponse> {
    let response = match attempt {
        Attempt::Response(response) => response,
        Attempt::Failed(error) => {
            log::error!("{method} {uri} failed without a response: {error}");
            let reason = if error.is_timeout() {
                FailureReason::Timeout
            } else {
                FailureReason::Transport
            };
            return Outcome::UpstreamFailure {
                status: last_status,
                reason,
            };
        }
    };

    match classify_status(method, response.status) {
        StatusClass::Success => Outcome::Success(response),
        StatusClass::NotFound => Outcome::NotFound {
            uri: uri.to_string(),
        },
        StatusClass::BadRequest => Outcome::UpstreamBadRequest {
            body: response.body,
        },
        StatusClass::ServerError => {
            log::error!(
                "Remote service responded with status: {} when client called uri: {}",
                response.status,
                uri
            );
            Outcome::UpstreamFailure {
                status: Some(response.status),
                reason: FailureReason::ServerError,
            }
        }
        StatusClass::Unknown => {
            log::error!(
                "Remote service responded with status: {} when client called uri: {}",
                response.status,
                uri
            );
            Outcome::Unknown {
                status: response.status,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    const URI: &str = "https://api.cristin.no/v2/persons/1";

    fn respond(status: u16, body: &str) -> Attempt {
        Attempt::Response(UpstreamResponse::new(status, body))
    }

    #[test]
    fn status_table() {
        use HttpMethod::*;
        assert_eq!(classify_status(Get, 200), StatusClass::Success);
        assert_eq!(classify_status(Post, 201), StatusClass::Success);
        assert_eq!(classify_status(Get, 204), StatusClass::Success);
        assert_eq!(classify_status(Get, 404), StatusClass::NotFound);
        assert_eq!(classify_status(Patch, 404), StatusClass::NotFound);
        assert_eq!(classify_status(Post, 400), StatusClass::BadRequest);
        assert_eq!(classify_status(Patch, 400), StatusClass::BadRequest);
        assert_eq!(classify_status(Get, 400), StatusClass::Unknown);
        assert_eq!(classify_status(Delete, 400), StatusClass::Unknown);
        assert_eq!(classify_status(Get, 500), StatusClass::ServerError);
        assert_eq!(classify_status(Get, 503), StatusClass::ServerError);
        assert_eq!(classify_status(Get, 301), StatusClass::Unknown);
        assert_eq!(classify_status(Get, 403), StatusClass::Unknown);
        assert_eq!(classify_status(Get, 100), StatusClass::Unknown);
    }

    #[test]
    fn retry_on_server_error_and_transient_failures_only() {
        assert!(is_retryable(&respond(500, "")));
        assert!(is_retryable(&respond(502, "")));
        assert!(!is_retryable(&respond(200, "")));
        assert!(!is_retryable(&respond(404, "")));
        assert!(!is_retryable(&respond(400, "")));
        assert!(is_retryable(&Attempt::Failed(TransportError::Timeout(
            "t".into()
        ))));
        assert!(!is_retryable(&Attempt::Failed(TransportError::Request(
            "r".into()
        ))));
    }

    #[test]
    fn bad_request_carries_upstream_body() {
        let outcome = classify(
            HttpMethod::Post,
            URI,
            respond(400, "{\"errors\":[\"title missing\"]}"),
            Some(400),
        );
        assert_eq!(
            outcome,
            Outcome::UpstreamBadRequest {
                body: "{\"errors\":[\"title missing\"]}".into()
            }
        );
    }

    #[test]
    fn not_found_names_the_uri() {
        let outcome = classify(HttpMethod::Get, URI, respond(404, ""), Some(404));
        assert_eq!(outcome, Outcome::NotFound { uri: URI.into() });
    }

    #[test]
    fn transport_failure_reports_last_seen_status() {
        let outcome = classify(
            HttpMethod::Get,
            URI,
            Attempt::Failed(TransportError::Connect("refused".into())),
            Some(503),
        );
        assert_eq!(
            outcome,
            Outcome::UpstreamFailure {
                status: Some(503),
                reason: FailureReason::Transport
            }
        );

        let outcome = classify(
            HttpMethod::Get,
            URI,
            Attempt::Failed(TransportError::Timeout("slow".into())),
            None,
        );
        assert_eq!(
            outcome,
            Outcome::UpstreamFailure {
                status: None,
                reason: FailureReason::Timeout
            }
        );
    }
}
