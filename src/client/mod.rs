// src/client/mod.rs

//! Retrying upstream clients.
//!
//! [`BlockingUpstreamClient`] and [`UpstreamClient`] run the same pipeline:
//! attempt, retry while the attempt is retryable and budget remains, classify
//! the last attempt, then decode on success. Only the way they wait differs.

mod blocking;
mod decode;
mod nonblocking;
mod transport;

use std::time::Duration;

pub use blocking::BlockingUpstreamClient;
pub use decode::{decode, decode_page};
pub use nonblocking::UpstreamClient;
pub use transport::{AsyncTransport, Transport};

use crate::models::{Attempt, Outcome, UpstreamRequest, UpstreamResponse};
use crate::retry::{RetryPolicy, classify, is_retryable};

/// Last attempt of a call once the retry loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub last: Attempt,
    /// Transport invocations made for the call
    pub attempts: u32,
    /// Most recent status received by any attempt
    pub last_status: Option<u16>,
}

/// Bookkeeping for one call's retry loop.
struct RetryRun<'a> {
    policy: &'a RetryPolicy,
    request: &'a UpstreamRequest,
    attempts: u32,
    last_status: Option<u16>,
}

impl<'a> RetryRun<'a> {
    fn new(policy: &'a RetryPolicy, request: &'a UpstreamRequest) -> Self {
        Self {
            policy,
            request,
            attempts: 0,
            last_status: None,
        }
    }

    fn begin(&mut self) {
        self.attempts += 1;
        log::debug!(
            "{} {} (attempt {}/{})",
            self.request.method(),
            self.request.uri(),
            self.attempts,
            self.policy.max_attempts()
        );
    }

    /// Record the attempt just made. Returns the delay before the next
    /// attempt, or `None` when the call is settled.
    fn next_delay(&mut self, attempt: &Attempt) -> Option<Duration> {
        if let Some(status) = attempt.status() {
            self.last_status = Some(status);
        }
        if !is_retryable(attempt) {
            return None;
        }
        if !self.policy.has_budget_after(self.attempts) {
            log::error!(
                "Giving up on {} {} after {} attempts: {}",
                self.request.method(),
                self.request.uri(),
                self.attempts,
                describe(attempt)
            );
            return None;
        }
        log::warn!(
            "Failed HttpRequest on attempt {} of {}: {}",
            self.attempts,
            self.policy.max_attempts(),
            describe(attempt)
        );
        Some(self.policy.delay_after(self.attempts))
    }

    fn settle(self, last: Attempt) -> Settled {
        Settled {
            last,
            attempts: self.attempts,
            last_status: self.last_status,
        }
    }
}

fn describe(attempt: &Attempt) -> String {
    match attempt {
        Attempt::Response(response) => format!("status {}", response.status),
        Attempt::Failed(error) => error.to_string(),
    }
}

fn classify_settled(request: &UpstreamRequest, settled: Settled) -> Outcome<UpstreamResponse> {
    classify(
        request.method(),
        request.uri().as_str(),
        settled.last,
        settled.last_status,
    )
}
