// src/client/blocking.rs

//! Synchronous upstream client.

use serde::de::DeserializeOwned;

use super::{RetryRun, Settled, Transport, classify_settled, decode, decode_page};
use crate::error::Result;
use crate::models::{
    Attempt, Outcome, Page, RetryConfig, UpstreamConfig, UpstreamRequest, UpstreamResponse,
};
use crate::retry::RetryPolicy;
use crate::utils::http;

/// Retrying client that blocks the calling thread for attempts and backoff.
pub struct BlockingUpstreamClient<T = reqwest::blocking::Client> {
    transport: T,
    policy: RetryPolicy,
}

impl BlockingUpstreamClient<reqwest::blocking::Client> {
    /// Build a client backed by a blocking `reqwest` client.
    ///
    /// Must not be called from inside an async runtime.
    pub fn from_config(upstream: &UpstreamConfig, retry: &RetryConfig) -> Result<Self> {
        let transport = http::create_blocking_client(upstream)?;
        Ok(Self::new(transport, RetryPolicy::from_config(retry)))
    }
}

impl<T: Transport> BlockingUpstreamClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run the retry loop and return the last attempt, whatever it was.
    pub fn send_raw(&self, request: &UpstreamRequest) -> Settled {
        let mut run = RetryRun::new(&self.policy, request);
        loop {
            run.begin();
            let attempt: Attempt = self.transport.execute(request).into();
            match run.next_delay(&attempt) {
                Some(delay) => {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                None => return run.settle(attempt),
            }
        }
    }

    /// Send with retries and classify the result.
    pub fn send(&self, request: &UpstreamRequest) -> Outcome<UpstreamResponse> {
        classify_settled(request, self.send_raw(request))
    }

    /// Send, classify, and decode a successful body into `D`.
    pub fn fetch<D: DeserializeOwned>(&self, request: &UpstreamRequest) -> Outcome<D> {
        self.send(request).and_then(|response| decode(&response))
    }

    /// Like [`BlockingUpstreamClient::fetch`] for searches returning a JSON array.
    pub fn fetch_page<D: DeserializeOwned>(&self, request: &UpstreamRequest) -> Outcome<Page<D>> {
        self.send(request).and_then(|response| decode_page(&response))
    }
}
