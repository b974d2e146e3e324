// src/client/nonblocking.rs

//! Asynchronous upstream client.

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;

use super::{AsyncTransport, RetryRun, Settled, classify_settled, decode, decode_page};
use crate::error::Result;
use crate::models::{
    Attempt, Outcome, Page, RetryConfig, UpstreamConfig, UpstreamRequest, UpstreamResponse,
};
use crate::retry::RetryPolicy;
use crate::utils::http;

/// Retrying client that schedules backoff on the runtime instead of blocking.
///
/// Cloning is cheap when the transport is (as `reqwest::Client` is).
#[derive(Clone)]
pub struct UpstreamClient<T = reqwest::Client> {
    transport: T,
    policy: RetryPolicy,
}

impl UpstreamClient<reqwest::Client> {
    /// Build a client backed by an async `reqwest` client.
    pub fn from_config(upstream: &UpstreamConfig, retry: &RetryConfig) -> Result<Self> {
        let transport = http::create_async_client(upstream)?;
        Ok(Self::new(transport, RetryPolicy::from_config(retry)))
    }
}

impl<T: AsyncTransport> UpstreamClient<T> {
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
    pub async fn send_raw(&self, request: &UpstreamRequest) -> Settled {
        let mut run = RetryRun::new(&self.policy, request);
        loop {
            run.begin();
            let attempt: Attempt = self.transport.execute(request).await.into();
            match run.next_delay(&attempt) {
                Some(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                None => return run.settle(attempt),
            }
        }
    }

    /// Send with retries and classify the result.
    pub async fn send(&self, request: &UpstreamRequest) -> Outcome<UpstreamResponse> {
        classify_settled(request, self.send_raw(request).await)
    }

    /// Send, classify, and decode a successful body into `D`.
    pub async fn fetch<D: DeserializeOwned>(&self, request: &UpstreamRequest) -> Outcome<D> {
        self.send(request).await.and_then(|response| decode(&response))
    }

    /// Like [`UpstreamClient::fetch`] for searches returning a JSON array.
    pub async fn fetch_page<D: DeserializeOwned>(
        &self,
        request: &UpstreamRequest,
    ) -> Outcome<Page<D>> {
        self.send(request)
            .await
            .and_then(|response| decode_page(&response))
    }

    /// Fetch several resources with at most `concurrency` calls in flight.
    ///
    /// Results keep the order of `requests`. Calls that do not succeed are
    /// logged and left out.
    pub async fn fetch_many<D: DeserializeOwned>(
        &self,
        requests: &[UpstreamRequest],
        concurrency: usize,
    ) -> Vec<D> {
        let results: Vec<(&UpstreamRequest, Outcome<D>)> = stream::iter(requests)
            .map(|request| async move { (request, self.fetch::<D>(request).await) })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(request, outcome)| match outcome {
                Outcome::Success(value) => Some(value),
                other => {
                    log::warn!(
                        "Dropping {} from batch (gateway status {})",
                        request.uri(),
                        other.gateway_status()
                    );
                    None
                }
            })
            .collect()
    }
}
