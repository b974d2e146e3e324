//! Retry policy and outcome classification shared by both client variants.

mod classify;
mod policy;

pub use classify::{StatusClass, classify, classify_status, is_retryable};
pub use policy::{Backoff, RetryPolicy};
