// src/models/mod.rs

//! Domain models for the gateway.
//!
//! Configuration, the request descriptor handed to the client, raw attempt
//! results, and the classified outcome handed back to the caller.

mod config;
mod outcome;
mod request;
mod response;

// Re-export all public types
pub use config::{Config, CredentialsConfig, RetryConfig, UpstreamConfig, env};
pub use outcome::{FailureReason, Outcome, Page};
pub use request::{
    ACCEPT, APPLICATION_JSON, APPLICATION_MERGE_PATCH_JSON, BypassHeader, CONTENT_TYPE,
    Credentials, HttpMethod, INSTITUTION_HEADER, UpstreamRequest,
};
pub use response::{Attempt, TOTAL_COUNT_HEADER, UpstreamResponse};
