//! Service layer for the gateway.
//!
//! Maps resource families onto upstream URIs and ready-to-send requests.

mod endpoints;

pub use endpoints::{DEFAULT_LANGUAGES, Endpoints, Resource};
