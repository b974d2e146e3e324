// src/lib.rs

//! Cristin Gateway Library
//!
//! Retrying, classifying HTTP client for the Cristin research registry API.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod services;
pub mod utils;
