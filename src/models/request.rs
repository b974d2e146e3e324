// src/models/request.rs

//! Request descriptor for a single logical upstream call.

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::models::CredentialsConfig;

pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";
pub const APPLICATION_MERGE_PATCH_JSON: &str = "application/merge-patch+json";
pub const INSTITUTION_HEADER: &str = "Cristin-Representing-Institution";

/// HTTP methods the upstream is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the method carries a payload the upstream may reject with 400.
    pub fn sends_payload(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Bot-filter bypass header configured for the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassHeader {
    pub name: String,
    pub value: String,
}

impl BypassHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Basic-auth credentials attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl From<&CredentialsConfig> for Credentials {
    fn from(config: &CredentialsConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// A fully-formed upstream request.
///
/// Built with the constructor for its method and the `with_*` methods, which
/// consume and return the descriptor. Fields are only readable afterwards, so
/// every retry of a call sends exactly the same request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    uri: Url,
    method: HttpMethod,
    body: Option<String>,
    headers: Vec<(String, String)>,
    credentials: Option<Credentials>,
}

impl UpstreamRequest {
    fn new(method: HttpMethod, uri: Url, body: Option<String>) -> Self {
        Self {
            uri,
            method,
            body,
            headers: vec![(ACCEPT.to_string(), "application/json".to_string())],
            credentials: None,
        }
    }

    pub fn get(uri: Url) -> Self {
        Self::new(HttpMethod::Get, uri, None)
    }

    pub fn delete(uri: Url) -> Self {
        Self::new(HttpMethod::Delete, uri, None)
    }

    /// POST a JSON payload.
    pub fn post(uri: Url, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, uri, Some(body.into()))
            .with_header(CONTENT_TYPE, APPLICATION_JSON)
    }

    /// PATCH with a JSON merge-patch payload.
    pub fn patch(uri: Url, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, uri, Some(body.into()))
            .with_header(CONTENT_TYPE, APPLICATION_MERGE_PATCH_JSON)
    }

    /// Append a header. Order is preserved and duplicates are kept.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Scope the request to the institution allowed to perform an update.
    pub fn with_institution(self, institution_number: impl Into<String>) -> Self {
        self.with_header(INSTITUTION_HEADER, institution_number)
    }

    pub fn with_bypass(self, bypass: &BypassHeader) -> Self {
        self.with_header(bypass.name.clone(), bypass.value.clone())
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}
