// src/services/endpoints.rs

//! Upstream URI construction per resource family.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{BypassHeader, UpstreamConfig, UpstreamRequest};

/// Languages requested on every search unless the caller picks one.
pub const DEFAULT_LANGUAGES: &str = "en,nb,nn";

static UNIT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("valid unit id pattern"));
static NUMERIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid numeric id pattern"));
// Cristin person number or ORCID
static PERSON_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+|\d{4}-\d{4}-\d{4}-\d{3}[\dX])$").expect("valid person id pattern")
});
// Funding sources use short upstream codes such as "NFR"
static FUNDING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid funding code pattern"));

/// Resource families exposed by the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Unit,
    Person,
    Project,
    Biobank,
    FundingSource,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Unit,
        Resource::Person,
        Resource::Project,
        Resource::Biobank,
        Resource::FundingSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Unit => "unit",
            Resource::Person => "person",
            Resource::Project => "project",
            Resource::Biobank => "biobank",
            Resource::FundingSource => "funding-source",
        }
    }

    /// Path below the base URI.
    pub fn segments(&self) -> &'static [&'static str] {
        match self {
            Resource::Unit => &["units"],
            Resource::Person => &["persons"],
            Resource::Project => &["projects"],
            Resource::Biobank => &["biobanks"],
            Resource::FundingSource => &["fundings", "sources"],
        }
    }

    fn id_pattern(&self) -> &'static Regex {
        match self {
            Resource::Unit => &UNIT_ID,
            Resource::Person => &PERSON_ID,
            Resource::Project | Resource::Biobank => &NUMERIC_ID,
            Resource::FundingSource => &FUNDING_CODE,
        }
    }

    /// Check an identifier against the format the upstream accepts.
    pub fn validate_id(&self, id: &str) -> Result<()> {
        if self.id_pattern().is_match(id) {
            return Ok(());
        }
        Err(AppError::validation(format!(
            "'{}' is not a valid {} identifier",
            id,
            self.as_str()
        )))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "unit" | "units" => Ok(Resource::Unit),
            "person" | "persons" => Ok(Resource::Person),
            "project" | "projects" => Ok(Resource::Project),
            "biobank" | "biobanks" => Ok(Resource::Biobank),
            "funding-source" | "funding-sources" | "fundings" => Ok(Resource::FundingSource),
            other => Err(AppError::validation(format!("unknown resource '{other}'"))),
        }
    }
}

/// Builds upstream URIs and requests against a base URI.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    bypass: Option<BypassHeader>,
}

impl Endpoints {
    pub fn new(base: Url) -> Self {
        Self { base, bypass: None }
    }

    /// Endpoints for the configured base URI and bypass header.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let endpoints = Self::new(Url::parse(&config.base_uri)?);
        Ok(match crate::config::bypass_header(config) {
            Some(bypass) => endpoints.with_bypass(bypass),
            None => endpoints,
        })
    }

    /// Attach a bot-filter bypass header to every request built here.
    pub fn with_bypass(mut self, bypass: BypassHeader) -> Self {
        self.bypass = Some(bypass);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URI of a single resource.
    pub fn item(&self, resource: Resource, id: &str) -> Result<Url> {
        resource.validate_id(id)?;
        let mut uri = self.collection(resource)?;
        uri.path_segments_mut()
            .map_err(|_| cannot_be_base(&self.base))?
            .push(id);
        Ok(uri)
    }

    /// URI of a collection search.
    ///
    /// Parameters are sorted by name, later duplicates win, and `lang` is
    /// added unless given.
    pub fn search(&self, resource: Resource, params: &[(String, String)]) -> Result<Url> {
        let mut sorted: BTreeMap<&str, &str> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        sorted.entry("lang").or_insert(DEFAULT_LANGUAGES);

        let mut uri = self.collection(resource)?;
        uri.query_pairs_mut().extend_pairs(sorted);
        Ok(uri)
    }

    /// GET request for a single resource.
    pub fn item_request(&self, resource: Resource, id: &str) -> Result<UpstreamRequest> {
        Ok(self.decorate(UpstreamRequest::get(self.item(resource, id)?)))
    }

    /// GET request for a collection search.
    pub fn search_request(
        &self,
        resource: Resource,
        params: &[(String, String)],
    ) -> Result<UpstreamRequest> {
        Ok(self.decorate(UpstreamRequest::get(self.search(resource, params)?)))
    }

    fn decorate(&self, request: UpstreamRequest) -> UpstreamRequest {
        match &self.bypass {
            Some(bypass) => request.with_bypass(bypass),
            None => request,
        }
    }

    fn collection(&self, resource: Resource) -> Result<Url> {
        let mut uri = self.base.clone();
        uri.set_query(None);
        uri.path_segments_mut()
            .map_err(|_| cannot_be_base(&self.base))?
            .pop_if_empty()
            .extend(resource.segments());
        Ok(uri)
    }
}

fn cannot_be_base(base: &Url) -> AppError {
    AppError::config(format!("base URI '{base}' cannot carry a path"))
}
