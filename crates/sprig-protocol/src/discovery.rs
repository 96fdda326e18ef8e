//! Fetching a reference advertisement over smart HTTP.

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::advertisement::ReferenceAdvertisement;
use crate::endpoint::service;
use crate::error::{ProtocolError, ProtocolResult};

/// Settings for discovery requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Sent as the `User-Agent` header.
    pub user_agent: String,
    /// Scheme used when the repository string has no http(s) scheme.
    pub default_scheme: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("git/sprig-", env!("CARGO_PKG_VERSION")).into(),
            default_scheme: "https".into(),
        }
    }
}

/// Build `<repo>/info/refs?service=git-upload-pack`.
///
/// `github.com/a/b` and `git://github.com/a/b` both become
/// `https://github.com/a/b/info/refs?...` with the default scheme.
pub fn info_refs_url(repo: &str, config: &DiscoveryConfig) -> ProtocolResult<Url> {
    let repo = repo.trim();
    let rest = match repo.split_once("://") {
        Some((scheme, _)) if scheme == "http" || scheme == "https" => None,
        Some((_, rest)) => Some(rest),
        None => Some(repo),
    };
    let mut url = match rest {
        None => Url::parse(repo)?,
        Some(rest) => Url::parse(&format!("{}://{rest}", config.default_scheme))?,
    };

    let path = format!("{}/{}", url.path().trim_end_matches('/'), service::INFO_REFS);
    url.set_path(&path);
    url.set_query(Some(service::QUERY));
    Ok(url)
}

/// Validate the status and content type of a discovery response.
///
/// 200 and 304 are accepted. Parameters after `;` in the content type are
/// ignored, and the media type is compared case-insensitively.
pub fn check_response(status: u16, content_type: Option<&str>, url: &str) -> ProtocolResult<()> {
    if status != 200 && status != 304 {
        return Err(ProtocolError::HttpStatus {
            status,
            url: url.to_string(),
        });
    }
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    if !media_type.eq_ignore_ascii_case(service::ADVERTISEMENT_CONTENT_TYPE) {
        return Err(ProtocolError::UnexpectedContentType {
            expected: service::ADVERTISEMENT_CONTENT_TYPE.to_string(),
            found: content_type.unwrap_or("<none>").to_string(),
        });
    }
    Ok(())
}

/// A blocking smart-HTTP discovery client.
pub struct Discovery {
    client: Client,
    config: DiscoveryConfig,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> ProtocolResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Fetch and parse the advertisement for `repo`.
    pub fn discover(&self, repo: &str) -> ProtocolResult<ReferenceAdvertisement> {
        let url = info_refs_url(repo, &self.config)?;
        debug!(%url, "requesting reference advertisement");

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, &self.config.user_agent)
            .send()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        check_response(response.status().as_u16(), content_type.as_deref(), url.as_str())?;

        let body = response.bytes()?;
        debug!(bytes = body.len(), "received advertisement");
        ReferenceAdvertisement::from_response_body(&body)
    }
}

/// Discover `repo` with the default configuration.
pub fn discover(repo: &str) -> ProtocolResult<ReferenceAdvertisement> {
    Discovery::new(DiscoveryConfig::default())?.discover(repo)
}
