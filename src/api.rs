use std::time::Duration;

use anyhow::{bail, Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use url::Url;

use crate::catalog::Item;

pub const STRUCTURE_PATH: &str = "/api/structure";
pub const RELATED_PATH: &str = "/api/related-videos";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Characters escaped inside one path segment, `/` included.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("library client user agent required");
        }
        let base_url = Url::parse(config.base_url.trim())
            .with_context(|| format!("parse server url {:?}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("server url {base_url} cannot be used as a base");
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()
                .context("build library HTTP client")?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn structure(&self) -> Result<Vec<Item>, LoadError> {
        let url = self.endpoint(STRUCTURE_PATH);
        self.get_items(&url, &[])
    }

    pub fn related(&self, folder: &str) -> Result<Vec<Item>, LoadError> {
        let url = self.endpoint(RELATED_PATH);
        self.get_items(&url, &[("folder", folder)])
    }

    /// Playback page for an item, e.g. `{base}/play/Movies/My%20Film.mp4`.
    pub fn play_url(&self, path: &str) -> String {
        format!("{}/play/{}", self.base_url(), encode_path(path))
    }

    /// Raw media stream, suitable for an external player.
    pub fn stream_url(&self, path: &str) -> String {
        format!("{}/video/{}", self.base_url(), encode_path(path))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn get_items(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<Item>, LoadError> {
        tracing::debug!(%url, ?query, "fetching items");
        let response = self
            .http
            .get(url)
            .query(query)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|source| LoadError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().map_err(|source| LoadError::Request {
            url: url.to_string(),
            source,
        })?;
        let items: Vec<Item> =
            serde_json::from_slice(&body).map_err(|source| LoadError::Decode {
                url: url.to_string(),
                source,
            })?;
        tracing::debug!(%url, count = items.len(), "items received");
        Ok(items)
    }
}

pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
