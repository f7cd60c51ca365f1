//! HTTP fetcher implementation
//!
//! Every network request of the pipeline goes through [`Fetcher::fetch`],
//! which classifies the outcome into success, not-found, or failure. There is
//! no caching and no retry: a failure goes straight back to the caller.

use crate::config::HttpConfig;
use crate::HarvestError;
use reqwest::{Client, StatusCode};

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// 2xx response with its body
    Success {
        /// Page or asset body
        body: Vec<u8>,
    },

    /// HTTP 404; an expected data-absence signal, not an error
    NotFound,

    /// Transport error or unexpected status
    Failure(HarvestError),
}

impl FetchResult {
    /// Converts to a body, mapping `NotFound` through `on_not_found`
    pub fn into_body(
        self,
        on_not_found: impl FnOnce() -> HarvestError,
    ) -> Result<Vec<u8>, HarvestError> {
        match self {
            FetchResult::Success { body } => Ok(body),
            FetchResult::NotFound => Err(on_not_found()),
            FetchResult::Failure(e) => Err(e),
        }
    }
}

/// Shared HTTP GET capability
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the HTTP configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?))
    }

    /// Performs one GET request and classifies the outcome
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Success` |
    /// | HTTP 404 | `NotFound` |
    /// | Any other status | `Failure(Protocol)` |
    /// | Connection / body read error | `Failure(Transport)` |
    pub async fn fetch(&self, url: &str) -> FetchResult {
        tracing::trace!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(source) => {
                return FetchResult::Failure(HarvestError::Transport {
                    url: url.to_string(),
                    source,
                })
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{} returned 404", url);
            return FetchResult::NotFound;
        }

        if !status.is_success() {
            return FetchResult::Failure(HarvestError::Protocol {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match response.bytes().await {
            Ok(body) => FetchResult::Success {
                body: body.to_vec(),
            },
            Err(source) => FetchResult::Failure(HarvestError::Transport {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Fetches a page that must exist; 404 is reported as a protocol failure
    pub async fn fetch_required(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        self.fetch(url).await.into_body(|| HarvestError::Protocol {
            url: url.to_string(),
            status: StatusCode::NOT_FOUND.as_u16(),
        })
    }
}

/// Builds an HTTP client with the configured user agent
///
/// No request timeout is set; an unresponsive endpoint holds its worker
/// until the connection fails or returns.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .gzip(true)
        .brotli(true)
        .build()
}
