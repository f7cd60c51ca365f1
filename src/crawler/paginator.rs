//! Sequential listing crawl
//!
//! Pages are requested one at a time in ascending order. The crawl stops on a
//! 404 or on the first page that holds fewer entries than a full page.

use crate::config::{FirstPageNotFound, SourceConfig};
use crate::crawler::extractor::{extract_stubs, ListingRules};
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::record::Stub;
use crate::HarvestError;
use url::Url;

/// Drives the page-number loop over a listing URL
#[derive(Debug, Clone)]
pub struct Paginator {
    url: Url,
    base: Url,
    page_param: String,
    page_size: usize,
    first_page_not_found: FirstPageNotFound,
}

impl Paginator {
    pub fn new(config: &SourceConfig, base: Url) -> Result<Self, HarvestError> {
        Ok(Self {
            url: Url::parse(&config.url)?,
            base,
            page_param: config.page_param.clone(),
            page_size: config.page_size,
            first_page_not_found: config.first_page_not_found,
        })
    }

    /// URL of listing page `page`, replacing any existing page parameter
    pub fn page_url(&self, page: usize) -> Url {
        let retained: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| *key != self.page_param.as_str())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair(&self.page_param, &page.to_string());
        url
    }

    /// Crawls every listing page and returns the stubs in listing order
    pub async fn crawl(
        &self,
        fetcher: &Fetcher,
        rules: &ListingRules,
    ) -> Result<Vec<Stub>, HarvestError> {
        tracing::info!("Crawl started: {}", self.url);

        let mut stubs = Vec::new();
        let mut page = 1;

        loop {
            let url = self.page_url(page);

            let body = match fetcher.fetch(url.as_str()).await {
                FetchResult::Success { body } => body,
                FetchResult::NotFound => {
                    if page == 1 && self.first_page_not_found == FirstPageNotFound::Fatal {
                        return Err(HarvestError::EmptySource {
                            url: url.to_string(),
                        });
                    }
                    tracing::debug!("Page {} not found, listing exhausted", page);
                    break;
                }
                FetchResult::Failure(e) => return Err(e),
            };

            let page_stubs = extract_stubs(rules, &body, &self.base);
            let count = page_stubs.len();
            tracing::debug!("Page {}: {} entries", page, count);
            stubs.extend(page_stubs);

            if count < self.page_size {
                break;
            }
            page += 1;
        }

        tracing::info!("Crawl finished: {} entries after {} page requests", stubs.len(), page);
        Ok(stubs)
    }
}
