//! Crawler module for the scrape-enrich pipeline
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with outcome classification
//! - Listing, detail, and sub-resource extraction
//! - The sequential pagination crawl
//! - The bounded worker pool and the stages built on it

mod assets;
mod enricher;
mod extractor;
mod fetcher;
mod paginator;
mod pool;
mod resolver;

pub use assets::{download_assets, file_name, AssetTarget};
pub use enricher::enrich_records;
pub use extractor::{
    base_origin, extract_stubs, parse_detail, parse_sub_resource, DetailPage, DetailRules,
    ListingRules, SubResourceRules,
};
pub use fetcher::{build_http_client, FetchResult, Fetcher};
pub use paginator::Paginator;
pub use pool::WorkerPool;
pub use resolver::{distinct_links, resolve_sub_resources, substitute};

use crate::config::{validate, Config};
use crate::output::write_json;
use crate::record::{assign_ids, Record};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Runs the whole pipeline for one configured source
///
/// crawl → enrich → resolve → download, each stage optional after the crawl
/// depending on which rule sections are configured.
pub struct Harvester {
    config: Config,
    fetcher: Fetcher,
    pool: WorkerPool,
    paginator: Paginator,
    base: Url,
    listing: ListingRules,
    detail: Option<Arc<DetailRules>>,
    sub_resource: Option<Arc<SubResourceRules>>,
}

impl Harvester {
    /// Compiles the rules and builds the HTTP client
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::from_config(&config.http)?;
        Self::with_fetcher(config, fetcher)
    }

    /// Builds a harvester around an existing fetcher
    ///
    /// The config is validated here so that a hand-built config cannot skip
    /// the checks the loader runs.
    pub fn with_fetcher(config: Config, fetcher: Fetcher) -> Result<Self, HarvestError> {
        validate(&config)?;
        let source = Url::parse(&config.source.url)?;
        let base = base_origin(&source);

        let paginator = Paginator::new(&config.source, base.clone())?;
        let listing = ListingRules::compile(&config.listing)?;
        let detail = config
            .detail
            .as_ref()
            .map(DetailRules::compile)
            .transpose()?
            .map(Arc::new);
        let sub_resource = config
            .sub_resource
            .as_ref()
            .map(SubResourceRules::compile)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            pool: WorkerPool::new(config.pipeline.workers()),
            config,
            fetcher,
            paginator,
            base,
            listing,
            detail,
            sub_resource,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every configured stage and returns the records in listing order
    pub async fn run(&self) -> Result<Vec<Record>, HarvestError> {
        let start_time = std::time::Instant::now();

        let stubs = self.paginator.crawl(&self.fetcher, &self.listing).await?;
        let mut records = assign_ids(stubs);

        if let Some(detail) = &self.detail {
            records = enrich_records(
                &self.pool,
                &self.fetcher,
                Arc::clone(detail),
                &self.base,
                records,
            )
            .await?;

            let has_references = detail.reference_names().next().is_some();
            if let (true, Some(sub_resource)) = (has_references, &self.sub_resource) {
                records = resolve_sub_resources(
                    &self.pool,
                    &self.fetcher,
                    Arc::clone(sub_resource),
                    records,
                )
                .await?;
            }
        }

        if let Some(assets) = &self.config.assets {
            records = download_assets(
                &self.pool,
                &self.fetcher,
                AssetTarget::new(assets),
                records,
            )
            .await?;
        }

        tracing::info!(
            "Harvest completed: {} records in {:?}",
            records.len(),
            start_time.elapsed()
        );
        Ok(records)
    }
}

/// Runs a complete harvest and writes the JSON output
///
/// Nothing is written when any stage fails.
///
/// # Returns
///
/// * `Ok(usize)` - Number of records written
/// * `Err(HarvestError)` - The first failure of the run
pub async fn harvest(config: Config) -> Result<usize, HarvestError> {
    let harvester = Harvester::new(config)?;
    let records = harvester.run().await?;
    write_json(&records, Path::new(&harvester.config().output.data_path)).await?;
    Ok(records.len())
}
