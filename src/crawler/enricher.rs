//! Detail-page enrichment
//!
//! Fetches every record's detail page through the worker pool and fills in
//! its display name and reference lists. Any failure aborts the stage.

use crate::crawler::extractor::{parse_detail, DetailRules};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pool::WorkerPool;
use crate::record::{sort_by_id, Record};
use crate::HarvestError;
use std::sync::Arc;
use url::Url;

/// Enriches records from their detail pages, returning them in id order
pub async fn enrich_records(
    pool: &WorkerPool,
    fetcher: &Fetcher,
    rules: Arc<DetailRules>,
    base: &Url,
    records: Vec<Record>,
) -> Result<Vec<Record>, HarvestError> {
    tracing::info!("Enrich started: {} records", records.len());

    let fetcher = fetcher.clone();
    let base = Arc::new(base.clone());

    let mut enriched = pool
        .run("enrich", records, move |record: Record| {
            let fetcher = fetcher.clone();
            let rules = Arc::clone(&rules);
            let base = Arc::clone(&base);
            async move { enrich_one(&fetcher, &rules, &base, record).await }
        })
        .await?;

    sort_by_id(&mut enriched);
    tracing::info!("Enrich finished: {} records", enriched.len());
    Ok(enriched)
}

async fn enrich_one(
    fetcher: &Fetcher,
    rules: &DetailRules,
    base: &Url,
    mut record: Record,
) -> Result<Record, HarvestError> {
    let body = fetcher.fetch_required(record.link()).await?;
    let page = parse_detail(rules, &body, base, record.link())?;

    tracing::debug!("Enriched {} ({})", record.link(), page.name);

    // A listing-provided name survives an empty detail name
    if !page.name.is_empty() || record.name.is_empty() {
        record.name = page.name;
    }
    record.references = page.references;
    Ok(record)
}
