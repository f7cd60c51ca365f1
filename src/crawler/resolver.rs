//! Shared sub-resource resolution
//!
//! Collects the distinct sub-resource links across all records, resolves each
//! one exactly once through the worker pool, and substitutes the resolved
//! names back into every reference list.

use crate::crawler::extractor::{parse_sub_resource, SubResourceRules};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pool::WorkerPool;
use crate::record::{Record, SubResource};
use crate::HarvestError;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Distinct sub-resource links referenced anywhere in `records`
pub fn distinct_links(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(Record::reference_links)
        .map(str::to_string)
        .collect()
}

/// Replaces every reference link with its resolved name
///
/// List order and multiplicity are preserved.
pub fn substitute(
    records: &mut [Record],
    names: &HashMap<String, String>,
) -> Result<(), HarvestError> {
    for record in records.iter_mut() {
        for links in record.references.values_mut() {
            for link in links.iter_mut() {
                let name = names.get(link.as_str()).ok_or_else(|| {
                    HarvestError::parse(link.clone(), "sub-resource was never resolved")
                })?;
                *link = name.clone();
            }
        }
    }
    Ok(())
}

/// Resolves every shared sub-resource once and substitutes the names
pub async fn resolve_sub_resources(
    pool: &WorkerPool,
    fetcher: &Fetcher,
    rules: Arc<SubResourceRules>,
    mut records: Vec<Record>,
) -> Result<Vec<Record>, HarvestError> {
    let links = distinct_links(&records);
    tracing::info!("Resolve started: {} distinct sub-resources", links.len());

    let fetcher = fetcher.clone();
    let resolved = pool
        .run("resolve", links.into_iter().collect(), move |link: String| {
            let fetcher = fetcher.clone();
            let rules = Arc::clone(&rules);
            async move {
                let body = fetcher.fetch_required(&link).await?;
                let name = parse_sub_resource(&rules, &body);
                tracing::debug!("Resolved {} ({})", link, name);
                Ok::<_, HarvestError>(SubResource { link, name })
            }
        })
        .await?;

    let names: HashMap<String, String> = resolved
        .into_iter()
        .map(|sub| (sub.link, sub.name))
        .collect();

    substitute(&mut records, &names)?;
    tracing::info!("Resolve finished: {} names substituted", names.len());
    Ok(records)
}
