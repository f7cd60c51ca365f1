//! Asset download
//!
//! Fetches each record's asset through the worker pool, writes it under the
//! last path segment of its URL, and points the record at the local copy.
//! A missing asset (404) falls back to the placeholder instead of failing.

use crate::config::AssetsConfig;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::pool::WorkerPool;
use crate::record::{sort_by_id, Record};
use crate::HarvestError;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Where assets go and how records refer to them
#[derive(Debug, Clone)]
pub struct AssetTarget {
    dir: PathBuf,
    path_prefix: String,
    placeholder: String,
}

impl AssetTarget {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            path_prefix: config.path_prefix.clone(),
            placeholder: config.placeholder.clone(),
        }
    }

    /// Local reference for a stored file name
    pub fn reference(&self, file_name: &str) -> String {
        let prefix = self.path_prefix.trim_end_matches('/');
        if prefix.is_empty() && !self.path_prefix.starts_with('/') {
            file_name.to_string()
        } else {
            format!("{}/{}", prefix, file_name)
        }
    }

    /// Local reference used when the asset does not exist upstream
    pub fn placeholder_reference(&self) -> String {
        self.reference(&self.placeholder)
    }
}

/// Last path segment of an asset URL, percent-decoded
///
/// The decoded name must stay inside the asset directory: empty, `.`, `..`
/// and names containing a path separator are rejected.
pub fn file_name(asset_url: &str) -> Result<String, HarvestError> {
    let url = Url::parse(asset_url)
        .map_err(|e| HarvestError::parse(asset_url, format!("invalid asset url: {}", e)))?;

    let segment = url
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or_default();

    let decoded = urlencoding::decode(segment)
        .map_err(|e| HarvestError::parse(asset_url, format!("asset file name is not UTF-8: {}", e)))?;

    if decoded.is_empty() || decoded == "." || decoded == ".." || decoded.contains(['/', '\\']) {
        return Err(HarvestError::parse(asset_url, "asset url has no usable file name"));
    }

    Ok(decoded.into_owned())
}

/// Downloads every record's asset, returning the records in id order
pub async fn download_assets(
    pool: &WorkerPool,
    fetcher: &Fetcher,
    target: AssetTarget,
    records: Vec<Record>,
) -> Result<Vec<Record>, HarvestError> {
    tracing::info!(
        "Download started: {} records into {}",
        records.len(),
        target.dir.display()
    );
    tokio::fs::create_dir_all(&target.dir).await?;

    let fetcher = fetcher.clone();
    let target = Arc::new(target);

    let mut downloaded = pool
        .run("download", records, move |record: Record| {
            let fetcher = fetcher.clone();
            let target = Arc::clone(&target);
            async move { download_one(&fetcher, &target, record).await }
        })
        .await?;

    sort_by_id(&mut downloaded);
    tracing::info!("Download finished: {} records", downloaded.len());
    Ok(downloaded)
}

async fn download_one(
    fetcher: &Fetcher,
    target: &AssetTarget,
    mut record: Record,
) -> Result<Record, HarvestError> {
    let Some(source) = record.asset.take() else {
        return Ok(record);
    };

    let file_name = file_name(&source)?;

    match fetcher.fetch(&source).await {
        FetchResult::Success { body } => {
            tokio::fs::write(target.dir.join(&file_name), &body).await?;
            tracing::debug!("Saved {} ({} bytes)", file_name, body.len());
            record.asset = Some(target.reference(&file_name));
        }
        FetchResult::NotFound => {
            tracing::debug!("Asset {} missing, using placeholder", source);
            record.asset = Some(target.placeholder_reference());
        }
        FetchResult::Failure(e) => return Err(e),
    }

    Ok(record)
}
