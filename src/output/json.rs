//! JSON output for the harvested collection
//!
//! The whole collection is serialized as one JSON array, in id order, and
//! written in a single call so a failed run never leaves a partial file.

use crate::record::Record;
use crate::HarvestError;
use std::path::Path;
use tokio::fs;

/// Serializes the records as a JSON array
pub fn to_json(records: &[Record]) -> Result<Vec<u8>, HarvestError> {
    Ok(serde_json::to_vec(records)?)
}

/// Writes the records to `path`, creating parent directories as needed
pub async fn write_json(records: &[Record], path: &Path) -> Result<(), HarvestError> {
    let json = to_json(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    fs::write(path, &json).await?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
