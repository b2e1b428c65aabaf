//! Captured JSON payloads on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cifsfeed_core::{DisruptionListing, GeometryCollection};
use tracing::info;

use crate::{IncidentSource, SourceError};

pub fn decode_geometry(json: &str) -> Result<GeometryCollection, SourceError> {
    Ok(serde_json::from_str(json)?)
}

pub fn decode_details(json: &str) -> Result<DisruptionListing, SourceError> {
    Ok(serde_json::from_str(json)?)
}

async fn read_text(path: &Path) -> Result<String, SourceError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a GIS feature collection captured by the browser scrape.
pub async fn read_geometry(path: &Path) -> Result<GeometryCollection, SourceError> {
    let collection = decode_geometry(&read_text(path).await?)?;
    info!(path = %path.display(), features = collection.features.len(), "read GIS features");
    Ok(collection)
}

pub async fn read_details(path: &Path) -> Result<DisruptionListing, SourceError> {
    let listing = decode_details(&read_text(path).await?)?;
    info!(path = %path.display(), details = listing.ongoing.len(), "read disruption details");
    Ok(listing)
}

/// Both inputs from files, for offline runs and replays.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub geometry: PathBuf,
    pub details: PathBuf,
}

#[async_trait]
impl IncidentSource for FileSource {
    async fn geometry(&self) -> Result<GeometryCollection, SourceError> {
        read_geometry(&self.geometry).await
    }

    async fn details(&self) -> Result<DisruptionListing, SourceError> {
        read_details(&self.details).await
    }
}
