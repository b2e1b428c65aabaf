//! Source collaborators: GIS geometry and disruption details for one run.
//!
//! The GIS payload is produced by a browser scrape of the Renew London map and
//! reaches this crate either as a captured JSON file or from a URL. Disruption
//! details come straight from the public API.

mod file;
pub use file::{FileSource, decode_details, decode_geometry, read_details, read_geometry};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{DETAILS_URL, GisInput, HttpSource, RenewLondonClient};

use async_trait::async_trait;
use cifsfeed_core::{DisruptionListing, GeometryCollection};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    /// True when the payload arrived but could not be decoded.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}

/// Supplies the two raw inputs of a run.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    async fn geometry(&self) -> Result<GeometryCollection, SourceError>;
    async fn details(&self) -> Result<DisruptionListing, SourceError>;
}
