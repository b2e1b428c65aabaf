//! HTTP client for the Renew London disruption API and GIS payload endpoint.

use std::path::PathBuf;

use async_trait::async_trait;
use cifsfeed_core::{DisruptionListing, GeometryCollection};
use tracing::info;

use crate::file::{decode_details, decode_geometry, read_geometry};
use crate::{IncidentSource, SourceError};

/// Public JSON listing of ongoing disruptions.
pub const DETAILS_URL: &str = "https://apps.london.ca/RenewLondon/home/GetAllDisruptions";

/// HTTP client for Renew London's public endpoints.
pub struct RenewLondonClient {
    client: reqwest::Client,
    details_url: String,
}

impl RenewLondonClient {
    /// Create a client for the given details endpoint.
    pub fn new(details_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            details_url: details_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn details_url(&self) -> &str {
        &self.details_url
    }

    /// Pull the ongoing disruption listing.
    pub async fn fetch_details(&self) -> Result<DisruptionListing, SourceError> {
        info!(url = %self.details_url, "querying disruption details");
        let body = self.get_text(&self.details_url).await?;
        let listing = decode_details(&body)?;
        info!(count = listing.ongoing.len(), "pulled disruption details");
        Ok(listing)
    }

    /// Pull a GIS feature collection published at `url`.
    pub async fn fetch_geometry(&self, url: &str) -> Result<GeometryCollection, SourceError> {
        info!(url = %url, "querying GIS features");
        let body = self.get_text(url).await?;
        let collection = decode_geometry(&body)?;
        info!(count = collection.features.len(), "pulled GIS features");
        Ok(collection)
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }
}

/// Where the GIS payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GisInput {
    Url(String),
    File(PathBuf),
}

/// Live source: details over HTTP, geometry from a URL or a captured file.
pub struct HttpSource {
    client: RenewLondonClient,
    gis: GisInput,
}

impl HttpSource {
    pub fn new(client: RenewLondonClient, gis: GisInput) -> Self {
        Self { client, gis }
    }
}

#[async_trait]
impl IncidentSource for HttpSource {
    async fn geometry(&self) -> Result<GeometryCollection, SourceError> {
        match &self.gis {
            GisInput::Url(url) => self.client.fetch_geometry(url).await,
            GisInput::File(path) => read_geometry(path).await,
        }
    }

    async fn details(&self) -> Result<DisruptionListing, SourceError> {
        self.client.fetch_details().await
    }
}
