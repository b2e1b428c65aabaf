//! Incident types shared by the normaliser, reconciler, and feed assembler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// GIS feature collection scraped from the Renew London map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryCollection {
    #[serde(default)]
    pub features: Vec<GeometryFeature>,
}

/// One closure geometry from the GIS layer.
///
/// Immutable once received; a fresh collection is scraped every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryFeature {
    pub id: i64,
    pub geometry: Geometry,
    pub properties: GeometryProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// `[longitude, latitude]` pairs in drawing order.
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeometryProperties {
    pub street: String,
    /// Epoch milliseconds.
    pub start_date: i64,
    /// Epoch milliseconds.
    pub end_date: i64,
}

/// Response body of the disruption details API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisruptionListing {
    #[serde(default)]
    pub ongoing: Vec<DisruptionDetail>,
}

/// Free-text details for one disruption. Shares its id space with [`GeometryFeature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisruptionDetail {
    pub id: i64,
    #[serde(default)]
    pub work_types: Option<String>,
    #[serde(default)]
    pub impacts: Option<String>,
    #[serde(default)]
    pub road_closed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    RoadClosed,
    Construction,
}

impl IncidentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoadClosed => "ROAD_CLOSED",
            Self::Construction => "CONSTRUCTION",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geometry feature merged with its disruption details.
///
/// Timestamps are whole epoch seconds. `polyline` holds space-separated
/// `lat lon` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedIncident {
    pub id: i64,
    pub polyline: String,
    pub street: String,
    pub start: i64,
    pub end: i64,
    pub description: String,
    pub short_description: String,
    #[serde(rename = "type")]
    pub kind: IncidentType,
}

/// Per-id change tracking row persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRecord {
    pub id: i64,
    /// Run timestamp of the last run that saw this id.
    pub accessed_at: i64,
    /// Run timestamp of the first sighting. Never changes afterwards.
    pub created_at: i64,
    /// Run timestamp of the last fingerprint change.
    pub updated_at: i64,
    /// SHA-256 hex digest, see [`crate::fingerprint`].
    pub fingerprint: String,
}

impl ChecksumRecord {
    /// Record for an id sighted for the first time in the run at `run_at`.
    pub fn first_sighting(id: i64, fingerprint: String, run_at: i64) -> Self {
        Self {
            id,
            accessed_at: run_at,
            created_at: run_at,
            updated_at: run_at,
            fingerprint,
        }
    }
}

/// A current-run incident joined with its surviving checksum record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedIncident {
    pub incident: NormalizedIncident,
    pub created_at: i64,
    pub updated_at: i64,
}
