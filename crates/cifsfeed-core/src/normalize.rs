//! Record normalisation: merges GIS geometry with disruption details.
//!
//! Only ids present in both sources produce an incident. An id seen in just
//! one of them is dropped from the feed.
//!
//! # Canonical shape
//!
//! - Polyline: `[lon, lat]` input pairs become `"lat lon"`, joined by single spaces
//! - Description: work-type text, or [`DEFAULT_DESCRIPTION`] when empty or absent
//! - Short description: impact text, or [`DEFAULT_SHORT_DESCRIPTION`] when empty or absent
//! - Type: `ROAD_CLOSED` when the closed flag is set, otherwise `CONSTRUCTION`
//! - Start/end: epoch milliseconds floored to whole seconds

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::incident::{DisruptionDetail, GeometryFeature, IncidentType, NormalizedIncident};

pub const DEFAULT_DESCRIPTION: &str = "Undisclosed work details";
pub const DEFAULT_SHORT_DESCRIPTION: &str = "Caution workers present";

/// Project `[lon, lat]` coordinates into a `"lat lon lat lon ..."` polyline.
pub fn polyline(coordinates: &[[f64; 2]]) -> String {
    let mut out = String::new();
    for (i, [lon, lat]) in coordinates.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&coordinate_text(*lat));
        out.push(' ');
        out.push_str(&coordinate_text(*lon));
    }
    out
}

/// Shortest round-trip text for a coordinate, keeping `.0` on integral values.
fn coordinate_text(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Substitute `default` when `text` is absent or empty.
pub fn or_default(text: Option<&str>, default: &str) -> String {
    match text {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => default.to_string(),
    }
}

pub fn incident_type(road_closed: Option<bool>) -> IncidentType {
    if road_closed.unwrap_or(false) {
        IncidentType::RoadClosed
    } else {
        IncidentType::Construction
    }
}

/// Epoch milliseconds to whole epoch seconds.
pub fn epoch_seconds(millis: i64) -> i64 {
    millis.div_euclid(1000)
}

/// Build the canonical incident for a feature and detail sharing an id.
pub fn normalize(feature: &GeometryFeature, detail: &DisruptionDetail) -> NormalizedIncident {
    debug_assert_eq!(feature.id, detail.id);
    NormalizedIncident {
        id: feature.id,
        polyline: polyline(&feature.geometry.coordinates),
        street: feature.properties.street.clone(),
        start: epoch_seconds(feature.properties.start_date),
        end: epoch_seconds(feature.properties.end_date),
        description: or_default(detail.work_types.as_deref(), DEFAULT_DESCRIPTION),
        short_description: or_default(detail.impacts.as_deref(), DEFAULT_SHORT_DESCRIPTION),
        kind: incident_type(detail.road_closed),
    }
}

/// Inner-join both sources on id and normalise each matched pair.
///
/// Output follows the order of `features`. When an id repeats within one
/// source the first occurrence wins.
pub fn merge(features: &[GeometryFeature], details: &[DisruptionDetail]) -> Vec<NormalizedIncident> {
    let mut by_id: HashMap<i64, &DisruptionDetail> = HashMap::with_capacity(details.len());
    for detail in details {
        if by_id.contains_key(&detail.id) {
            warn!(id = detail.id, "duplicate disruption detail, keeping first");
            continue;
        }
        by_id.insert(detail.id, detail);
    }

    let mut seen = HashSet::with_capacity(features.len());
    let mut incidents = Vec::with_capacity(features.len().min(by_id.len()));
    for feature in features {
        if !seen.insert(feature.id) {
            warn!(id = feature.id, "duplicate geometry feature, keeping first");
            continue;
        }
        match by_id.get(&feature.id) {
            Some(detail) => incidents.push(normalize(feature, detail)),
            None => debug!(id = feature.id, "geometry without details, dropped"),
        }
    }

    debug!(
        features = features.len(),
        details = details.len(),
        merged = incidents.len(),
        "merged sources"
    );
    incidents
}
