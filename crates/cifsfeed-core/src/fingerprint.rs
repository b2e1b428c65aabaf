//! Content fingerprint used for cross-run change detection.
//!
//! `fingerprint = hex(SHA256(id || polyline || street || start || end || description || short_description || type))`
//!
//! Fields are rendered to text and concatenated with no separator, in exactly
//! that order. The digest is lowercase hex.

use sha2::{Digest, Sha256};

use crate::incident::NormalizedIncident;

pub fn fingerprint(incident: &NormalizedIncident) -> String {
    let mut hasher = Sha256::new();
    hasher.update(incident.id.to_string().as_bytes());
    hasher.update(incident.polyline.as_bytes());
    hasher.update(incident.street.as_bytes());
    hasher.update(incident.start.to_string().as_bytes());
    hasher.update(incident.end.to_string().as_bytes());
    hasher.update(incident.description.as_bytes());
    hasher.update(incident.short_description.as_bytes());
    hasher.update(incident.kind.as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}
