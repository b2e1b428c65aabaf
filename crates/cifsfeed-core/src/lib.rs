//! Core incident types, normalisation, and fingerprinting for the Renew London CIFS feed.

pub mod feed;
pub mod fingerprint;
pub mod incident;
pub mod normalize;
pub mod run;

use thiserror::Error;

pub use feed::{FeedIncident, FeedSource, Location, feed_incidents};
pub use fingerprint::fingerprint;
pub use incident::{
    ChecksumRecord, DisruptionDetail, DisruptionListing, GeometryCollection, GeometryFeature,
    IncidentType, NormalizedIncident, TrackedIncident,
};
pub use normalize::{DEFAULT_DESCRIPTION, DEFAULT_SHORT_DESCRIPTION, merge};
pub use run::{RunContext, iso8601, parse_utc_offset};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("timestamp {0} is outside the representable date range")]
    TimestampOutOfRange(i64),

    #[error("invalid UTC offset {0:?}, expected +HH:MM or -HH:MM")]
    InvalidOffset(String),
}
