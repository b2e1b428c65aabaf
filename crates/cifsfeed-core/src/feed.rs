//! Final per-incident shape handed to the feed assembler.

use serde::{Deserialize, Serialize};

use crate::incident::{IncidentType, TrackedIncident};
use crate::run::RunContext;
use crate::CoreError;

pub const DIRECTION_BOTH: &str = "BOTH_DIRECTIONS";

pub const SOURCE_REFERENCE: &str = "RenewLondon";
pub const SOURCE_NAME: &str = "Corporation of the City of London";
pub const SOURCE_URL: &str = "https://apps.london.ca/RenewLondon";

/// Publisher attribution, constant per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub reference: String,
    pub name: String,
    pub url: String,
}

impl Default for FeedSource {
    fn default() -> Self {
        Self {
            reference: SOURCE_REFERENCE.into(),
            name: SOURCE_NAME.into(),
            url: SOURCE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub street: String,
    pub polyline: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedIncident {
    pub id: i64,
    pub creationtime: String,
    pub updatetime: String,
    #[serde(rename = "type")]
    pub kind: IncidentType,
    pub description: String,
    pub short_description: String,
    pub location: Location,
    pub starttime: String,
    pub endtime: String,
    pub source: FeedSource,
}

impl FeedIncident {
    pub fn new(
        tracked: &TrackedIncident,
        source: &FeedSource,
        ctx: &RunContext,
    ) -> Result<Self, CoreError> {
        let incident = &tracked.incident;
        Ok(Self {
            id: incident.id,
            creationtime: ctx.iso8601(tracked.created_at)?,
            updatetime: ctx.iso8601(tracked.updated_at)?,
            kind: incident.kind,
            description: incident.description.clone(),
            short_description: incident.short_description.clone(),
            location: Location {
                street: incident.street.clone(),
                polyline: incident.polyline.clone(),
                direction: DIRECTION_BOTH.into(),
            },
            starttime: ctx.iso8601(incident.start)?,
            endtime: ctx.iso8601(incident.end)?,
            source: source.clone(),
        })
    }

    /// Source link for this incident: the deployment url with an `id` query.
    pub fn source_url(&self) -> String {
        format!("{}?id={}", self.source.url, self.id)
    }
}

/// Build feed records for every tracked incident.
pub fn feed_incidents(
    tracked: &[TrackedIncident],
    source: &FeedSource,
    ctx: &RunContext,
) -> Result<Vec<FeedIncident>, CoreError> {
    tracked
        .iter()
        .map(|t| FeedIncident::new(t, source, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::NormalizedIncident;
    use crate::run::utc;

    fn tracked() -> TrackedIncident {
        TrackedIncident {
            incident: NormalizedIncident {
                id: 100,
                polyline: "43.0 -81.3".into(),
                street: "Oxford St".into(),
                start: 1000,
                end: 2000,
                description: "Paving".into(),
                short_description: "Caution workers present".into(),
                kind: IncidentType::RoadClosed,
            },
            created_at: 1_522_850_400,
            updated_at: 1_522_854_000,
        }
    }

    #[test]
    fn feed_incident_fields() {
        let ctx = RunContext::new(1_522_854_000, utc());
        let feed = FeedIncident::new(&tracked(), &FeedSource::default(), &ctx).unwrap();
        assert_eq!(feed.id, 100);
        assert_eq!(feed.kind, IncidentType::RoadClosed);
        assert_eq!(feed.description, "Paving");
        assert_eq!(feed.location.polyline, "43.0 -81.3");
        assert_eq!(feed.location.direction, "BOTH_DIRECTIONS");
        assert_eq!(feed.starttime, "1970-01-01T00:16:40+00:00");
        assert_eq!(feed.endtime, "1970-01-01T00:33:20+00:00");
        assert_eq!(feed.creationtime, "2018-04-04T14:00:00+00:00");
        assert_eq!(feed.updatetime, "2018-04-04T15:00:00+00:00");
    }

    #[test]
    fn source_url_carries_id() {
        let ctx = RunContext::new(0, utc());
        let feed = FeedIncident::new(&tracked(), &FeedSource::default(), &ctx).unwrap();
        assert_eq!(
            feed.source_url(),
            "https://apps.london.ca/RenewLondon?id=100"
        );
    }

    #[test]
    fn out_of_range_timestamp_fails() {
        let mut bad = tracked();
        bad.incident.end = i64::MAX;
        let ctx = RunContext::new(0, utc());
        let result = feed_incidents(&[tracked(), bad], &FeedSource::default(), &ctx);
        assert!(matches!(result, Err(CoreError::TimestampOutOfRange(i64::MAX))));
    }
}
