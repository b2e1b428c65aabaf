//! CIFS XML document rendering.
//!
//! The `<description>` element carries the short description. The long
//! work-type text fails the consumer's schema check, so it is not emitted.

use std::fmt::Write as _;
use std::path::Path;

use cifsfeed_core::FeedIncident;
use tracing::info;

use crate::FeedError;

/// Schema reference placed on the root element.
pub const SCHEMA_LOCATION: &str = "https://www.gstatic.com/road-incidents/incidents_feed.xsd";

/// Render the full feed document.
///
/// `timestamp` is the run time, already in ISO-8601.
pub fn render(incidents: &[FeedIncident], timestamp: &str, schema_location: &str) -> String {
    let mut out = String::with_capacity(256 + incidents.len() * 640);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<incidents xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xsi:noNamespaceSchemaLocation=\"{}\" timestamp=\"{}\">",
        escape(schema_location),
        escape(timestamp),
    );
    for incident in incidents {
        render_incident(&mut out, incident);
    }
    out.push_str("</incidents>\n");
    out
}

fn render_incident(out: &mut String, incident: &FeedIncident) {
    let _ = writeln!(out, "  <incident id=\"{}\">", incident.id);
    element(out, 4, "creationtime", &incident.creationtime);
    element(out, 4, "updatetime", &incident.updatetime);
    out.push_str("    <source>\n");
    element(out, 6, "reference", &incident.source.reference);
    element(out, 6, "name", &incident.source.name);
    element(out, 6, "url", &incident.source_url());
    out.push_str("    </source>\n");
    element(out, 4, "type", incident.kind.as_str());
    element(out, 4, "description", &incident.short_description);
    out.push_str("    <location>\n");
    element(out, 6, "street", &incident.location.street);
    element(out, 6, "polyline", &incident.location.polyline);
    element(out, 6, "direction", &incident.location.direction);
    out.push_str("    </location>\n");
    element(out, 4, "starttime", &incident.starttime);
    element(out, 4, "endtime", &incident.endtime);
    out.push_str("  </incident>\n");
}

fn element(out: &mut String, indent: usize, name: &str, text: &str) {
    let _ = writeln!(out, "{:indent$}<{name}>{}</{name}>", "", escape(text));
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write a rendered document to `path`, replacing any previous feed.
pub fn write_feed(path: &Path, document: &str) -> Result<(), FeedError> {
    std::fs::write(path, document).map_err(|source| FeedError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = document.len(), "wrote feed document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cifsfeed_core::{FeedSource, IncidentType, Location};

    fn oxford() -> FeedIncident {
        FeedIncident {
            id: 100,
            creationtime: "2018-04-04T14:00:00+00:00".into(),
            updatetime: "2018-04-04T15:00:00+00:00".into(),
            kind: IncidentType::RoadClosed,
            description: "Paving".into(),
            short_description: "Caution workers present".into(),
            location: Location {
                street: "Oxford St".into(),
                polyline: "43.0 -81.3".into(),
                direction: "BOTH_DIRECTIONS".into(),
            },
            starttime: "1970-01-01T00:16:40+00:00".into(),
            endtime: "1970-01-01T00:33:20+00:00".into(),
            source: FeedSource::default(),
        }
    }

    #[test]
    fn full_document() {
        let doc = render(&[oxford()], "2018-04-04T15:00:00+00:00", SCHEMA_LOCATION);
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<incidents xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:noNamespaceSchemaLocation=\"https://www.gstatic.com/road-incidents/incidents_feed.xsd\" timestamp=\"2018-04-04T15:00:00+00:00\">
  <incident id=\"100\">
    <creationtime>2018-04-04T14:00:00+00:00</creationtime>
    <updatetime>2018-04-04T15:00:00+00:00</updatetime>
    <source>
      <reference>RenewLondon</reference>
      <name>Corporation of the City of London</name>
      <url>https://apps.london.ca/RenewLondon?id=100</url>
    </source>
    <type>ROAD_CLOSED</type>
    <description>Caution workers present</description>
    <location>
      <street>Oxford St</street>
      <polyline>43.0 -81.3</polyline>
      <direction>BOTH_DIRECTIONS</direction>
    </location>
    <starttime>1970-01-01T00:16:40+00:00</starttime>
    <endtime>1970-01-01T00:33:20+00:00</endtime>
  </incident>
</incidents>
";
        assert_eq!(doc, expected);
    }

    #[test]
    fn description_uses_short_description() {
        let doc = render(&[oxford()], "t", SCHEMA_LOCATION);
        assert!(doc.contains("<description>Caution workers present</description>"));
        assert!(!doc.contains("Paving"));
    }

    #[test]
    fn text_is_escaped() {
        let mut incident = oxford();
        incident.location.street = "Adelaide & <Queens>".into();
        let doc = render(&[incident], "t", SCHEMA_LOCATION);
        assert!(doc.contains("<street>Adelaide &amp; &lt;Queens&gt;</street>"));
    }

    #[test]
    fn empty_feed_has_header_and_footer() {
        let doc = render(&[], "t", SCHEMA_LOCATION);
        assert!(doc.starts_with("<?xml"));
        assert!(doc.ends_with("</incidents>\n"));
        assert!(!doc.contains("<incident "));
    }

    #[test]
    fn write_feed_to_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("traffic-incidents.xml");
        write_feed(&path, "<incidents/>\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<incidents/>\n");
    }

    #[test]
    fn write_feed_missing_dir_errors() {
        let result = write_feed(Path::new("/nonexistent/dir/feed.xml"), "x");
        assert!(matches!(result, Err(FeedError::Write { .. })));
    }
}
