mod run;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::FixedOffset;
use clap::Parser;
use cifsfeed_core::feed::{SOURCE_NAME, SOURCE_REFERENCE, SOURCE_URL};
use cifsfeed_core::{FeedSource, RunContext, parse_utc_offset};
use cifsfeed_feed::{SCHEMA_LOCATION, Validator};
use cifsfeed_source::{
    DETAILS_URL, FileSource, GisInput, HttpSource, IncidentSource, RenewLondonClient,
};
use cifsfeed_store::DuckStore;

use crate::run::{Pipeline, run_logged};

/// Scrape Renew London road closures into a Waze CIFS incident feed.
#[derive(Parser, Debug)]
#[command(name = "cifsfeed", version)]
struct Cli {
    /// DuckDB file holding per-incident checksums between runs.
    #[arg(long, env = "CIFSFEED_DB", default_value = "renewlondon.duckdb")]
    db: PathBuf,

    /// URL serving the GIS feature collection.
    #[arg(long, env = "CIFSFEED_GIS_URL", required_unless_present = "gis_file")]
    gis_url: Option<String>,

    /// GIS feature collection captured by the browser scrape.
    #[arg(long, env = "CIFSFEED_GIS_FILE", conflicts_with = "gis_url")]
    gis_file: Option<PathBuf>,

    #[arg(long, env = "CIFSFEED_DETAILS_URL", default_value = DETAILS_URL)]
    details_url: String,

    /// Replay a captured details listing instead of calling the API.
    #[arg(long, env = "CIFSFEED_DETAILS_FILE", requires = "gis_file")]
    details_file: Option<PathBuf>,

    /// Rendered feed, written before validation.
    #[arg(long, env = "CIFSFEED_OUTPUT", default_value = "traffic-incidents.xml")]
    output: PathBuf,

    /// Local XSD. Validation is skipped without one.
    #[arg(long, env = "CIFSFEED_SCHEMA")]
    schema: Option<PathBuf>,

    #[arg(long, env = "CIFSFEED_XMLLINT", default_value = "xmllint")]
    xmllint: String,

    /// Public directory the validated feed is copied into.
    #[arg(long, env = "CIFSFEED_PUBLISH_DIR")]
    publish_dir: Option<PathBuf>,

    /// Watchdog for the fetch and reconcile stages.
    #[arg(long, env = "CIFSFEED_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Offset for rendered times, e.g. -05:00.
    #[arg(
        long,
        env = "CIFSFEED_UTC_OFFSET",
        default_value = "+00:00",
        value_parser = parse_offset,
        allow_hyphen_values = true
    )]
    utc_offset: FixedOffset,

    #[arg(long, env = "CIFSFEED_SCHEMA_LOCATION", default_value = SCHEMA_LOCATION)]
    schema_location: String,

    #[arg(long, env = "CIFSFEED_SOURCE_REFERENCE", default_value = SOURCE_REFERENCE)]
    source_reference: String,

    #[arg(long, env = "CIFSFEED_SOURCE_NAME", default_value = SOURCE_NAME)]
    source_name: String,

    #[arg(long, env = "CIFSFEED_SOURCE_URL", default_value = SOURCE_URL)]
    source_url: String,
}

fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    parse_utc_offset(s).map_err(|e| e.to_string())
}

impl Cli {
    fn incident_source(&self) -> anyhow::Result<Box<dyn IncidentSource>> {
        if let (Some(gis), Some(details)) = (&self.gis_file, &self.details_file) {
            return Ok(Box::new(FileSource {
                geometry: gis.clone(),
                details: details.clone(),
            }));
        }
        let gis = match (&self.gis_file, &self.gis_url) {
            (Some(path), _) => GisInput::File(path.clone()),
            (None, Some(url)) => GisInput::Url(url.clone()),
            (None, None) => anyhow::bail!("one of --gis-url or --gis-file is required"),
        };
        Ok(Box::new(HttpSource::new(
            RenewLondonClient::new(self.details_url.clone()),
            gis,
        )))
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline {
            output: self.output.clone(),
            schema_location: self.schema_location.clone(),
            source: FeedSource {
                reference: self.source_reference.clone(),
                name: self.source_name.clone(),
                url: self.source_url.clone(),
            },
            validator: self
                .schema
                .as_ref()
                .map(|schema| Validator::new(self.xmllint.clone(), schema.clone())),
            publish_dir: self.publish_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    tracing::info!("cifsfeed v{}", env!("CARGO_PKG_VERSION"));

    let ctx = RunContext::now(cli.utc_offset).with_timeout(Duration::from_secs(cli.timeout_secs));
    let mut store = DuckStore::open_persistent(&cli.db)
        .with_context(|| format!("opening checksum store {}", cli.db.display()))?;
    let source = cli.incident_source()?;

    run_logged(&*source, &mut store, &cli.pipeline(), &ctx).await?;
    Ok(())
}
