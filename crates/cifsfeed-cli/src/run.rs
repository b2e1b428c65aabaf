//! Top-level run controller: fetch, reconcile, render, validate, publish.
//!
//! Every stage returns a typed error. Any failure ends the run; nothing is
//! retried and no partial feed is published. The watchdog deadline in the
//! [`RunContext`] bounds the fetch and reconcile stages.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use cifsfeed_core::{CoreError, FeedSource, RunContext, feed_incidents, merge};
use cifsfeed_feed::{FeedError, Validator, publish, render, write_feed};
use cifsfeed_source::{IncidentSource, SourceError};
use cifsfeed_store::{ChecksumStore, Reconciliation, StoreError, reconcile};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Geometry,
    Details,
    Reconcile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Geometry => "GIS scrape",
            Self::Details => "disruption details",
            Self::Reconcile => "reconciliation",
        })
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{stage} unavailable: {source}")]
    SourceUnavailable {
        stage: Stage,
        #[source]
        source: SourceError,
    },

    #[error("{stage} payload did not parse: {source}")]
    ParseFailure {
        stage: Stage,
        #[source]
        source: SourceError,
    },

    #[error("final join returned zero incidents")]
    EmptyResult,

    #[error("feed did not render: {0}")]
    RenderFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("feed did not validate: {0}")]
    ValidationFailure(#[source] FeedError),

    #[error("feed did not publish: {0}")]
    PublishFailure(#[source] FeedError),

    #[error("run timed out during {stage}")]
    TimedOut { stage: Stage },

    #[error("checksum store: {0}")]
    Store(#[from] StoreError),
}

impl RunError {
    fn from_source(stage: Stage, err: SourceError) -> Self {
        if err.is_parse() {
            Self::ParseFailure { stage, source: err }
        } else {
            Self::SourceUnavailable { stage, source: err }
        }
    }
}

impl From<CoreError> for RunError {
    fn from(err: CoreError) -> Self {
        Self::RenderFailure(Box::new(err))
    }
}

/// Deployment settings for the output side of a run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Where the rendered feed is written before validation.
    pub output: PathBuf,
    pub schema_location: String,
    pub source: FeedSource,
    /// Skipped when `None`.
    pub validator: Option<Validator>,
    /// Skipped when `None`.
    pub publish_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub reconciliation: Reconciliation,
    pub published: Option<PathBuf>,
}

impl RunSummary {
    pub fn records(&self) -> usize {
        self.reconciliation.tracked.len()
    }
}

/// Await `fut`, failing with [`RunError::TimedOut`] once the run deadline passes.
async fn bounded<T, F>(ctx: &RunContext, stage: Stage, fut: F) -> Result<T, RunError>
where
    F: Future<Output = Result<T, RunError>>,
{
    match ctx.remaining() {
        None => fut.await,
        Some(left) if left.is_zero() => Err(RunError::TimedOut { stage }),
        Some(left) => tokio::time::timeout(left, fut)
            .await
            .map_err(|_| RunError::TimedOut { stage })?,
    }
}

/// Execute one complete run.
pub async fn run<S, St>(
    source: &S,
    store: &mut St,
    pipeline: &Pipeline,
    ctx: &RunContext,
) -> Result<RunSummary, RunError>
where
    S: IncidentSource + ?Sized,
    St: ChecksumStore,
{
    let geometry = bounded(ctx, Stage::Geometry, async {
        source
            .geometry()
            .await
            .map_err(|e| RunError::from_source(Stage::Geometry, e))
    })
    .await?;

    let details = bounded(ctx, Stage::Details, async {
        source
            .details()
            .await
            .map_err(|e| RunError::from_source(Stage::Details, e))
    })
    .await?;

    if ctx.is_expired() {
        return Err(RunError::TimedOut {
            stage: Stage::Reconcile,
        });
    }
    let incidents = merge(&geometry.features, &details.ongoing);
    let reconciliation = store.atomically(|s| {
        let outcome = reconcile(s, incidents, ctx)?;
        if ctx.is_expired() {
            return Err(RunError::TimedOut {
                stage: Stage::Reconcile,
            });
        }
        Ok(outcome)
    })?;
    if reconciliation.is_empty() {
        return Err(RunError::EmptyResult);
    }

    let feed = feed_incidents(&reconciliation.tracked, &pipeline.source, ctx)?;
    let document = render(&feed, &ctx.iso8601(ctx.run_at)?, &pipeline.schema_location);
    write_feed(&pipeline.output, &document).map_err(|e| RunError::RenderFailure(Box::new(e)))?;

    match &pipeline.validator {
        Some(validator) => validator
            .validate(&pipeline.output)
            .await
            .map_err(RunError::ValidationFailure)?,
        None => debug!("no schema configured, validation skipped"),
    }

    let published = match &pipeline.publish_dir {
        Some(dir) => Some(publish(&pipeline.output, dir).map_err(RunError::PublishFailure)?),
        None => {
            debug!("no publish directory configured, publish skipped");
            None
        }
    };

    Ok(RunSummary {
        reconciliation,
        published,
    })
}

/// Run once and log the outcome.
pub async fn run_logged<S, St>(
    source: &S,
    store: &mut St,
    pipeline: &Pipeline,
    ctx: &RunContext,
) -> Result<RunSummary, RunError>
where
    S: IncidentSource + ?Sized,
    St: ChecksumStore,
{
    match run(source, store, pipeline, ctx).await {
        Ok(summary) => {
            info!(
                records = summary.records(),
                published = summary.published.is_some(),
                "updated CIFS feed generated"
            );
            Ok(summary)
        }
        Err(err) => {
            error!(error = %err, "run failed");
            Err(err)
        }
    }
}
