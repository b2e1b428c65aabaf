//! Per-run context threaded through every stage.

use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::CoreError;

/// Timestamp, output offset, and watchdog deadline for a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Whole epoch seconds. Every record touched in this run carries it.
    pub run_at: i64,
    /// Offset used when rendering ISO-8601 times.
    pub offset: FixedOffset,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new(run_at: i64, offset: FixedOffset) -> Self {
        Self {
            run_at,
            offset,
            deadline: None,
        }
    }

    /// Context stamped with the current wall-clock second.
    pub fn now(offset: FixedOffset) -> Self {
        Self::new(Utc::now().timestamp(), offset)
    }

    /// Bound the run to `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Time left before the deadline. `None` when the run is unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// Render an epoch-seconds value in this run's offset.
    pub fn iso8601(&self, ts: i64) -> Result<String, CoreError> {
        iso8601(ts, self.offset)
    }
}

/// `YYYY-MM-DDTHH:MM:SS±HH:MM` for an epoch-seconds value.
pub fn iso8601(ts: i64, offset: FixedOffset) -> Result<String, CoreError> {
    let utc = DateTime::from_timestamp(ts, 0).ok_or(CoreError::TimestampOutOfRange(ts))?;
    Ok(utc
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string())
}

/// Parse `+HH:MM`, `-HH:MM`, or `Z` into a fixed offset.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, CoreError> {
    let s = s.trim();
    let invalid = || CoreError::InvalidOffset(s.to_string());
    if s.eq_ignore_ascii_case("z") {
        return Ok(utc());
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

pub fn utc() -> FixedOffset {
    Utc.fix()
}
