//! Incident reconciliation: decides whether each incident is new, unchanged, or updated.
//!
//! For every current-run incident:
//!
//! 1. Fingerprint it.
//! 2. Known id: advance the access time; on a fingerprint change also advance
//!    the update time and store the new fingerprint. Creation time never moves.
//! 3. Unknown id: insert with access = creation = update = run timestamp.
//!
//! Then every record not accessed in this run is pruned, and the survivors are
//! joined back onto the incidents to carry their lifecycle timestamps.

use cifsfeed_core::{
    ChecksumRecord, NormalizedIncident, RunContext, TrackedIncident, fingerprint,
};
use tracing::{debug, info, warn};

use crate::{ChecksumStore, StoreError};

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub tracked: Vec<TrackedIncident>,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub pruned: usize,
}

impl Reconciliation {
    /// True when the run produced nothing to publish.
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }
}

/// Reconcile the current run's incidents against the store.
///
/// Callers wrap this in [`ChecksumStore::atomically`] so the pass commits as a
/// whole. An empty `incidents` set still prunes every stored record.
pub fn reconcile<S>(
    store: &mut S,
    incidents: Vec<NormalizedIncident>,
    ctx: &RunContext,
) -> Result<Reconciliation, StoreError>
where
    S: ChecksumStore + ?Sized,
{
    let run_at = ctx.run_at;
    let mut outcome = Reconciliation::default();

    for incident in &incidents {
        let fp = fingerprint(incident);
        let existing = store.lookup(incident.id)?;
        match existing.first() {
            Some(stored) => {
                if existing.len() > 1 {
                    warn!(
                        id = incident.id,
                        rows = existing.len(),
                        "multiple checksum records for id, using first"
                    );
                }
                if stored.fingerprint != fp {
                    store.update(incident.id, run_at, &fp)?;
                    outcome.updated += 1;
                    debug!(id = incident.id, "incident changed");
                } else {
                    store.touch(incident.id, run_at)?;
                    outcome.unchanged += 1;
                }
            }
            None => {
                store.insert(&ChecksumRecord::first_sighting(incident.id, fp, run_at))?;
                outcome.inserted += 1;
                debug!(id = incident.id, "new incident");
            }
        }
    }

    outcome.pruned = store.prune(run_at)?;

    for incident in incidents {
        let rows = store.lookup(incident.id)?;
        let Some(record) = rows.into_iter().next() else {
            warn!(id = incident.id, "checksum record missing after reconcile, dropped");
            continue;
        };
        outcome.tracked.push(TrackedIncident {
            incident,
            created_at: record.created_at,
            updated_at: record.updated_at,
        });
    }

    info!(
        run_at,
        records = outcome.tracked.len(),
        inserted = outcome.inserted,
        updated = outcome.updated,
        unchanged = outcome.unchanged,
        pruned = outcome.pruned,
        "reconciled incidents"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use cifsfeed_core::IncidentType;
    use cifsfeed_core::run::utc;

    const T1: i64 = 1_700_000_000;
    const T2: i64 = T1 + 300;
    const T3: i64 = T2 + 300;

    fn incident(id: i64, street: &str) -> NormalizedIncident {
        NormalizedIncident {
            id,
            polyline: "42.98 -81.25 42.99 -81.24".into(),
            street: street.into(),
            start: 1000,
            end: 2000,
            description: "Paving".into(),
            short_description: "Caution workers present".into(),
            kind: IncidentType::Construction,
        }
    }

    fn run<S: ChecksumStore>(
        store: &mut S,
        incidents: Vec<NormalizedIncident>,
        run_at: i64,
    ) -> Reconciliation {
        let ctx = RunContext::new(run_at, utc());
        store
            .atomically(|s| reconcile(s, incidents, &ctx))
            .unwrap()
    }

    fn lifecycle(store: &impl ChecksumStore, id: i64) -> (i64, i64, i64) {
        let rows = store.lookup(id).unwrap();
        let r = &rows[0];
        (r.created_at, r.updated_at, r.accessed_at)
    }

    fn check_lifecycle<S: ChecksumStore>(store: &mut S) {
        let first = run(store, vec![incident(1, "Oxford St")], T1);
        assert_eq!(first.inserted, 1);
        assert_eq!(lifecycle(&*store, 1), (T1, T1, T1));

        let second = run(store, vec![incident(1, "Oxford St")], T2);
        assert_eq!(second.unchanged, 1);
        assert_eq!(lifecycle(&*store, 1), (T1, T1, T2));
        assert_eq!(second.tracked[0].updated_at, T1);

        let third = run(store, vec![incident(1, "Oxford St W")], T3);
        assert_eq!(third.updated, 1);
        assert_eq!(lifecycle(&*store, 1), (T1, T3, T3));
        assert_eq!(third.tracked[0].created_at, T1);
        assert_eq!(third.tracked[0].updated_at, T3);
        assert_eq!(
            store.lookup(1).unwrap()[0].fingerprint,
            fingerprint(&incident(1, "Oxford St W"))
        );
    }

    #[test]
    fn lifecycle_new_unchanged_updated() {
        check_lifecycle(&mut MemoryStore::new());
    }

    #[test]
    fn disappeared_id_is_pruned() {
        let mut store = MemoryStore::new();
        run(&mut store, vec![incident(1, "A"), incident(2, "B")], T1);

        let second = run(&mut store, vec![incident(2, "B")], T2);
        assert_eq!(second.pruned, 1);
        assert!(store.lookup(1).unwrap().is_empty());
        let ids: Vec<i64> = second.tracked.iter().map(|t| t.incident.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn reappearing_id_is_new_again() {
        let mut store = MemoryStore::new();
        run(&mut store, vec![incident(1, "A")], T1);
        run(&mut store, vec![], T2);
        let third = run(&mut store, vec![incident(1, "A")], T3);
        assert_eq!(third.inserted, 1);
        assert_eq!(lifecycle(&store, 1), (T3, T3, T3));
    }

    #[test]
    fn empty_run_prunes_everything() {
        let mut store = MemoryStore::new();
        run(&mut store, vec![incident(1, "A"), incident(2, "B")], T1);

        let outcome = run(&mut store, vec![], T2);
        assert!(outcome.is_empty());
        assert_eq!(outcome.pruned, 2);
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_records_use_first() {
        let mut store = MemoryStore::new();
        let current = incident(5, "Dundas St");
        store
            .insert(&ChecksumRecord::first_sighting(5, fingerprint(&current), T1))
            .unwrap();
        store
            .insert(&ChecksumRecord {
                id: 5,
                accessed_at: T1,
                created_at: T2,
                updated_at: T2,
                fingerprint: "stale".into(),
            })
            .unwrap();

        let outcome = run(&mut store, vec![current], T3);
        assert_eq!(outcome.unchanged, 1);
        assert_eq!(outcome.tracked.len(), 1);
        assert_eq!(outcome.tracked[0].created_at, T1);
        assert_eq!(outcome.tracked[0].updated_at, T1);
    }

    #[test]
    fn failed_pass_rolls_back() {
        let mut store = MemoryStore::new();
        run(&mut store, vec![incident(1, "A")], T1);

        let ctx = RunContext::new(T2, utc());
        let result: Result<Reconciliation, StoreError> = store.atomically(|s| {
            reconcile(s, vec![incident(2, "B")], &ctx)?;
            Err(StoreError::Other("deadline exceeded".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(lifecycle(&store, 1), (T1, T1, T1));
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn lifecycle_on_duckdb() {
        check_lifecycle(&mut crate::DuckStore::open().unwrap());
    }
}
