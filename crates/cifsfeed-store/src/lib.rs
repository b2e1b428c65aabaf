//! Storage layer: per-id checksum records that carry incident lifecycle across runs.

mod error;
pub use error::StoreError;

mod memory;
pub use memory::MemoryStore;

pub mod reconcile;
pub use reconcile::{Reconciliation, reconcile};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;

use cifsfeed_core::ChecksumRecord;
use tracing::warn;

/// Persistence for [`ChecksumRecord`]s, keyed by incident id.
///
/// Implementations are used by one run at a time. All writes of a run go
/// through [`atomically`](Self::atomically) so a failed or abandoned run
/// leaves the previous state untouched.
pub trait ChecksumStore {
    /// Every record stored for `id`, in insertion order.
    ///
    /// More than one row means the store is inconsistent; callers treat the
    /// first row as authoritative.
    fn lookup(&self, id: i64) -> Result<Vec<ChecksumRecord>, StoreError>;

    fn insert(&mut self, record: &ChecksumRecord) -> Result<(), StoreError>;

    /// Advance the access timestamp of `id`.
    fn touch(&mut self, id: i64, accessed_at: i64) -> Result<(), StoreError>;

    /// Advance both access and update timestamps of `id` and replace its fingerprint.
    fn update(&mut self, id: i64, run_at: i64, fingerprint: &str) -> Result<(), StoreError>;

    /// Delete every record not accessed at `run_at`. Returns the number deleted.
    fn prune(&mut self, run_at: i64) -> Result<usize, StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Run `f` inside one transaction: commit on `Ok`, roll back on `Err`.
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<StoreError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
