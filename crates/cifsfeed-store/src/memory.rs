//! In-memory checksum store. Used by tests and dry runs.

use cifsfeed_core::ChecksumRecord;

use crate::{ChecksumStore, StoreError};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    rows: Vec<ChecksumRecord>,
    snapshot: Option<Vec<ChecksumRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows in insertion order.
    pub fn records(&self) -> &[ChecksumRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ChecksumStore for MemoryStore {
    fn lookup(&self, id: i64) -> Result<Vec<ChecksumRecord>, StoreError> {
        Ok(self.rows.iter().filter(|r| r.id == id).cloned().collect())
    }

    fn insert(&mut self, record: &ChecksumRecord) -> Result<(), StoreError> {
        self.rows.push(record.clone());
        Ok(())
    }

    fn touch(&mut self, id: i64, accessed_at: i64) -> Result<(), StoreError> {
        for row in self.rows.iter_mut().filter(|r| r.id == id) {
            row.accessed_at = accessed_at;
        }
        Ok(())
    }

    fn update(&mut self, id: i64, run_at: i64, fingerprint: &str) -> Result<(), StoreError> {
        for row in self.rows.iter_mut().filter(|r| r.id == id) {
            row.accessed_at = run_at;
            row.updated_at = run_at;
            row.fingerprint = fingerprint.to_string();
        }
        Ok(())
    }

    fn prune(&mut self, run_at: i64) -> Result<usize, StoreError> {
        let before = self.rows.len();
        self.rows.retain(|r| r.accessed_at == run_at);
        Ok(before - self.rows.len())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionOpen);
        }
        self.snapshot = Some(self.rows.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.snapshot.take().ok_or(StoreError::NoTransaction)?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.rows = self.snapshot.take().ok_or(StoreError::NoTransaction)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, run_at: i64) -> ChecksumRecord {
        ChecksumRecord::first_sighting(id, format!("fp{id}"), run_at)
    }

    #[test]
    fn lookup_returns_all_rows_for_id() {
        let mut store = MemoryStore::new();
        store.insert(&record(1, 10)).unwrap();
        store.insert(&record(2, 10)).unwrap();
        store.insert(&record(1, 20)).unwrap();
        let rows = store.lookup(1).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].created_at, 10);
        assert!(store.lookup(3).unwrap().is_empty());
    }

    #[test]
    fn touch_and_update() {
        let mut store = MemoryStore::new();
        store.insert(&record(1, 10)).unwrap();
        store.touch(1, 20).unwrap();
        let row = &store.lookup(1).unwrap()[0];
        assert_eq!((row.accessed_at, row.updated_at), (20, 10));

        store.update(1, 30, "new").unwrap();
        let row = &store.lookup(1).unwrap()[0];
        assert_eq!((row.accessed_at, row.updated_at), (30, 30));
        assert_eq!(row.created_at, 10);
        assert_eq!(row.fingerprint, "new");
    }

    #[test]
    fn prune_keeps_current_run_only() {
        let mut store = MemoryStore::new();
        store.insert(&record(1, 10)).unwrap();
        store.insert(&record(2, 20)).unwrap();
        store.insert(&record(3, 30)).unwrap();
        assert_eq!(store.prune(20).unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, 2);
    }

    #[test]
    fn rollback_restores_snapshot() {
        let mut store = MemoryStore::new();
        store.insert(&record(1, 10)).unwrap();
        let result: Result<(), StoreError> = store.atomically(|s| {
            s.insert(&record(2, 20))?;
            s.prune(20)?;
            Err(StoreError::Other("abandoned".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, 1);
    }

    #[test]
    fn commit_keeps_changes() {
        let mut store = MemoryStore::new();
        store
            .atomically(|s| s.insert(&record(1, 10)))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(matches!(store.commit(), Err(StoreError::NoTransaction)));
    }

    #[test]
    fn nested_begin_rejected() {
        let mut store = MemoryStore::new();
        store.begin().unwrap();
        assert!(matches!(store.begin(), Err(StoreError::TransactionOpen)));
    }
}
