//! DuckDB-backed checksum store.

use std::path::Path;

use cifsfeed_core::ChecksumRecord;
use duckdb::{Connection, params};
use tracing::info;

use crate::{ChecksumStore, StoreError};

const CREATE_CHECKSUM: &str = "CREATE TABLE IF NOT EXISTS checksum (
    id BIGINT NOT NULL,
    accesstime BIGINT NOT NULL,
    creationtime BIGINT NOT NULL,
    updatetime BIGINT NOT NULL,
    sha256 VARCHAR NOT NULL
)";

/// DuckDB store for the `checksum` table.
///
/// The table has no key constraint on `id`: a duplicated id is reported by the
/// reconciler rather than rejected here.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across runs.
pub struct DuckStore {
    conn: Connection,
    in_transaction: bool,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), records = store.count()?, "opened checksum store");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_CHECKSUM)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Number of rows in the `checksum` table.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT count(*)::BIGINT FROM checksum", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// All rows in insertion order.
    pub fn records(&self) -> Result<Vec<ChecksumRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, accesstime, creationtime, updatetime, sha256
             FROM checksum ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn exec(&self, sql: &str) -> Result<(), StoreError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

fn row_to_record(row: &duckdb::Row<'_>) -> duckdb::Result<ChecksumRecord> {
    Ok(ChecksumRecord {
        id: row.get(0)?,
        accessed_at: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
        fingerprint: row.get(4)?,
    })
}

impl ChecksumStore for DuckStore {
    fn lookup(&self, id: i64) -> Result<Vec<ChecksumRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, accesstime, creationtime, updatetime, sha256
             FROM checksum WHERE id = ? ORDER BY rowid",
        )?;
        let rows = stmt.query_map([id], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert(&mut self, record: &ChecksumRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO checksum VALUES (?, ?, ?, ?, ?)",
            params![
                record.id,
                record.accessed_at,
                record.created_at,
                record.updated_at,
                record.fingerprint
            ],
        )?;
        Ok(())
    }

    fn touch(&mut self, id: i64, accessed_at: i64) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE checksum SET accesstime = ? WHERE id = ?",
            params![accessed_at, id],
        )?;
        Ok(())
    }

    fn update(&mut self, id: i64, run_at: i64, fingerprint: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE checksum SET accesstime = ?, updatetime = ?, sha256 = ? WHERE id = ?",
            params![run_at, run_at, fingerprint, id],
        )?;
        Ok(())
    }

    fn prune(&mut self, run_at: i64) -> Result<usize, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM checksum WHERE accesstime <> ?", [run_at])?;
        Ok(deleted)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            return Err(StoreError::TransactionOpen);
        }
        self.exec("BEGIN TRANSACTION")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.in_transaction = false;
        self.exec("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.in_transaction = false;
        self.exec("ROLLBACK")
    }
}
