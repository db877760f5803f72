//! # redb-backed Cursor Store
//!
//! A disk-backed cursor store using the redb embedded database.
//!
//! redb provides what the fetch loop needs from its store:
//! - ACID transactions (a failed commit leaves the old record in place)
//! - Crash safety (copy-on-write B-trees)
//! - File locks: read-only handles share the file, a writable handle excludes
//!   every other handle
//!
//! The store keeps only the path. Each `recall` opens the file read-only and
//! each `remember` opens it writable, for the length of one transaction, so a
//! slow feed read never holds a lock. An open that finds the file locked by
//! another handle retries until the lock wait runs out.
//!
//! Each `(pipeline, stage)` key maps to one encoded `CursorRecord`
//! (see `formats::record`).

use super::CursorStore;
use crate::formats::{record_from_bytes, record_to_bytes};
use crate::{CursorRecord, LastGreenError, PipelineId, RecordUpdate};
use redb::{
    Database, DatabaseError, ReadOnlyDatabase, ReadTransaction, ReadableDatabase, ReadableTable,
    TableDefinition,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Table for cursor records: `(pipeline, stage)` -> encoded `CursorRecord`
const CURSORS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("cursors");

/// Default time an open waits for another handle to release the file.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(30);

/// Pause between open attempts while the file is locked.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// A disk-backed cursor store using redb.
#[derive(Debug, Clone)]
pub struct RedbCursorStore {
    path: PathBuf,
    lock_wait: Duration,
}

impl RedbCursorStore {
    /// Open or create a cursor store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LastGreenError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            lock_wait: DEFAULT_LOCK_WAIT,
        };

        // Create the table up front so read-only opens never see it missing.
        let db = store.open_writable()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| LastGreenError::Store(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(CURSORS)
                .map_err(|e| LastGreenError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| LastGreenError::Store(e.to_string()))?;

        tracing::debug!(path = %store.path.display(), "opened cursor store");
        Ok(store)
    }

    /// Set how long an open waits for a locked file before failing.
    #[must_use]
    pub fn with_lock_wait(mut self, lock_wait: Duration) -> Self {
        self.lock_wait = lock_wait;
        self
    }

    /// All stored pipeline identities, in key order.
    pub fn pipelines(&self) -> Result<Vec<PipelineId>, LastGreenError> {
        self.read(|read_txn| {
            let table = read_txn
                .open_table(CURSORS)
                .map_err(|e| LastGreenError::Store(e.to_string()))?;

            let mut ids = Vec::new();
            for entry in table
                .iter()
                .map_err(|e| LastGreenError::Store(e.to_string()))?
            {
                let (key, _) = entry.map_err(|e| LastGreenError::Store(e.to_string()))?;
                let (pipeline, stage) = key.value();
                ids.push(PipelineId::new(pipeline, stage));
            }
            Ok(ids)
        })
    }

    /// Compact the database file. Returns whether any space was reclaimed.
    pub fn compact(&self) -> Result<bool, LastGreenError> {
        let mut db = self.open_writable()?;
        db.compact()
            .map_err(|e| LastGreenError::Store(e.to_string()))
    }

    /// Retry `open` while another handle holds a conflicting lock.
    fn wait_for_lock<T>(
        &self,
        mut open: impl FnMut(&Path) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let started = Instant::now();
        let mut waited = false;
        loop {
            match open(&self.path) {
                Err(DatabaseError::DatabaseAlreadyOpen) if started.elapsed() < self.lock_wait => {
                    if !waited {
                        tracing::debug!(
                            path = %self.path.display(),
                            "cursor store locked, waiting"
                        );
                        waited = true;
                    }
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                result => return result,
            }
        }
    }

    fn open_writable(&self) -> Result<Database, LastGreenError> {
        self.wait_for_lock(|path| Database::create(path))
            .map_err(|e| LastGreenError::Store(e.to_string()))
    }

    /// Run `f` inside a read transaction on a shared, read-only handle.
    fn read<T>(
        &self,
        f: impl FnOnce(&ReadTransaction) -> Result<T, LastGreenError>,
    ) -> Result<T, LastGreenError> {
        let db = match self.wait_for_lock(|path| ReadOnlyDatabase::open(path)) {
            Err(DatabaseError::RepairAborted) => {
                // Not shut down cleanly; only a writable open can repair it.
                drop(self.open_writable()?);
                self.wait_for_lock(|path| ReadOnlyDatabase::open(path))
            }
            other => other,
        }
        .map_err(|e| LastGreenError::Store(e.to_string()))?;

        let read_txn = db
            .begin_read()
            .map_err(|e| LastGreenError::Store(e.to_string()))?;
        f(&read_txn)
    }
}

// =============================================================================
// CURSORSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl CursorStore for RedbCursorStore {
    fn recall(&self, id: &PipelineId) -> Result<Option<CursorRecord>, LastGreenError> {
        self.read(|read_txn| {
            let table = read_txn
                .open_table(CURSORS)
                .map_err(|e| LastGreenError::Store(e.to_string()))?;

            let record = match table
                .get((id.pipeline.as_str(), id.stage.as_str()))
                .map_err(|e| LastGreenError::Store(e.to_string()))?
            {
                Some(bytes) => Some(record_from_bytes(bytes.value())?),
                None => None,
            };
            Ok(record)
        })
    }

    fn remember(
        &mut self,
        id: &PipelineId,
        update: RecordUpdate,
    ) -> Result<CursorRecord, LastGreenError> {
        let key = (id.pipeline.as_str(), id.stage.as_str());

        let db = self.open_writable()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| LastGreenError::Store(e.to_string()))?;

        let merged = {
            let mut table = write_txn
                .open_table(CURSORS)
                .map_err(|e| LastGreenError::Store(e.to_string()))?;

            // Read-modify-write within the same transaction.
            let mut record = match table
                .get(key)
                .map_err(|e| LastGreenError::Store(e.to_string()))?
            {
                Some(bytes) => record_from_bytes(bytes.value())?,
                None => CursorRecord::default(),
            };
            record.merge(update);

            let encoded = record_to_bytes(&record)?;
            table
                .insert(key, encoded.as_slice())
                .map_err(|e| LastGreenError::Store(e.to_string()))?;
            record
        };

        write_txn
            .commit()
            .map_err(|e| LastGreenError::Store(e.to_string()))?;

        Ok(merged)
    }
}

// =============================================================================
// TESTS
// =============================================================================
