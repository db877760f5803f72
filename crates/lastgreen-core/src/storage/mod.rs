//! # Storage Module
//!
//! The cursor store seam and its two implementations.
//!
//! - `MemoryCursorStore`: `BTreeMap` in process memory (volatile)
//! - `RedbCursorStore`: redb database on disk (ACID, shared between processes
//!   through redb's file locks, held only for one transaction at a time)
//!
//! Both apply the same field-by-field merge (`CursorRecord::merge`).

mod memory;
mod redb_cursor;

pub use memory::MemoryCursorStore;
pub use redb_cursor::RedbCursorStore;

use crate::{CursorRecord, LastGreenError, PipelineId, RecordUpdate};

/// Durable per-pipeline state.
///
/// `recall` runs as a read-only transaction. `remember` is one exclusive
/// read-modify-write transaction: it either commits the merged record and
/// returns it, or fails and leaves the stored record untouched.
pub trait CursorStore {
    fn recall(&self, id: &PipelineId) -> Result<Option<CursorRecord>, LastGreenError>;

    fn remember(
        &mut self,
        id: &PipelineId,
        update: RecordUpdate,
    ) -> Result<CursorRecord, LastGreenError>;
}

impl<T: CursorStore + ?Sized> CursorStore for &mut T {
    fn recall(&self, id: &PipelineId) -> Result<Option<CursorRecord>, LastGreenError> {
        (**self).recall(id)
    }

    fn remember(
        &mut self,
        id: &PipelineId,
        update: RecordUpdate,
    ) -> Result<CursorRecord, LastGreenError> {
        (**self).remember(id, update)
    }
}
