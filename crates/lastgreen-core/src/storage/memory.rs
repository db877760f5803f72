//! In-memory cursor store.

use super::CursorStore;
use crate::{CursorRecord, LastGreenError, PipelineId, RecordUpdate};
use std::collections::BTreeMap;

/// Volatile cursor store. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursorStore {
    records: BTreeMap<PipelineId, CursorRecord>,
}

impl MemoryCursorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored identities in deterministic order.
    #[must_use]
    pub fn pipelines(&self) -> Vec<PipelineId> {
        self.records.keys().cloned().collect()
    }
}

impl CursorStore for MemoryCursorStore {
    fn recall(&self, id: &PipelineId) -> Result<Option<CursorRecord>, LastGreenError> {
        Ok(self.records.get(id).cloned())
    }

    fn remember(
        &mut self,
        id: &PipelineId,
        update: RecordUpdate,
    ) -> Result<CursorRecord, LastGreenError> {
        let record = self.records.entry(id.clone()).or_default();
        record.merge(update);
        Ok(record.clone())
    }
}
