//! # lastgreen-core
//!
//! Finds the most recent green run of a named stage in a CI pipeline feed,
//! and keeps a per-pipeline cursor so repeated polls only read new runs.
//!
//! ## Flow
//!
//! ```text
//! CursorStore::recall ─► FeedReader::runs ─► StageLocator ─► GreenFilter ─► CursorStore::remember
//! ```
//!
//! The feed reader and the cursor store are injected. This crate ships a
//! redb-backed store and an in-memory store; feed retrieval lives with the
//! caller.
//!
//! ## Architectural Constraints
//!
//! - Synchronous: one feed read and at most one store transaction per poll
//! - No network dependencies, no retries (retry policy belongs to the reader)
//! - No backtracking: if the newest green run fails the filter, the poll
//!   finds nothing new

// =============================================================================
// MODULES
// =============================================================================

pub mod feed;
pub mod fetcher;
pub mod filter;
pub mod formats;
pub mod locator;
pub mod primitives;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CursorRecord, Dependency, FeedCursor, LastGreenError, Material, PipelineId, PipelineRun,
    RecordUpdate, Stage, StageResult, StageRun,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use feed::{FeedOrder, FeedPage, FeedReader, FeedRequest};
pub use fetcher::{FetcherConfig, LastGreenFetcher};
pub use filter::{GreenFilter, Rejection};
pub use locator::StageLocator;
pub use storage::{CursorStore, MemoryCursorStore, RedbCursorStore};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{RecordHeader, record_from_bytes, record_to_bytes};
