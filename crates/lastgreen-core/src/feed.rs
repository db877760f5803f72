//! # Feed Reader Seam
//!
//! The core never talks to a CI server itself. A `FeedReader` is handed a
//! bounded request and returns pipeline runs plus the cursor to use next time.
//! Retrieval, feed parsing, timeouts and retries all belong to the reader.

use crate::{FeedCursor, LastGreenError, PipelineRun};

/// Parameters for one feed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub pipeline_name: String,
    pub stage_name: String,
    /// Cursor from the previous poll. `None` means start from the newest page(s).
    pub cursor: Option<FeedCursor>,
    /// Maximum number of feed pages to read.
    pub page_limit: u32,
}

/// Order of `FeedPage::pipeline_runs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedOrder {
    /// Most recent run first (what a pipeline Atom feed yields).
    #[default]
    NewestFirst,
    /// Oldest run first.
    OldestFirst,
}

/// Result of one feed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub pipeline_runs: Vec<PipelineRun>,
    /// Cursor to pass back verbatim on the next read.
    pub next_cursor: FeedCursor,
    pub order: FeedOrder,
}

impl FeedPage {
    /// A page in the default newest-first order.
    #[must_use]
    pub fn newest_first(pipeline_runs: Vec<PipelineRun>, next_cursor: FeedCursor) -> Self {
        Self {
            pipeline_runs,
            next_cursor,
            order: FeedOrder::NewestFirst,
        }
    }

    /// A page whose runs are listed oldest first.
    #[must_use]
    pub fn oldest_first(pipeline_runs: Vec<PipelineRun>, next_cursor: FeedCursor) -> Self {
        Self {
            pipeline_runs,
            next_cursor,
            order: FeedOrder::OldestFirst,
        }
    }
}

/// Source of pipeline runs.
///
/// Implementations are injected into `LastGreenFetcher`; tests substitute a
/// canned reader.
pub trait FeedReader {
    fn runs(&self, request: &FeedRequest) -> Result<FeedPage, LastGreenError>;
}

impl<T: FeedReader + ?Sized> FeedReader for &T {
    fn runs(&self, request: &FeedRequest) -> Result<FeedPage, LastGreenError> {
        (**self).runs(request)
    }
}

impl<T: FeedReader + ?Sized> FeedReader for Box<T> {
    fn runs(&self, request: &FeedRequest) -> Result<FeedPage, LastGreenError> {
        (**self).runs(request)
    }
}
