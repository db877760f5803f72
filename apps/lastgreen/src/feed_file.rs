//! # JSON Feed Reader
//!
//! A `FeedReader` over a JSON snapshot of a pipeline feed:
//!
//! ```json
//! {"pipelines": [{"name": "osito", "counter": 3, "materials": [], "dependencies": [],
//!   "stages": [{"name": "acceptance", "counter": 1, "result": "Passed",
//!               "completed_at": "2013-02-11T14:19:00Z"}]}]}
//! ```
//!
//! Cursor tokens are `pipeline/counter` of the newest run handed out. A read
//! with a cursor returns only runs newer than that one.

use lastgreen_core::{FeedCursor, FeedPage, FeedReader, FeedRequest, LastGreenError, PipelineRun};
use serde::Deserialize;
use std::path::PathBuf;

/// Pipeline runs per feed page.
pub const FEED_PAGE_SIZE: usize = 10;

/// Maximum feed snapshot size (100 MB).
const MAX_FEED_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    pipelines: Vec<PipelineRun>,
}

/// Reads pipeline runs from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct JsonFeedReader {
    path: PathBuf,
}

impl JsonFeedReader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<FeedDocument, LastGreenError> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| {
            LastGreenError::Feed(format!("Cannot read feed '{}': {}", self.path.display(), e))
        })?;
        if metadata.len() > MAX_FEED_FILE_SIZE {
            return Err(LastGreenError::Feed(format!(
                "Feed size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_FEED_FILE_SIZE
            )));
        }

        let contents = std::fs::read(&self.path).map_err(|e| {
            LastGreenError::Feed(format!("Cannot read feed '{}': {}", self.path.display(), e))
        })?;
        serde_json::from_slice(&contents)
            .map_err(|e| LastGreenError::Feed(format!("Malformed feed: {}", e)))
    }
}

/// Counter named by a cursor token, if it is one of ours for this pipeline.
fn cursor_counter(cursor: &FeedCursor, pipeline: &str) -> Option<u64> {
    let (name, counter) = cursor.as_str().rsplit_once('/')?;
    if name != pipeline {
        return None;
    }
    counter.parse().ok()
}

impl FeedReader for JsonFeedReader {
    fn runs(&self, request: &FeedRequest) -> Result<FeedPage, LastGreenError> {
        let document = self.load()?;

        let seen = match &request.cursor {
            Some(cursor) if !cursor.as_str().is_empty() => {
                let counter = cursor_counter(cursor, &request.pipeline_name);
                if counter.is_none() {
                    tracing::warn!(%cursor, "unrecognised cursor, reading from the newest page");
                }
                counter
            }
            _ => None,
        };

        let mut runs: Vec<PipelineRun> = document
            .pipelines
            .into_iter()
            .filter(|run| run.name == request.pipeline_name)
            .filter(|run| seen.is_none_or(|counter| run.counter > counter))
            .collect();
        runs.sort_by(|a, b| b.counter.cmp(&a.counter));
        runs.truncate(FEED_PAGE_SIZE.saturating_mul(request.page_limit as usize));

        let next_cursor = match runs.first() {
            Some(newest) => FeedCursor::new(format!("{}/{}", newest.name, newest.counter)),
            None => request
                .cursor
                .clone()
                .unwrap_or_else(|| FeedCursor::new("")),
        };

        Ok(FeedPage::newest_first(runs, next_cursor))
    }
}
