//! # Last Green Build Fetcher
//!
//! Orchestrates one poll:
//!
//! 1. recall the stored record for the pipeline identity
//! 2. read a bounded window of the feed from the recalled cursor
//! 3. locate the newest passing run of the stage
//! 4. filter it
//! 5. remember the feed's new cursor, plus the candidate if admitted,
//!    in a single store transaction
//! 6. return whatever green build the store now holds
//!
//! A poll that finds nothing new still advances the cursor and still returns
//! the previously remembered green build. A failed feed read writes nothing.

use crate::feed::{FeedReader, FeedRequest};
use crate::filter::GreenFilter;
use crate::locator::StageLocator;
use crate::primitives::{DEFAULT_PAGE_LIMIT, clamp_page_limit};
use crate::storage::CursorStore;
use crate::{LastGreenError, PipelineId, RecordUpdate, StageRun};
use std::time::Instant;

/// Static configuration for a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    pub pipeline_name: String,
    pub stage_name: String,
    /// Feed pages per poll, always within `1..=MAX_PAGE_LIMIT`.
    page_limit: u32,
}

impl FetcherConfig {
    #[must_use]
    pub fn new(pipeline_name: impl Into<String>, stage_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            stage_name: stage_name.into(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Set the page limit; out-of-range values are clamped.
    #[must_use]
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = clamp_page_limit(page_limit);
        self
    }

    #[must_use]
    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    #[must_use]
    pub fn pipeline_id(&self) -> PipelineId {
        PipelineId::new(self.pipeline_name.clone(), self.stage_name.clone())
    }
}

/// Polls a feed for the last green run of one pipeline stage.
#[derive(Debug)]
pub struct LastGreenFetcher<F, S> {
    config: FetcherConfig,
    locator: StageLocator,
    feed: F,
    store: S,
}

impl<F: FeedReader, S: CursorStore> LastGreenFetcher<F, S> {
    #[must_use]
    pub fn new(config: FetcherConfig, feed: F, store: S) -> Self {
        let locator = StageLocator::new(config.stage_name.clone());
        Self {
            config,
            locator,
            feed,
            store,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the store, e.g. to inspect it after polling.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Poll once with no constraints.
    pub fn fetch_latest(&mut self) -> Result<Option<StageRun>, LastGreenError> {
        self.fetch(&GreenFilter::default())
    }

    /// Poll once and return the last known green build.
    pub fn fetch(&mut self, filter: &GreenFilter) -> Result<Option<StageRun>, LastGreenError> {
        let id = self.config.pipeline_id();
        let cursor = self
            .store
            .recall(&id)?
            .and_then(|record| record.latest_feed_cursor);

        if cursor.is_none() {
            tracing::info!(
                "Retrieving the feed for {} for the first time. This could take a while.",
                id
            );
        }

        let request = FeedRequest {
            pipeline_name: self.config.pipeline_name.clone(),
            stage_name: self.config.stage_name.clone(),
            cursor,
            page_limit: self.config.page_limit,
        };

        let started = Instant::now();
        let page = self.feed.runs(&request)?;
        tracing::debug!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            runs = page.pipeline_runs.len(),
            "fetched pipeline runs"
        );

        let mut update = RecordUpdate::new().with_cursor(page.next_cursor.clone());

        match self.locator.locate(&page.pipeline_runs, page.order) {
            Some(candidate) => match filter.evaluate(&candidate) {
                Ok(()) => {
                    tracing::info!(instance = %candidate.instance(), "found green build");
                    update = update.with_green_build(candidate);
                }
                Err(rejection) => {
                    tracing::info!(
                        instance = %candidate.instance(),
                        reason = %rejection,
                        "newest green build rejected by filter"
                    );
                }
            },
            None => {
                tracing::debug!(stage = %self.config.stage_name, "no passing stage in window");
            }
        }

        let record = self.store.remember(&id, update)?;
        tracing::debug!(cursor = %page.next_cursor, "checked for last green run");

        Ok(record.last_green_build)
    }

    /// The remembered green build, without reading the feed.
    pub fn last_known(&self) -> Result<Option<StageRun>, LastGreenError> {
        Ok(self
            .store
            .recall(&self.config.pipeline_id())?
            .and_then(|record| record.last_green_build))
    }
}

// =============================================================================
// TESTS
// =============================================================================
