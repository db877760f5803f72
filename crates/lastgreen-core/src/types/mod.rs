//! # Core Type Definitions
//!
//! This module contains the data model shared by every other module:
//! - Feed-side shapes (`PipelineRun`, `Stage`, `StageResult`, `Material`, `Dependency`)
//! - The captured green-build snapshot (`StageRun`)
//! - Cursor store identity and state (`PipelineId`, `FeedCursor`, `CursorRecord`, `RecordUpdate`)
//! - Error types (`LastGreenError`)
//!
//! ## Capture Guarantees
//!
//! A `StageRun` owns copies of everything it reports. Feed responses are
//! transient; once a stage has been captured the pipeline run it came from
//! may be dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::primitives::MATERIAL_NAME_SUFFIX;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque position token handed out by a feed reader.
///
/// The core never inspects it. It is stored and passed back verbatim on the
/// next poll.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedCursor(pub String);

impl FeedCursor {
    /// Create a cursor from any token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity under which a cursor record is stored.
///
/// A record tracks one stage of one pipeline, so two stages of the same
/// pipeline never share a cursor or a green build.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipelineId {
    pub pipeline: String,
    pub stage: String,
}

impl PipelineId {
    #[must_use]
    pub fn new(pipeline: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            stage: stage.into(),
        }
    }

}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pipeline, self.stage)
    }
}

// =============================================================================
// FEED-SIDE SHAPES
// =============================================================================

/// Outcome of one stage execution as reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageResult {
    Passed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl StageResult {
    /// Only passed stages count as green.
    #[must_use]
    pub const fn is_green(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for StageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// A source repository feeding a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Repository URL.
    pub repository_url: String,
    /// Most recent commit revision fetched for this material.
    pub revision: String,
}

impl Material {
    #[must_use]
    pub fn new(repository_url: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
            revision: revision.into(),
        }
    }

    /// Material name used by filters: last path segment of the URL plus `-git`.
    ///
    /// `https://github.com/acme/osito/` is named `osito-git`.
    #[must_use]
    pub fn name(&self) -> String {
        let segment = self
            .repository_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("");
        format!("{}{}", segment, MATERIAL_NAME_SUFFIX)
    }
}

/// An upstream pipeline run this pipeline run depended on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub pipeline_name: String,
    pub stage_name: String,
    /// Fully-qualified upstream instance, e.g. `upstream/2/ready/3`.
    pub identifier: String,
}

impl Dependency {
    #[must_use]
    pub fn new(
        pipeline_name: impl Into<String>,
        stage_name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            stage_name: stage_name.into(),
            identifier: identifier.into(),
        }
    }
}

/// One stage inside a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub counter: u64,
    pub result: StageResult,
    pub completed_at: DateTime<Utc>,
}

/// One pipeline run as returned by a feed reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub name: String,
    pub counter: u64,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl PipelineRun {
    /// First stage carrying the given name, if the run has one.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.name == name)
    }
}

// =============================================================================
// STAGE RUN
// =============================================================================

/// Immutable snapshot of a completed stage execution.
///
/// Materials and dependencies are the owning pipeline's state at the time the
/// stage completed, copied out of the feed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRun {
    completed_at: DateTime<Utc>,
    result: StageResult,
    pipeline_name: String,
    pipeline_counter: u64,
    stage_name: String,
    stage_counter: u64,
    materials: Vec<Material>,
    dependencies: Vec<Dependency>,
}

impl StageRun {
    /// Capture a stage of a pipeline run by value.
    #[must_use]
    pub fn capture(pipeline: &PipelineRun, stage: &Stage) -> Self {
        Self {
            completed_at: stage.completed_at,
            result: stage.result,
            pipeline_name: pipeline.name.clone(),
            pipeline_counter: pipeline.counter,
            stage_name: stage.name.clone(),
            stage_counter: stage.counter,
            materials: pipeline.materials.clone(),
            dependencies: pipeline.dependencies.clone(),
        }
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn result(&self) -> StageResult {
        self.result
    }

    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    #[must_use]
    pub fn pipeline_counter(&self) -> u64 {
        self.pipeline_counter
    }

    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    #[must_use]
    pub fn stage_counter(&self) -> u64 {
        self.stage_counter
    }

    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// `pipeline_name/pipeline_counter/stage_name/stage_counter`.
    #[must_use]
    pub fn instance(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.pipeline_name, self.pipeline_counter, self.stage_name, self.stage_counter
        )
    }
}

// =============================================================================
// CURSOR RECORD
// =============================================================================

/// Per-pipeline state kept in the cursor store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorRecord {
    pub latest_feed_cursor: Option<FeedCursor>,
    pub last_green_build: Option<StageRun>,
}

impl CursorRecord {
    /// Apply an update field by field. `None` fields leave the stored value alone.
    pub fn merge(&mut self, update: RecordUpdate) {
        if let Some(cursor) = update.latest_feed_cursor {
            self.latest_feed_cursor = Some(cursor);
        }
        if let Some(build) = update.last_green_build {
            self.last_green_build = Some(build);
        }
    }
}

/// Fields to write into a `CursorRecord`. Only `Some` fields are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordUpdate {
    pub latest_feed_cursor: Option<FeedCursor>,
    pub last_green_build: Option<StageRun>,
}

impl RecordUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: FeedCursor) -> Self {
        self.latest_feed_cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn with_green_build(mut self, build: StageRun) -> Self {
        self.last_green_build = Some(build);
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while polling for a green build.
///
/// "No green build found" is not an error; it is an `Ok(None)` outcome.
/// Collaborator failures are never retried here.
#[derive(Debug, Error)]
pub enum LastGreenError {
    /// The feed reader could not produce pipeline runs.
    #[error("Feed error: {0}")]
    Feed(String),

    /// The cursor store could not be opened, read or committed.
    #[error("Store error: {0}")]
    Store(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A filter constraint could not be parsed.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
