//! # Stage Locator
//!
//! Finds the most recent passing run of a named stage in a window of
//! pipeline runs.
//!
//! Scanning goes newest to oldest and stops at the first pipeline run whose
//! stage of that name passed. Runs without such a stage are skipped.

use crate::feed::FeedOrder;
use crate::{PipelineRun, StageRun};

/// Locates the newest green run of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLocator {
    stage_name: String,
}

impl StageLocator {
    #[must_use]
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
        }
    }

    /// Return the newest passing run of the stage, captured by value.
    ///
    /// `None` means no run in the window passed; it says nothing about filters.
    #[must_use]
    pub fn locate(&self, runs: &[PipelineRun], order: FeedOrder) -> Option<StageRun> {
        match order {
            FeedOrder::NewestFirst => self.first_green(runs.iter()),
            FeedOrder::OldestFirst => self.first_green(runs.iter().rev()),
        }
    }

    fn first_green<'a>(
        &self,
        newest_first: impl Iterator<Item = &'a PipelineRun>,
    ) -> Option<StageRun> {
        newest_first
            .filter_map(|pipeline| {
                pipeline
                    .stage(&self.stage_name)
                    .map(|stage| (pipeline, stage))
            })
            .find(|(_, stage)| stage.result.is_green())
            .map(|(pipeline, stage)| StageRun::capture(pipeline, stage))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{Stage, StageResult};
    use chrono::{TimeZone, Utc};

    fn run(counter: u64, stages: &[(&str, StageResult, u32)]) -> PipelineRun {
        PipelineRun {
            name: "osito".to_string(),
            counter,
            materials: Vec::new(),
            dependencies: Vec::new(),
            stages: stages
                .iter()
                .map(|(name, result, hour)| Stage {
                    name: (*name).to_string(),
                    counter: 1,
                    result: *result,
                    completed_at: Utc.with_ymd_and_hms(2013, 2, 11, *hour, 0, 0).unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn newest_passing_run_wins_newest_first() {
        let runs = vec![
            run(3, &[("acceptance", StageResult::Passed, 14)]),
            run(2, &[("acceptance", StageResult::Passed, 12)]),
        ];
        let found = StageLocator::new("acceptance")
            .locate(&runs, FeedOrder::NewestFirst)
            .expect("candidate");
        assert_eq!(found.pipeline_counter(), 3);
    }

    #[test]
    fn newest_passing_run_wins_oldest_first() {
        let runs = vec![
            run(1, &[("acceptance", StageResult::Passed, 10)]),
            run(2, &[("acceptance", StageResult::Passed, 12)]),
            run(3, &[("acceptance", StageResult::Failed, 14)]),
        ];
        let found = StageLocator::new("acceptance")
            .locate(&runs, FeedOrder::OldestFirst)
            .expect("candidate");
        assert_eq!(found.instance(), "osito/2/acceptance/1");
    }

    #[test]
    fn other_stages_do_not_count() {
        let runs = vec![run(
            1,
            &[
                ("unit", StageResult::Passed, 11),
                ("acceptance", StageResult::Failed, 12),
            ],
        )];
        assert!(
            StageLocator::new("acceptance")
                .locate(&runs, FeedOrder::NewestFirst)
                .is_none()
        );
    }

    #[test]
    fn runs_without_the_stage_are_skipped() {
        let runs = vec![
            run(5, &[("unit", StageResult::Passed, 15)]),
            run(4, &[]),
            run(3, &[("acceptance", StageResult::Passed, 13)]),
        ];
        let found = StageLocator::new("acceptance")
            .locate(&runs, FeedOrder::NewestFirst)
            .expect("candidate");
        assert_eq!(found.pipeline_counter(), 3);
    }

    #[test]
    fn empty_window_has_no_candidate() {
        assert!(
            StageLocator::new("acceptance")
                .locate(&[], FeedOrder::NewestFirst)
                .is_none()
        );
    }

    #[test]
    fn cancelled_and_unknown_are_not_green() {
        let runs = vec![
            run(2, &[("acceptance", StageResult::Cancelled, 12)]),
            run(1, &[("acceptance", StageResult::Unknown, 11)]),
        ];
        assert!(
            StageLocator::new("acceptance")
                .locate(&runs, FeedOrder::NewestFirst)
                .is_none()
        );
    }
}
