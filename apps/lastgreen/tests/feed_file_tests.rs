//! Tests for the JSON feed reader, alone and driving a real fetch.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use lastgreen::feed_file::{FEED_PAGE_SIZE, JsonFeedReader};
use lastgreen_core::{
    CursorStore, FeedCursor, FeedOrder, FeedReader, FeedRequest, FetcherConfig, GreenFilter,
    LastGreenError, LastGreenFetcher, PipelineId, RedbCursorStore, StageResult,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn run(name: &str, counter: u64, result: &str) -> Value {
    json!({
        "name": name,
        "counter": counter,
        "materials": [
            {
                "repository_url": "https://git.example.com/osito",
                "revision": format!("rev{counter}"),
            }
        ],
        "dependencies": [
            {
                "pipeline_name": "upstream",
                "stage_name": "ready",
                "identifier": format!("upstream/{counter}/ready/1"),
            }
        ],
        "stages": [
            {
                "name": "unit",
                "counter": 1,
                "result": "Passed",
                "completed_at": "2013-02-11T14:00:00Z",
            },
            {
                "name": "acceptance",
                "counter": 1,
                "result": result,
                "completed_at": "2013-02-11T14:19:00Z",
            }
        ]
    })
}

fn write_feed(path: &Path, runs: Vec<Value>) {
    let document = json!({ "pipelines": runs });
    std::fs::write(path, serde_json::to_vec(&document).unwrap()).unwrap();
}

fn request(cursor: Option<&str>, page_limit: u32) -> FeedRequest {
    FeedRequest {
        pipeline_name: "osito".to_string(),
        stage_name: "acceptance".to_string(),
        cursor: cursor.map(FeedCursor::new),
        page_limit,
    }
}

fn feed_in(dir: &Path) -> PathBuf {
    dir.join("feed.json")
}

// =============================================================================
// PAGING
// =============================================================================

#[test]
fn test_first_read_is_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    write_feed(
        &path,
        vec![
            run("osito", 1, "Passed"),
            run("other", 9, "Passed"),
            run("osito", 3, "Failed"),
            run("osito", 2, "Passed"),
        ],
    );

    let page = JsonFeedReader::new(&path).runs(&request(None, 2)).unwrap();
    let counters: Vec<u64> = page.pipeline_runs.iter().map(|r| r.counter).collect();
    assert_eq!(counters, vec![3, 2, 1]);
    assert_eq!(page.order, FeedOrder::NewestFirst);
    assert_eq!(page.next_cursor, FeedCursor::new("osito/3"));
}

#[test]
fn test_cursor_skips_seen_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    write_feed(&path, (1..=5).map(|c| run("osito", c, "Passed")).collect());

    let page = JsonFeedReader::new(&path)
        .runs(&request(Some("osito/3"), 2))
        .unwrap();
    let counters: Vec<u64> = page.pipeline_runs.iter().map(|r| r.counter).collect();
    assert_eq!(counters, vec![5, 4]);
    assert_eq!(page.next_cursor, FeedCursor::new("osito/5"));
}

#[test]
fn test_nothing_new_keeps_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    write_feed(&path, vec![run("osito", 1, "Passed")]);

    let page = JsonFeedReader::new(&path)
        .runs(&request(Some("osito/1"), 2))
        .unwrap();
    assert!(page.pipeline_runs.is_empty());
    assert_eq!(page.next_cursor, FeedCursor::new("osito/1"));
}

#[test]
fn test_empty_feed_without_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    write_feed(&path, Vec::new());

    let page = JsonFeedReader::new(&path).runs(&request(None, 2)).unwrap();
    assert!(page.pipeline_runs.is_empty());
    assert_eq!(page.next_cursor, FeedCursor::new(""));
}

#[test]
fn test_page_limit_bounds_the_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    write_feed(&path, (1..=35).map(|c| run("osito", c, "Failed")).collect());

    let page = JsonFeedReader::new(&path).runs(&request(None, 2)).unwrap();
    assert_eq!(page.pipeline_runs.len(), FEED_PAGE_SIZE * 2);
    assert_eq!(page.pipeline_runs[0].counter, 35);
    assert_eq!(page.next_cursor, FeedCursor::new("osito/35"));
}

#[test]
fn test_foreign_cursor_reads_newest() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    write_feed(&path, vec![run("osito", 1, "Passed"), run("osito", 2, "Passed")]);

    let page = JsonFeedReader::new(&path)
        .runs(&request(Some("https://ci.example.com/feed?after=7"), 2))
        .unwrap();
    assert_eq!(page.pipeline_runs.len(), 2);
}

// =============================================================================
// FAILURES
// =============================================================================

#[test]
fn test_missing_feed_is_feed_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = JsonFeedReader::new(feed_in(dir.path()))
        .runs(&request(None, 2))
        .unwrap_err();
    assert!(matches!(err, LastGreenError::Feed(_)));
}

#[test]
fn test_malformed_feed_is_feed_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    std::fs::write(&path, b"{\"pipelines\": [").unwrap();

    let err = JsonFeedReader::new(&path)
        .runs(&request(None, 2))
        .unwrap_err();
    assert!(matches!(err, LastGreenError::Feed(_)));
}

#[test]
fn test_unrecognised_result_is_not_green() {
    let dir = tempfile::tempdir().unwrap();
    let path = feed_in(dir.path());
    write_feed(&path, vec![run("osito", 1, "passed"), run("osito", 2, "Building")]);

    let page = JsonFeedReader::new(&path).runs(&request(None, 2)).unwrap();
    let results: Vec<StageResult> = page
        .pipeline_runs
        .iter()
        .filter_map(|r| r.stage("acceptance"))
        .map(|stage| stage.result)
        .collect();
    assert_eq!(results, vec![StageResult::Unknown, StageResult::Unknown]);

    let store = RedbCursorStore::open(dir.path().join("cursors.redb")).unwrap();
    let mut fetcher = LastGreenFetcher::new(
        FetcherConfig::new("osito", "acceptance"),
        JsonFeedReader::new(&path),
        store,
    );
    assert!(fetcher.fetch_latest().unwrap().is_none());
}

// =============================================================================
// END TO END
// =============================================================================

#[test]
fn test_fetch_through_file_feed_and_redb_store() {
    let dir = tempfile::tempdir().unwrap();
    let feed_path = feed_in(dir.path());
    let store_path = dir.path().join("cursors.redb");
    write_feed(
        &feed_path,
        vec![run("osito", 1, "Passed"), run("osito", 2, "Failed")],
    );

    {
        let store = RedbCursorStore::open(&store_path).unwrap();
        let mut fetcher = LastGreenFetcher::new(
            FetcherConfig::new("osito", "acceptance"),
            JsonFeedReader::new(&feed_path),
            store,
        );
        let build = fetcher.fetch_latest().unwrap().unwrap();
        assert_eq!(build.instance(), "osito/1/acceptance/1");
        assert_eq!(build.materials()[0].name(), "osito-git");
    }

    // A later run of the process sees only the new entry.
    write_feed(
        &feed_path,
        vec![
            run("osito", 1, "Passed"),
            run("osito", 2, "Failed"),
            run("osito", 3, "Passed"),
        ],
    );
    let store = RedbCursorStore::open(&store_path).unwrap();
    let mut fetcher = LastGreenFetcher::new(
        FetcherConfig::new("osito", "acceptance"),
        JsonFeedReader::new(&feed_path),
        store,
    );
    let filter = GreenFilter::new().with_dependency("upstream", "upstream/3/ready/1");
    let build = fetcher.fetch(&filter).unwrap().unwrap();
    assert_eq!(build.pipeline_counter(), 3);

    let record = fetcher
        .store()
        .recall(&PipelineId::new("osito", "acceptance"))
        .unwrap()
        .unwrap();
    assert_eq!(record.latest_feed_cursor, Some(FeedCursor::new("osito/3")));
}

#[test]
fn test_feed_failure_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("cursors.redb");
    let store = RedbCursorStore::open(&store_path).unwrap();
    let mut fetcher = LastGreenFetcher::new(
        FetcherConfig::new("osito", "acceptance"),
        JsonFeedReader::new(feed_in(dir.path())),
        store,
    );

    assert!(fetcher.fetch_latest().is_err());
    let id = PipelineId::new("osito", "acceptance");
    assert!(fetcher.store().recall(&id).unwrap().is_none());
}
