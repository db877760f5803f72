//! Tests for config file parsing and flag merging.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use lastgreen::config::{DEFAULT_STORE_FILE, FileConfig, Overrides, Settings};
use lastgreen_core::{LastGreenError, PipelineId};
use std::path::PathBuf;

// =============================================================================
// FILE CONFIG
// =============================================================================

#[test]
fn test_parse_full_file() {
    let file = FileConfig::parse(
        r#"
        pipeline = "osito"
        stage = "acceptance"
        page_limit = 4
        store = "state/cursors.redb"
        feed = "feed.json"
        "#,
    )
    .unwrap();

    assert_eq!(file.pipeline.as_deref(), Some("osito"));
    assert_eq!(file.stage.as_deref(), Some("acceptance"));
    assert_eq!(file.page_limit, Some(4));
    assert_eq!(file.store, Some(PathBuf::from("state/cursors.redb")));
    assert_eq!(file.feed, Some(PathBuf::from("feed.json")));
}

#[test]
fn test_parse_empty_file() {
    assert_eq!(FileConfig::parse("").unwrap(), FileConfig::default());
}

#[test]
fn test_parse_rejects_unknown_key() {
    let err = FileConfig::parse("pipline = \"osito\"").unwrap_err();
    assert!(matches!(err, LastGreenError::Config(_)));
}

#[test]
fn test_load_explicit_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = FileConfig::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, LastGreenError::Config(_)));
}

#[test]
fn test_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lastgreen.toml");
    std::fs::write(&path, "pipeline = \"osito\"\nstage = \"unit\"\n").unwrap();

    let file = FileConfig::load(Some(&path)).unwrap();
    assert_eq!(file.pipeline.as_deref(), Some("osito"));
    assert_eq!(file.stage.as_deref(), Some("unit"));
}

// =============================================================================
// SETTINGS
// =============================================================================

#[test]
fn test_defaults_without_file_or_flags() {
    let settings = Settings::resolve(FileConfig::default(), Overrides::default());
    assert_eq!(settings.page_limit, 2);
    assert_eq!(settings.store, PathBuf::from(DEFAULT_STORE_FILE));
    assert!(settings.feed.is_none());
}

#[test]
fn test_flags_win_over_file() {
    let file = FileConfig {
        pipeline: Some("osito".to_string()),
        stage: Some("unit".to_string()),
        page_limit: Some(3),
        store: Some(PathBuf::from("file.redb")),
        feed: Some(PathBuf::from("file.json")),
    };
    let overrides = Overrides {
        stage: Some("acceptance".to_string()),
        page_limit: Some(5),
        ..Overrides::default()
    };

    let settings = Settings::resolve(file, overrides);
    assert_eq!(settings.pipeline.as_deref(), Some("osito"));
    assert_eq!(settings.stage.as_deref(), Some("acceptance"));
    assert_eq!(settings.page_limit, 5);
    assert_eq!(settings.store, PathBuf::from("file.redb"));
    assert_eq!(settings.feed, Some(PathBuf::from("file.json")));
}

#[test]
fn test_fetcher_config_requires_pipeline_and_stage() {
    let mut settings = Settings::resolve(FileConfig::default(), Overrides::default());
    assert!(matches!(
        settings.fetcher_config(),
        Err(LastGreenError::Config(_))
    ));

    settings.pipeline = Some("osito".to_string());
    settings.stage = Some(String::new());
    assert!(matches!(
        settings.fetcher_config(),
        Err(LastGreenError::Config(_))
    ));

    settings.stage = Some("acceptance".to_string());
    let config = settings.fetcher_config().unwrap();
    assert_eq!(config.pipeline_id(), PipelineId::new("osito", "acceptance"));
    assert_eq!(config.page_limit(), 2);
}

#[test]
fn test_fetcher_config_clamps_page_limit() {
    let overrides = Overrides {
        pipeline: Some("osito".to_string()),
        stage: Some("acceptance".to_string()),
        page_limit: Some(500),
        ..Overrides::default()
    };
    let settings = Settings::resolve(FileConfig::default(), overrides);
    assert_eq!(settings.fetcher_config().unwrap().page_limit(), 10);
}

#[test]
fn test_feed_path_required() {
    let settings = Settings::resolve(FileConfig::default(), Overrides::default());
    assert!(matches!(
        settings.feed_path(),
        Err(LastGreenError::Config(_))
    ));
}
