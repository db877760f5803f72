//! # CLI Command Implementations

use crate::config::Settings;
use crate::feed_file::JsonFeedReader;
use lastgreen_core::{
    CursorRecord, CursorStore, GreenFilter, LastGreenError, LastGreenFetcher, RedbCursorStore,
    StageRun,
};

// =============================================================================
// RENDERING
// =============================================================================

/// JSON view of a green build, including the derived instance.
pub fn build_json(build: &StageRun) -> serde_json::Value {
    let materials: Vec<serde_json::Value> = build
        .materials()
        .iter()
        .map(|m| {
            serde_json::json!({
                "name": m.name(),
                "repository_url": m.repository_url,
                "revision": m.revision,
            })
        })
        .collect();
    let dependencies: Vec<serde_json::Value> = build
        .dependencies()
        .iter()
        .map(|d| {
            serde_json::json!({
                "pipeline": d.pipeline_name,
                "stage": d.stage_name,
                "instance": d.identifier,
            })
        })
        .collect();

    serde_json::json!({
        "instance": build.instance(),
        "pipeline": build.pipeline_name(),
        "pipeline_counter": build.pipeline_counter(),
        "stage": build.stage_name(),
        "stage_counter": build.stage_counter(),
        "result": build.result().to_string(),
        "completed_at": build.completed_at().to_rfc3339(),
        "materials": materials,
        "dependencies": dependencies,
    })
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_build(build: &StageRun) {
    println!("Last green build: {}", build.instance());
    println!("Completed at:     {}", build.completed_at().to_rfc3339());
    if !build.materials().is_empty() {
        println!("Materials:");
        for material in build.materials() {
            println!("  {} @ {}", material.name(), material.revision);
        }
    }
    if !build.dependencies().is_empty() {
        println!("Dependencies:");
        for dependency in build.dependencies() {
            println!("  {} -> {}", dependency.pipeline_name, dependency.identifier);
        }
    }
}

// =============================================================================
// FETCH COMMAND
// =============================================================================

/// Poll the feed once and print the last green build.
pub fn cmd_fetch(
    settings: &Settings,
    json_mode: bool,
    dependencies: &[String],
    materials: &[String],
) -> Result<(), LastGreenError> {
    let config = settings.fetcher_config()?;
    let feed = JsonFeedReader::new(settings.feed_path()?);

    let mut filter = GreenFilter::new();
    for arg in dependencies {
        filter.parse_dependency(arg)?;
    }
    for arg in materials {
        filter.parse_material(arg)?;
    }

    tracing::info!(
        "Checking for last green run of {}/{}",
        config.pipeline_name,
        config.stage_name
    );

    let store = RedbCursorStore::open(&settings.store)?;
    let mut fetcher = LastGreenFetcher::new(config, feed, store);
    let build = fetcher.fetch(&filter)?;

    if json_mode {
        print_json(&serde_json::json!({
            "pipeline": fetcher.config().pipeline_name,
            "stage": fetcher.config().stage_name,
            "last_green_build": build.as_ref().map(build_json),
        }));
        return Ok(());
    }

    match build {
        Some(build) => print_build(&build),
        None => println!("No green build"),
    }
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print the remembered record without reading the feed.
pub fn cmd_show(settings: &Settings, json_mode: bool) -> Result<(), LastGreenError> {
    let config = settings.fetcher_config()?;
    let id = config.pipeline_id();

    if !settings.store.exists() {
        return Err(LastGreenError::Store(format!(
            "No cursor store at {}. Run 'lastgreen init' or 'lastgreen fetch' first.",
            settings.store.display()
        )));
    }
    let store = RedbCursorStore::open(&settings.store)?;
    let record: CursorRecord = store.recall(&id)?.unwrap_or_default();

    if json_mode {
        print_json(&serde_json::json!({
            "pipeline": id.pipeline,
            "stage": id.stage,
            "latest_feed_cursor": record.latest_feed_cursor.as_ref().map(|c| c.as_str()),
            "last_green_build": record.last_green_build.as_ref().map(build_json),
        }));
        return Ok(());
    }

    println!("Pipeline: {}", id);
    match &record.latest_feed_cursor {
        Some(cursor) => println!("Cursor:   {}", cursor),
        None => println!("Cursor:   (never polled)"),
    }
    match &record.last_green_build {
        Some(build) => print_build(build),
        None => println!("No green build"),
    }
    Ok(())
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// List pipeline identities in the cursor store.
pub fn cmd_list(settings: &Settings, json_mode: bool) -> Result<(), LastGreenError> {
    if !settings.store.exists() {
        return Err(LastGreenError::Store(format!(
            "No cursor store at {}",
            settings.store.display()
        )));
    }
    let store = RedbCursorStore::open(&settings.store)?;
    let ids = store.pipelines()?;

    if json_mode {
        let pipelines: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({ "pipeline": id.pipeline, "stage": id.stage }))
            .collect();
        print_json(&serde_json::json!({ "pipelines": pipelines }));
        return Ok(());
    }

    if ids.is_empty() {
        println!("No pipelines tracked");
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty cursor store.
pub fn cmd_init(settings: &Settings, force: bool) -> Result<(), LastGreenError> {
    let path = &settings.store;
    if path.exists() {
        if !force {
            return Err(LastGreenError::Store(
                "Cursor store already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(path).map_err(|e| {
            LastGreenError::IoError(format!("Cannot remove {}: {}", path.display(), e))
        })?;
    }

    let _store = RedbCursorStore::open(path)?;
    println!("Initialized new cursor store at {}", path.display());
    Ok(())
}

// =============================================================================
// COMPACT COMMAND
// =============================================================================

/// Compact an existing cursor store.
pub fn cmd_compact(settings: &Settings) -> Result<(), LastGreenError> {
    let path = &settings.store;
    if !path.exists() {
        return Err(LastGreenError::Store(format!(
            "No cursor store at {}",
            path.display()
        )));
    }

    let store = RedbCursorStore::open(path)?;
    if store.compact()? {
        println!("Compacted cursor store at {}", path.display());
    } else {
        println!("Cursor store at {} is already compact", path.display());
    }
    Ok(())
}
