//! # lastgreen CLI Module
//!
//! ## Available Commands
//!
//! - `fetch` - Poll the feed once and print the last green build
//! - `show` - Print the remembered record without reading the feed
//! - `list` - List pipeline identities in the cursor store
//! - `init` - Create an empty cursor store
//! - `compact` - Reclaim space in the cursor store file

mod commands;

use crate::config::{FileConfig, Overrides, Settings};
use clap::{Parser, Subcommand};
use lastgreen_core::LastGreenError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// lastgreen - find the last green run of a pipeline stage
///
/// Each invocation reads only feed entries newer than the previous one and
/// remembers the last green build between runs.
#[derive(Parser, Debug)]
#[command(name = "lastgreen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./lastgreen.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the cursor store
    #[arg(short = 'D', long, global = true)]
    pub store: Option<PathBuf>,

    /// Pipeline name
    #[arg(short, long, global = true)]
    pub pipeline: Option<String>,

    /// Stage name
    #[arg(short, long, global = true)]
    pub stage: Option<String>,

    /// Feed pages to read per poll
    #[arg(long, global = true)]
    pub page_limit: Option<u32>,

    /// Path to the JSON feed snapshot
    #[arg(short, long, global = true)]
    pub feed: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the feed once and print the last green build
    Fetch {
        /// Require an upstream instance, as PIPELINE=INSTANCE (repeatable)
        #[arg(long = "dependency", value_name = "PIPELINE=INSTANCE")]
        dependencies: Vec<String>,

        /// Require a material revision, as NAME=REVISION (repeatable)
        #[arg(long = "material", value_name = "NAME=REVISION")]
        materials: Vec<String>,
    },

    /// Show the remembered cursor and green build
    Show,

    /// List pipeline identities in the cursor store
    List,

    /// Initialize a new empty cursor store
    Init {
        /// Force initialization even if the store exists
        #[arg(long)]
        force: bool,
    },

    /// Compact the cursor store file
    Compact,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            pipeline: self.pipeline.clone(),
            stage: self.stage.clone(),
            page_limit: self.page_limit,
            store: self.store.clone(),
            feed: self.feed.clone(),
        }
    }

    /// Merge the config file and the flags.
    pub fn settings(&self) -> Result<Settings, LastGreenError> {
        let file = FileConfig::load(self.config.as_deref())?;
        Ok(Settings::resolve(file, self.overrides()))
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), LastGreenError> {
    let settings = cli.settings()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Fetch {
            dependencies,
            materials,
        }) => cmd_fetch(&settings, json_mode, &dependencies, &materials),
        Some(Commands::Show) => cmd_show(&settings, json_mode),
        Some(Commands::List) => cmd_list(&settings, json_mode),
        Some(Commands::Init { force }) => cmd_init(&settings, force),
        Some(Commands::Compact) => cmd_compact(&settings),
        None => {
            // No subcommand - poll with no filter
            cmd_fetch(&settings, json_mode, &[], &[])
        }
    }
}
