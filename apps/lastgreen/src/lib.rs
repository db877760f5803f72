//! # lastgreen
//!
//! Command-line front end for `lastgreen-core`: configuration loading, a
//! file-backed feed reader, and the CLI commands.

pub mod cli;
pub mod config;
pub mod feed_file;
