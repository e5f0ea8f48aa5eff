//! Output module for reporting harvest results
//!
//! This module handles:
//! - Loading harvest statistics from storage
//! - Printing them for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, run_duration_seconds, CrawlStatistics};
