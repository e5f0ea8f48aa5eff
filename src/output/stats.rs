//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::HarvestError;
use chrono::{DateTime, Utc};

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored records
    pub total_records: u64,

    /// Distinct people (directors and actors)
    pub people: u64,

    pub categories: u64,

    pub countries: u64,

    pub keywords: u64,

    /// Number of runs recorded
    pub runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl CrawlStatistics {
    /// Share of the latest run's tasks that completed, in percent
    pub fn success_rate(&self) -> Option<f64> {
        let run = self.latest_run.as_ref()?;
        let total = run.tasks_completed + run.tasks_failed;
        if total == 0 {
            return None;
        }
        Some(run.tasks_completed as f64 / total as f64 * 100.0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, HarvestError> {
    Ok(CrawlStatistics {
        total_records: storage.count_records()?,
        people: storage.count_people()?,
        categories: storage.count_categories()?,
        countries: storage.count_countries()?,
        keywords: storage.count_keywords()?,
        runs: storage.count_runs()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Wall-clock duration of a finished run in seconds
pub fn run_duration_seconds(run: &RunRecord) -> Option<i64> {
    let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
    let finished = run.finished_at.as_ref()?.parse::<DateTime<Utc>>().ok()?;
    Some((finished - started).num_seconds())
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Records stored: {}", stats.total_records);
    println!("  People: {}", stats.people);
    println!("  Categories: {}", stats.categories);
    println!("  Countries: {}", stats.countries);
    println!("  Keywords: {}", stats.keywords);
    println!("  Runs: {}", stats.runs);
    println!();

    let Some(run) = &stats.latest_run else {
        println!("No runs recorded yet");
        return;
    };

    println!("Latest Run (#{}):", run.id);
    println!("  Status: {}", run.status.to_db_string());
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    if let Some(seconds) = run_duration_seconds(run) {
        println!("  Duration: {}s", seconds);
    }
    println!("  Pages: {}, workers: {}", run.total_pages, run.workers);
    println!("  Config hash: {}", run.config_hash);
    println!();

    if let Some(rate) = stats.success_rate() {
        println!(
            "Success Rate: {:.1}% ({} / {} tasks completed)",
            rate,
            run.tasks_completed,
            run.tasks_completed + run.tasks_failed
        );
    }
}
