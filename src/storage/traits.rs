//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::Record;
use crate::storage::{RunRecord, RunStatus, StoredRecord, UpsertOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `total_pages` - Listing pages the run will crawl
    /// * `workers` - Worker count of the run
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, total_pages: u32, workers: u32)
        -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with its final status and task counts
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        tasks_completed: u64,
        tasks_failed: u64,
    ) -> StorageResult<()>;

    // ===== Records =====

    /// Stores a record unless one with the same URL already exists
    ///
    /// An existing record is left exactly as it is. A new record is inserted
    /// together with its related entities, reusing entities already stored
    /// under the same natural key.
    fn upsert_record(&mut self, record: &Record) -> StorageResult<UpsertOutcome>;

    /// Loads a stored record, including its related entities
    fn get_record_by_url(&self, url: &str) -> StorageResult<Option<StoredRecord>>;

    // ===== Statistics =====

    fn count_records(&self) -> StorageResult<u64>;

    fn count_people(&self) -> StorageResult<u64>;

    fn count_categories(&self) -> StorageResult<u64>;

    fn count_countries(&self) -> StorageResult<u64>;

    fn count_keywords(&self) -> StorageResult<u64>;

    fn count_runs(&self) -> StorageResult<u64>;
}
