//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl pipeline together:
//! - Building the shared context (page source, listing index, selectors, storage)
//! - Turning one task slot into one stored record
//! - Running the worker pool and recording the run in storage

use crate::config::Config;
use crate::crawler::fetcher::{
    build_http_client, fetch_with_retry, HttpFetcher, PageSource, RetryPolicy,
};
use crate::crawler::page_index::PageIndexCache;
use crate::crawler::pool::{PoolReport, TaskHandler, TaskSlot, WorkerPool};
use crate::extract::{extract_record, SelectorSet};
use crate::storage::{RunStatus, SqliteStorage, Storage, StorageError, UpsertOutcome};
use crate::url::detail_url;
use crate::HarvestError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Everything a worker needs to process a task, shared by all workers
pub struct CrawlContext {
    config: Arc<Config>,
    source: Arc<dyn PageSource>,
    index: PageIndexCache,
    selectors: Arc<SelectorSet>,
    storage: Arc<Mutex<SqliteStorage>>,
    fetch_policy: RetryPolicy,
}

impl CrawlContext {
    /// Creates a context over an explicit page source and storage
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `source` - Where listing and detail pages are fetched from
    /// * `storage` - Where records are persisted
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlContext)` - Ready to run
    /// * `Err(HarvestError)` - A configured selector did not compile
    pub fn new(
        config: Config,
        source: Arc<dyn PageSource>,
        storage: SqliteStorage,
    ) -> Result<Self, HarvestError> {
        let selectors = Arc::new(SelectorSet::compile(&config.selectors)?);
        let index = PageIndexCache::new(
            Arc::clone(&source),
            Arc::clone(&selectors),
            &config.crawler,
        );
        let fetch_policy = RetryPolicy::new(config.crawler.fetch_retries);

        Ok(Self {
            config: Arc::new(config),
            source,
            index,
            selectors,
            storage: Arc::new(Mutex::new(storage)),
            fetch_policy,
        })
    }

    /// Creates a context that fetches over HTTP and stores into the configured database
    pub fn from_config(config: Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        Self::new(config, Arc::new(HttpFetcher::new(client)), storage)
    }

    /// Shared handle to the storage backend
    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    fn lock_storage(&self) -> Result<MutexGuard<'_, SqliteStorage>, StorageError> {
        self.storage
            .lock()
            .map_err(|e| StorageError::Database(format!("Storage lock poisoned: {}", e)))
    }

    /// Runs one task end to end: resolve, fetch, extract, persist
    ///
    /// A record without any recognizable field is not stored; the task fails
    /// with [`HarvestError::BlankRecord`] instead.
    pub async fn process(&self, slot: TaskSlot) -> Result<UpsertOutcome, HarvestError> {
        let href = self.index.resolve(slot.page, slot.position).await?;
        let url = detail_url(&self.config.crawler.base_url, &href)?;

        let document = fetch_with_retry(self.source.as_ref(), url.as_str(), self.fetch_policy).await?;
        let record = extract_record(&document, &self.selectors, &self.config.labels);

        if record.is_blank() {
            return Err(HarvestError::BlankRecord { url: record.url });
        }

        let outcome = self.lock_storage()?.upsert_record(&record)?;
        match outcome {
            UpsertOutcome::Inserted(id) => {
                tracing::info!("Stored record {} for {} ({})", id, record.url, record.title)
            }
            UpsertOutcome::Existing(id) => {
                tracing::debug!("Record {} for {} already stored", id, record.url)
            }
        }

        Ok(outcome)
    }
}

#[async_trait]
impl TaskHandler for CrawlContext {
    async fn handle(&self, slot: TaskSlot) -> Result<(), HarvestError> {
        self.process(slot).await.map(|_| ())
    }
}

/// Crawls `total_pages` listing pages with `workers` workers, recording the run
///
/// The run is marked `completed` when the pool drains, even if some tasks
/// failed; it is marked `failed` only when tasks were queued and none succeeded.
///
/// # Returns
///
/// * `Ok(PoolReport)` - Task counts of the finished run
/// * `Err(HarvestError)` - The run could not be recorded
pub async fn run_crawl(
    context: Arc<CrawlContext>,
    total_pages: u32,
    workers: usize,
    config_hash: &str,
) -> Result<PoolReport, HarvestError> {
    let pool = WorkerPool::new(workers, context.config.crawler.page_size);

    let run_id = context
        .lock_storage()?
        .create_run(config_hash, total_pages, pool.workers() as u32)?;

    tracing::info!(
        "Starting crawl run {}: {} pages, {} workers",
        run_id,
        total_pages,
        pool.workers()
    );

    let start_time = Instant::now();
    let report = pool.run(total_pages, Arc::clone(&context)).await;

    let status = if report.total() > 0 && report.completed == 0 {
        RunStatus::Failed
    } else {
        RunStatus::Completed
    };

    context
        .lock_storage()?
        .finish_run(run_id, status, report.completed, report.failed)?;

    let indexed = context.index.cached_pages().await;
    let unavailable = context.index.unavailable_pages().await;
    tracing::info!(
        "Crawl run {} {} in {:.1}s: {} tasks completed, {} failed, {} listing pages indexed, {} unavailable",
        run_id,
        status.to_db_string(),
        start_time.elapsed().as_secs_f64(),
        report.completed,
        report.failed,
        indexed,
        unavailable
    );

    Ok(report)
}
