//! Crawler module for page fetching and task processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retry
//! - Lazy, single-flight indexing of listing pages
//! - The fixed-size worker pool draining `(page, position)` tasks
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod page_index;
mod pool;

pub use coordinator::{run_crawl, CrawlContext};
pub use fetcher::{
    build_http_client, fetch_with_retry, FetchError, HttpFetcher, PageSource, RetryPolicy,
};
pub use page_index::{ListingPage, PageIndexCache, ResolveError, ResolvePolicy};
pub use pool::{PoolReport, TaskHandler, TaskSlot, WorkerPool};

use crate::config::Config;
use crate::HarvestError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the configured database
/// 2. Build the HTTP client
/// 3. Queue every `(page, position)` task and run the worker pool
/// 4. Record the run and its task counts
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `total_pages` - Listing pages to crawl
/// * `workers` - Concurrent workers
/// * `config_hash` - Hash of the configuration file, stored with the run
///
/// # Returns
///
/// * `Ok(PoolReport)` - Crawl finished; failed tasks are counted, not fatal
/// * `Err(HarvestError)` - Crawl could not start or be recorded
pub async fn crawl(
    config: Config,
    total_pages: u32,
    workers: usize,
    config_hash: &str,
) -> Result<PoolReport, HarvestError> {
    let context = Arc::new(CrawlContext::from_config(config)?);
    run_crawl(context, total_pages, workers, config_hash).await
}
