//! Listing page index
//!
//! Maps `(page, position)` task coordinates to detail links. Each listing page
//! is fetched once, on first demand, and its links are kept for the rest of the
//! process lifetime. A page that stays unreachable through its whole retry
//! budget is remembered as unavailable, so the budget is spent once per page
//! rather than once per task.
//!
//! # Concurrency
//!
//! Every page owns a `OnceCell`. The map lock is held only long enough to find
//! or create a page's cell, so workers on different pages never wait for each
//! other, while concurrent first requests for one page share a single fetch.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_with_retry, FetchError, PageSource, RetryPolicy};
use crate::extract::{extract_listing_hrefs, SelectorSet};
use crate::url::listing_page_url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

/// Errors resolving a task's detail link
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Listing page {page} unavailable after {attempts} attempts: {source}")]
    PageUnavailable {
        page: u32,
        attempts: u32,
        source: Arc<FetchError>,
    },

    #[error("Listing page {page} has no item at position {position} ({available} items)")]
    PositionNotFound {
        page: u32,
        position: u32,
        available: usize,
    },

    #[error("Item {position} on listing page {page} has no detail link")]
    MissingHref { page: u32, position: u32 },

    #[error("Invalid listing URL for page {page}: {source}")]
    InvalidUrl { page: u32, source: url::ParseError },
}

/// Detail links of one listing page, one slot per listing item in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    page: u32,
    slots: Vec<Option<String>>,
}

impl ListingPage {
    pub fn new(page: u32, slots: Vec<Option<String>>) -> Self {
        Self { page, slots }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the detail link at a 1-based position
    pub fn href(&self, position: u32) -> Result<&str, ResolveError> {
        let slot = position
            .checked_sub(1)
            .and_then(|index| self.slots.get(index as usize))
            .ok_or(ResolveError::PositionNotFound {
                page: self.page,
                position,
                available: self.slots.len(),
            })?;

        slot.as_deref().ok_or(ResolveError::MissingHref {
            page: self.page,
            position,
        })
    }
}

/// How hard [`PageIndexCache`] tries to populate a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvePolicy {
    /// Population attempts before the page is reported unavailable
    pub attempts: u32,
    /// Delay after the first failed attempt; doubled after each further failure
    pub initial_backoff: Duration,
}

impl ResolvePolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            attempts: config.resolve_attempts.max(1),
            initial_backoff: Duration::from_millis(config.resolve_backoff_ms),
        }
    }
}

type PageOutcome = Result<Arc<ListingPage>, Arc<FetchError>>;
type PageCell = Arc<OnceCell<PageOutcome>>;

/// Lazily populated, process-lifetime cache of listing pages
pub struct PageIndexCache {
    source: Arc<dyn PageSource>,
    selectors: Arc<SelectorSet>,
    base_url: String,
    category: String,
    fetch_policy: RetryPolicy,
    resolve_policy: ResolvePolicy,
    pages: Mutex<HashMap<u32, PageCell>>,
}

impl PageIndexCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `source` - Where listing pages are fetched from
    /// * `selectors` - Compiled selectors locating listing items and links
    /// * `config` - Crawler settings (URL template, retry budgets)
    pub fn new(
        source: Arc<dyn PageSource>,
        selectors: Arc<SelectorSet>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            source,
            selectors,
            base_url: config.base_url.clone(),
            category: config.category.clone(),
            fetch_policy: RetryPolicy::new(config.fetch_retries),
            resolve_policy: ResolvePolicy::from_config(config),
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves the detail link at a 1-based `position` of listing `page`
    ///
    /// The first call for a page fetches and indexes it; later calls, from any
    /// worker, read the cached index. A short page is not an error of the
    /// listing: positions past its last item resolve to `PositionNotFound`
    /// without refetching.
    pub async fn resolve(&self, page: u32, position: u32) -> Result<String, ResolveError> {
        let listing = self.listing(page).await?;
        listing.href(position).map(str::to_string)
    }

    /// Returns the indexed listing page, populating it on first use
    ///
    /// Only the first caller for a page fetches it. Concurrent callers wait for
    /// that outcome, and later callers read it, whether it is the indexed page
    /// or the failure that exhausted the retry budget.
    pub async fn listing(&self, page: u32) -> Result<Arc<ListingPage>, ResolveError> {
        let cell = {
            let mut pages = self.pages.lock().await;
            Arc::clone(pages.entry(page).or_default())
        };

        let outcome = match cell.get() {
            Some(outcome) => outcome,
            None => {
                let url = listing_page_url(&self.base_url, &self.category, page)
                    .map_err(|source| ResolveError::InvalidUrl { page, source })?;
                cell.get_or_init(|| self.populate_with_backoff(page, &url))
                    .await
            }
        };

        outcome
            .as_ref()
            .map(Arc::clone)
            .map_err(|source| ResolveError::PageUnavailable {
                page,
                attempts: self.resolve_policy.attempts,
                source: Arc::clone(source),
            })
    }

    /// Number of listing pages fully indexed so far
    pub async fn cached_pages(&self) -> usize {
        self.pages
            .lock()
            .await
            .values()
            .filter(|cell| matches!(cell.get(), Some(Ok(_))))
            .count()
    }

    /// Number of listing pages given up on after exhausting their retry budget
    pub async fn unavailable_pages(&self) -> usize {
        self.pages
            .lock()
            .await
            .values()
            .filter(|cell| matches!(cell.get(), Some(Err(_))))
            .count()
    }

    async fn populate_with_backoff(&self, page: u32, url: &Url) -> PageOutcome {
        let attempts = self.resolve_policy.attempts;
        let mut backoff = self.resolve_policy.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.populate(page, url).await {
                Ok(listing) => return Ok(listing),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "Listing page {} not indexed (attempt {}/{}), retrying in {:?}: {}",
                        page,
                        attempt,
                        attempts,
                        backoff,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Listing page {} unavailable after {} attempts, skipping its items: {}",
                        page,
                        attempts,
                        e
                    );
                    return Err(Arc::new(e));
                }
            }
        }
    }

    async fn populate(&self, page: u32, url: &Url) -> Result<Arc<ListingPage>, FetchError> {
        let document = fetch_with_retry(self.source.as_ref(), url.as_str(), self.fetch_policy).await?;
        let slots = extract_listing_hrefs(&document, &self.selectors);

        tracing::info!("Indexed listing page {} ({} items)", page, slots.len());
        Ok(Arc::new(ListingPage::new(page, slots)))
    }
}
