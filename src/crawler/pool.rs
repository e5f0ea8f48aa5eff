//! Worker pool distributing `(page, position)` tasks
//!
//! This module handles:
//! - Enumerating every task slot of a crawl up front
//! - Queueing all slots into a channel sized to hold them, then closing it
//! - Running a fixed number of workers that drain the queue
//! - Absorbing per-task failures so one bad task never stops the pool

use crate::HarvestError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// One crawl unit: the item at `position` (1-based) on listing `page` (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskSlot {
    /// Linear 0-based task index
    pub index: u64,
    pub page: u32,
    pub position: u32,
}

impl TaskSlot {
    /// Decomposes a linear task index using a fixed page size
    ///
    /// # Examples
    ///
    /// ```
    /// use reel_harvest::crawler::TaskSlot;
    ///
    /// let slot = TaskSlot::from_index(31, 30);
    /// assert_eq!((slot.page, slot.position), (2, 2));
    /// ```
    pub fn from_index(index: u64, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        Self {
            index,
            page: (index / page_size + 1) as u32,
            position: (index % page_size + 1) as u32,
        }
    }
}

/// Processes one task; implemented by the crawl pipeline
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    async fn handle(&self, slot: TaskSlot) -> Result<(), HarvestError>;
}

/// Task counts collected while the pool ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub completed: u64,
    pub failed: u64,
}

impl PoolReport {
    pub fn total(&self) -> u64 {
        self.completed + self.failed
    }

    fn merge(&mut self, other: PoolReport) {
        self.completed += other.completed;
        self.failed += other.failed;
    }
}

/// Fixed-size pool of workers
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
    page_size: u32,
}

impl WorkerPool {
    /// Creates a pool with `workers` workers (at least one) and the given listing page size
    pub fn new(workers: usize, page_size: u32) -> Self {
        Self {
            workers: workers.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of task slots a crawl of `total_pages` pages enumerates
    pub fn total_tasks(&self, total_pages: u32) -> u64 {
        u64::from(total_pages) * u64::from(self.page_size)
    }

    /// Runs every task slot of `total_pages` listing pages through `handler`
    ///
    /// Returns once all workers have drained the queue and exited. Tasks are
    /// enumerated in index order but processed in whatever order idle workers
    /// claim them. A failing task is logged and counted, never retried here.
    pub async fn run<H>(&self, total_pages: u32, handler: Arc<H>) -> PoolReport
    where
        H: TaskHandler,
    {
        let total_tasks = self.total_tasks(total_pages);
        let capacity = usize::try_from(total_tasks)
            .unwrap_or(usize::MAX)
            .clamp(1, tokio::sync::Semaphore::MAX_PERMITS);
        let (sender, receiver) = mpsc::channel(capacity);

        for index in 0..total_tasks {
            if sender
                .send(TaskSlot::from_index(index, self.page_size))
                .await
                .is_err()
            {
                break;
            }
        }
        // Closing the queue lets workers stop once it is empty
        drop(sender);

        tracing::info!(
            "Queued {} tasks ({} pages x {}) for {} workers",
            total_tasks,
            total_pages,
            self.page_size,
            self.workers
        );

        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(self.workers);

        for worker_id in 0..self.workers {
            let receiver = Arc::clone(&receiver);
            let handler = Arc::clone(&handler);

            handles.push(tokio::spawn(async move {
                let mut report = PoolReport::default();

                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(slot) = next else {
                        break;
                    };

                    tracing::debug!(
                        "Worker {} starting item {} on page {}",
                        worker_id,
                        slot.position,
                        slot.page
                    );

                    match handler.handle(slot).await {
                        Ok(()) => report.completed += 1,
                        Err(e) => {
                            tracing::warn!(
                                "Skipping item {} on page {}: {}",
                                slot.position,
                                slot.page,
                                e
                            );
                            report.failed += 1;
                        }
                    }
                }

                tracing::debug!("Worker {} finished", worker_id);
                report
            }));
        }

        let mut report = PoolReport::default();
        for handle in handles {
            match handle.await {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => tracing::error!("Worker task aborted: {}", e),
            }
        }

        tracing::info!(
            "Pool finished: {} completed, {} failed",
            report.completed,
            report.failed
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Records every slot it sees; fails the slots listed in `failing`
    #[derive(Default)]
    struct RecordingHandler {
        seen: StdMutex<Vec<TaskSlot>>,
        failing: HashSet<(u32, u32)>,
        delay: Duration,
    }

    #[async_trait]
    impl TaskHandler for RecordingHandler {
        async fn handle(&self, slot: TaskSlot) -> Result<(), HarvestError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.seen.lock().unwrap().push(slot);
            if self.failing.contains(&(slot.page, slot.position)) {
                return Err(HarvestError::BlankRecord {
                    url: format!("page {} position {}", slot.page, slot.position),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_task_slot_decomposition() {
        assert_eq!(
            TaskSlot::from_index(0, 30),
            TaskSlot {
                index: 0,
                page: 1,
                position: 1
            }
        );
        let last = TaskSlot::from_index(29, 30);
        assert_eq!((last.page, last.position), (1, 30));
        let next = TaskSlot::from_index(30, 30);
        assert_eq!((next.page, next.position), (2, 1));
        let far = TaskSlot::from_index(4079, 30);
        assert_eq!((far.page, far.position), (136, 30));
    }

    #[test]
    fn test_total_tasks() {
        assert_eq!(WorkerPool::new(20, 30).total_tasks(136), 4080);
        assert_eq!(WorkerPool::new(0, 30).workers(), 1);
    }

    #[tokio::test]
    async fn test_every_task_processed_exactly_once() {
        let handler = Arc::new(RecordingHandler {
            delay: Duration::from_millis(1),
            ..RecordingHandler::default()
        });
        let report = WorkerPool::new(4, 30).run(3, Arc::clone(&handler)).await;

        assert_eq!(report, PoolReport { completed: 90, failed: 0 });

        let seen = handler.seen.lock().unwrap();
        let unique: HashSet<u64> = seen.iter().map(|slot| slot.index).collect();
        assert_eq!(seen.len(), 90);
        assert_eq!(unique.len(), 90);
    }

    #[tokio::test]
    async fn test_failed_task_does_not_stop_pool() {
        let handler = Arc::new(RecordingHandler {
            failing: HashSet::from([(1, 5)]),
            ..RecordingHandler::default()
        });
        let report = WorkerPool::new(2, 30).run(1, Arc::clone(&handler)).await;

        assert_eq!(report, PoolReport { completed: 29, failed: 1 });
        assert_eq!(report.total(), 30);
        assert_eq!(handler.seen.lock().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn test_zero_pages() {
        let handler = Arc::new(RecordingHandler::default());
        let report = WorkerPool::new(3, 30).run(0, Arc::clone(&handler)).await;
        assert_eq!(report, PoolReport::default());
    }
}
