use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use spdlog::{debug, error, info, warn};

use crate::deferred_store::{DeferredPostRecord, DeferredPostStore, RecordId};
use crate::error::Result;
use crate::post::Post;
use crate::publisher::PostPublisher;
use crate::ticker::Ticker;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Outcome of one sweep over the due posts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub delivered: Vec<RecordId>,
    /// Records left in the store, with the reason, to be retried next sweep
    pub failed: Vec<(RecordId, String)>,
}

struct Sweeper {
    store: Arc<DeferredPostStore>,
    publisher: Arc<PostPublisher>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the sweep ends, however it ends.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Sweeper {
    fn try_begin(&self) -> Option<SweepGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SweepGuard(&self.in_flight))
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Option<SweepReport> {
        let Some(_guard) = self.try_begin() else {
            warn!("A sweep is already running, skipping this one");
            return None;
        };

        let mut report = SweepReport::default();
        let due = match self.store.enumerate_due(now).await {
            Ok(due) => due,
            Err(e) => {
                error!("Error listing scheduled posts: {}", e);
                return Some(report);
            }
        };

        if due.is_empty() {
            debug!("No scheduled posts due at {}", now);
            return Some(report);
        }

        info!("{} scheduled post(s) due", due.len());
        for record in due {
            self.deliver(record, &mut report).await;
        }

        Some(report)
    }

    async fn deliver(&self, record: DeferredPostRecord, report: &mut SweepReport) {
        let DeferredPostRecord { id, due, post } = record;

        if let Err(e) = self.publisher.publish(&post).await {
            warn!("Scheduled post '{}' ({}, due {}) was not delivered, will retry: {}",
                  &post.metadata.title, id, due, e);
            report.failed.push((id, e.to_string()));
            return;
        }

        if let Err(e) = self.store.remove(&id).await {
            // Left on disk, the post would be sent again on the next sweep
            error!("Post '{}' was delivered but record {} could not be removed: {}",
                   &post.metadata.title, id, e);
        }
        report.delivered.push(id);
    }
}

/// Delivers deferred posts once their due time is reached.
pub struct Scheduler {
    sweeper: Arc<Sweeper>,
    ticker: Ticker,
}

impl Scheduler {
    pub fn new(publisher: Arc<PostPublisher>, store: Arc<DeferredPostStore>, interval: Duration) -> Self {
        let sweeper = Sweeper {
            store,
            publisher,
            in_flight: AtomicBool::new(false),
        };

        Self {
            sweeper: Arc::new(sweeper),
            ticker: Ticker::new(interval),
        }
    }

    /// Validates the post and stores it for delivery at `at`.
    /// Nothing is written if the post is not valid.
    pub async fn schedule(&self, post: &Post, at: DateTime<Utc>) -> Result<RecordId> {
        self.sweeper.publisher.validate(post)?;
        self.sweeper.store.append(post, at).await
    }

    pub async fn pending(&self) -> Result<Vec<DeferredPostRecord>> {
        self.sweeper.store.list().await
    }

    /// Publishes every post due at `now` and removes the ones delivered.
    /// Returns `None` when another sweep is still running.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Option<SweepReport> {
        self.sweeper.sweep(now).await
    }

    /// Returns `false` if the scheduler was already running.
    pub fn start(&self) -> bool {
        let sweeper = self.sweeper.clone();
        let started = self.ticker.start(move || {
            let sweeper = sweeper.clone();
            async move {
                sweeper.sweep(Utc::now()).await;
            }
        });

        if started {
            info!("Scheduler started, checking every {}s", self.ticker.interval().as_secs());
        }
        started
    }

    /// Returns `false` if the scheduler was not running.
    pub fn stop(&self) -> bool {
        let stopped = self.ticker.stop().is_some();
        if stopped {
            info!("Scheduler stopped");
        }
        stopped
    }

    /// Stops the scheduler and waits for a sweep in progress to finish.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.ticker.stop() {
            if let Err(e) = handle.await {
                error!("Scheduler task ended abnormally: {}", e);
            }
            info!("Scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }
}
