use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use spdlog::debug;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Calls a callback at a fixed interval on a background task.
///
/// The first call happens right after `start`. Calls never overlap: a tick
/// that comes due while the callback is still running is skipped. Stopping
/// only prevents future calls, a callback already running completes.
pub struct Ticker {
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `false` if the ticker was already running.
    pub fn start<F, Fut>(&self, callback: F) -> bool
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }
                callback().await;
            }
            debug!("Ticker stopped");
        });

        *running = Some(Running { token, handle });
        true
    }

    /// Returns the handle of the stopped task, or `None` if nothing was running.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner).take()?;
        running.token.cancel();
        Some(running.handle)
    }

    pub fn is_running(&self) -> bool {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            running.token.cancel();
        }
    }
}
