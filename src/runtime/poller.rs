//! Long-poll loop feeding updates to the runtime

use super::executor::BotRuntime;
use super::traits::{BotApi, CatalogStore};
use crate::telegram::{ApiError, Update};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Fetches update batches and hands them to the runtime one at a time.
///
/// The cursor always moves past every update in a fetched batch, whether or
/// not handling it succeeded, so no update is delivered twice.
pub struct Poller<A, S>
where
    A: BotApi + 'static,
    S: CatalogStore + 'static,
{
    api: Arc<A>,
    runtime: Arc<Mutex<BotRuntime<A, S>>>,
    offset: AtomicI64,
    in_flight: AtomicBool,
    retry_delay: Duration,
}

/// Clears the in-flight flag when dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A, S> Poller<A, S>
where
    A: BotApi + 'static,
    S: CatalogStore + 'static,
{
    pub fn new(api: Arc<A>, runtime: BotRuntime<A, S>, retry_delay: Duration) -> Self {
        Self {
            api,
            runtime: Arc::new(Mutex::new(runtime)),
            offset: AtomicI64::new(0),
            in_flight: AtomicBool::new(false),
            retry_delay,
        }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn runtime(&self) -> &Arc<Mutex<BotRuntime<A, S>>> {
        &self.runtime
    }

    /// Next update id to request
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::Acquire)
    }

    /// Fetch and process a single batch.
    ///
    /// Returns `Ok(None)` without fetching when a poll is already running.
    #[allow(dead_code)] // Used by tests
    pub async fn poll_once(&self) -> Result<Option<usize>, ApiError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("Poll already in flight, skipping");
            return Ok(None);
        };
        let updates = self.api.get_updates(self.offset()).await?;
        let count = updates.len();
        self.process(updates).await;
        Ok(Some(count))
    }

    /// Poll until cancelled.
    ///
    /// Returns false without polling if another poll is in flight.
    /// Cancellation is only observed while waiting for updates, so a
    /// fetched batch is always processed in full.
    pub async fn run(&self, cancel: CancellationToken) -> bool {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::warn!("Polling already running");
            return false;
        };
        tracing::info!(offset = self.offset(), "Polling for updates");

        loop {
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                fetched = self.api.get_updates(self.offset()) => fetched,
            };

            match fetched {
                Ok(updates) => self.process(updates).await,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        retryable = e.kind.is_retryable(),
                        delay_secs = self.retry_delay.as_secs_f64(),
                        "Failed to fetch updates, retrying"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        tracing::info!(offset = self.offset(), "Polling stopped");
        true
    }

    async fn process(&self, updates: Vec<Update>) {
        if updates.is_empty() {
            return;
        }
        tracing::debug!(count = updates.len(), "Processing updates");

        let mut runtime = self.runtime.lock().await;
        for update in updates {
            self.offset.fetch_max(update.update_id + 1, Ordering::AcqRel);
            runtime.handle_update(update).await;
        }
    }
}
