//! Decides when the cache is (re)filled.
//!
//! Policy:
//!
//! - An empty cache is filled before the request that found it empty is
//!   served. Concurrent requests share that single fetch, and its error
//!   when it fails: callers that queued behind a failed attempt do not start
//!   one of their own.
//! - A filled cache is served as is, whatever its age. There is no timer.
//! - [`Refresher::refresh`] replaces the bundle on demand. If it fails the
//!   previous bundle stays in place.
//! - A failed fetch never touches the cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::DataCache;
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::client::UpstreamClient;
use crate::error::{FetchError, FetchResult};

/// Fills a [`DataCache`] from the primary upstream.
#[derive(Debug)]
pub struct Refresher {
    client: UpstreamClient,
    cache: Arc<DataCache>,
    deadline: Duration,
    /// Serializes fetches. Holds the error of the last attempt, if it failed.
    fetch_lock: Mutex<Option<String>>,
    /// Completed fetch attempts.
    attempts: AtomicU64,
}

impl Refresher {
    /// `deadline` bounds one whole four-way fetch.
    pub fn new(client: UpstreamClient, cache: Arc<DataCache>, deadline: Duration) -> Self {
        Self {
            client,
            cache,
            deadline,
            fetch_lock: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &Arc<DataCache> {
        &self.cache
    }

    /// Fill the cache if it was never filled.
    ///
    /// Returns immediately when it holds data. Otherwise fetches, unless
    /// an attempt finished while this caller waited for the lock: then that
    /// attempt's outcome is returned instead.
    pub async fn ensure_populated(&self) -> FetchResult<()> {
        if !self.cache.is_empty() {
            return Ok(());
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.fetch_lock.lock().await;
        if !self.cache.is_empty() {
            return Ok(());
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(message) = last_failure.as_ref() {
                return Err(FetchError::Shared(message.clone()));
            }
        }

        self.fetch_and_store(self.deadline, &mut last_failure).await.map(|_| ())
    }

    /// Replace the cached bundle. Returns the new artist count.
    pub async fn refresh(&self) -> FetchResult<usize> {
        let mut last_failure = self.fetch_lock.lock().await;
        self.fetch_and_store(self.deadline, &mut last_failure).await
    }

    /// Startup fill, bounded by `timeout`. Failure is only a warning: the
    /// first request will try again.
    pub async fn prefetch(&self, timeout: Duration) -> FetchResult<usize> {
        let mut last_failure = self.fetch_lock.lock().await;
        let result = self.fetch_and_store(timeout, &mut last_failure).await;
        if let Err(ref err) = result {
            log_warning(format!("Prefetch failed, will retry on first request: {err}"));
        }
        result
    }

    /// One fetch attempt. Must be called with `fetch_lock` held; its guarded
    /// value is passed in as `last_failure`.
    async fn fetch_and_store(
        &self,
        deadline: Duration,
        last_failure: &mut Option<String>,
    ) -> FetchResult<usize> {
        log_info(format!("Fetching upstream data from {}", self.client.base_url()));

        let outcome = tokio::time::timeout(deadline, self.client.fetch_all())
            .await
            .unwrap_or(Err(FetchError::TimedOut(deadline)));

        *last_failure = outcome.as_ref().err().map(ToString::to_string);
        self.attempts.fetch_add(1, Ordering::Release);

        match outcome {
            Ok(bundle) => {
                let artists = bundle.artists.len();
                log_info_indent(
                    format!(
                        "{} artists, {} locations, {} dates, {} relations",
                        artists,
                        bundle.locations.len(),
                        bundle.dates.len(),
                        bundle.relations.len()
                    ),
                    1,
                );
                self.cache.set(bundle);
                log_success(format!("Cache refreshed with {artists} artists"));
                Ok(artists)
            }
            Err(err) => {
                log_error(format!("Upstream fetch failed: {err}"));
                Err(err)
            }
        }
    }
}
