//! Probe coordinator - orchestrates one concurrent fetch-and-report run
//!
//! The coordinator samples the work items up front (accumulating the
//! identifier set single-threaded, before any task starts), fans the
//! fetches out over tokio tasks, and rendezvouses on all of them before
//! the set is used. Fetch failures are tolerated per work item; the
//! identifier still counts as touched.

use crate::config::ProbeConfig;
use crate::error::{FetchOutcome, ProberError, Result};
use crate::fetch::{image_url, ImageFetcher};
use crate::progress::{ProgressTracker, ProgressUpdate};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// One randomly-sampled fetch work item
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// 1-based index within the run
    pub index: u64,

    /// Sampled image identifier (`image_<n>`)
    pub image_id: String,
}

/// Statistics collected during the run
#[derive(Debug, Default)]
pub struct ProbeStats {
    pub images_fetched: AtomicU64,
    pub fetch_errors: AtomicU64,
    pub bytes_fetched: AtomicU64,
}

impl ProbeStats {
    pub fn record_fetch(&self, bytes: u64) {
        self.images_fetched.fetch_add(1, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Result of a completed probe run
#[derive(Debug)]
pub struct ProbeResult {
    /// Deduplicated identifiers touched by the run's work items
    pub image_ids: BTreeSet<String>,

    /// Work items actually dispatched
    pub iterations: u64,

    pub images_fetched: u64,
    pub fetch_errors: u64,
    pub bytes_fetched: u64,
    pub duration: Duration,
    pub completed: bool,
}

/// Coordinates one full probe run
pub struct ProbeCoordinator {
    config: Arc<ProbeConfig>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<ProbeStats>,
}

impl ProbeCoordinator {
    /// Create a new coordinator
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(ProbeStats::default()),
        }
    }

    /// Get shutdown flag for signal handlers
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Sample the run's work items, with replacement
    ///
    /// The identifier set is fixed here; fetch outcomes never change it.
    fn sample_work_items(&self) -> (Vec<WorkItem>, BTreeSet<String>) {
        let mut rng = rand::rng();
        let mut image_ids = BTreeSet::new();
        let items = (1..=self.config.iterations)
            .map(|index| {
                let image_id =
                    format!("image_{}", rng.random_range(1..=self.config.max_image_id));
                image_ids.insert(image_id.clone());
                WorkItem { index, image_id }
            })
            .collect();
        (items, image_ids)
    }

    /// Run the probe: fan out, fetch, report, rendezvous
    ///
    /// `on_progress` is invoked for every progress advance, in advance
    /// order. Every work item is launched at once unless the config caps
    /// in-flight fetches.
    pub async fn run<F>(&self, fetcher: Arc<dyn ImageFetcher>, on_progress: F) -> Result<ProbeResult>
    where
        F: Fn(&ProgressUpdate) + Send + Sync + 'static,
    {
        let start_time = Instant::now();
        let start_datetime: DateTime<Utc> = Utc::now();

        info!(
            server = %self.config.server_url.to_display_string(),
            iterations = self.config.iterations,
            max_image_id = self.config.max_image_id,
            max_in_flight = ?self.config.max_in_flight,
            "Starting validation run"
        );
        debug!(start_time = %start_datetime.to_rfc3339(), "Probe started");

        let (work_items, image_ids) = self.sample_work_items();

        let tracker = Arc::new(ProgressTracker::with_sink(
            self.config.iterations,
            on_progress,
        ));
        let semaphore = self
            .config
            .max_in_flight
            .map(|limit| Arc::new(Semaphore::new(limit)));
        let base = self.config.server_url.base();
        let token = self.config.session_token.clone();

        let mut handles = Vec::with_capacity(work_items.len());
        let mut dispatched = 0u64;

        for item in work_items {
            if self.shutdown.load(Ordering::Relaxed) {
                warn!(dispatched, "Shutdown requested, stopping dispatch");
                break;
            }

            let permit = match &semaphore {
                Some(sem) => Some(
                    Arc::clone(sem)
                        .acquire_owned()
                        .await
                        .expect("Semaphore closed"),
                ),
                None => None,
            };

            let url = image_url(&base, &item.image_id, &token);
            let fetcher = Arc::clone(&fetcher);
            let tracker = Arc::clone(&tracker);
            let stats = Arc::clone(&self.stats);

            dispatched += 1;
            handles.push(tokio::spawn(async move {
                let outcome = match fetcher.fetch_image(&url).await {
                    Ok(bytes) => {
                        stats.record_fetch(bytes.len() as u64);
                        FetchOutcome::Fetched {
                            image_id: item.image_id,
                            bytes: bytes.len() as u64,
                        }
                    }
                    Err(error) => {
                        stats.record_error();
                        FetchOutcome::Failed {
                            image_id: item.image_id,
                            error,
                        }
                    }
                };

                if let FetchOutcome::Failed { image_id, error } = &outcome {
                    // Tolerated: the identifier was counted at generation time
                    warn!(image_id = %image_id, error = %error, "Image fetch failed");
                }

                tracker.report_completion(item.index);
                drop(permit);
                outcome
            }));
        }

        // Fan-in: every task finishes before the set is used
        for handle in handles {
            handle
                .await
                .map_err(|e| ProberError::Worker(e.to_string()))?;
        }

        let images_fetched = self.stats.images_fetched.load(Ordering::Relaxed);
        let fetch_errors = self.stats.fetch_errors.load(Ordering::Relaxed);
        let bytes_fetched = self.stats.bytes_fetched.load(Ordering::Relaxed);
        let duration = start_time.elapsed();
        let completed = dispatched == self.config.iterations;

        info!(
            dispatched,
            distinct_ids = image_ids.len(),
            images_fetched,
            fetch_errors,
            duration_secs = duration.as_secs(),
            "Probe run finished"
        );

        Ok(ProbeResult {
            image_ids,
            iterations: dispatched,
            images_fetched,
            fetch_errors,
            bytes_fetched,
            duration,
            completed,
        })
    }
}
