//! Integration tests for image-prober
//!
//! The probe run is driven end to end with mock fetchers; no network is
//! required. The validation wire format is covered by unit tests in
//! `src/api.rs`.

use async_trait::async_trait;
use image_prober::config::{CliArgs, ProbeConfig, ServerUrl};
use image_prober::error::{FetchError, FetchResult};
use image_prober::fetch::ImageFetcher;
use image_prober::probe::ProbeCoordinator;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn test_config(iterations: u64, max_image_id: u64, max_in_flight: Option<usize>) -> ProbeConfig {
    ProbeConfig::from_args(CliArgs {
        server_url: "https://host.example".into(),
        iterations,
        max_image_id,
        max_in_flight,
        timeout: 30,
        session_token: Some("test-token".into()),
        quiet: true,
        verbose: false,
    })
    .unwrap()
}

/// Fetcher that always returns a tiny payload
struct OkFetcher;

#[async_trait]
impl ImageFetcher for OkFetcher {
    async fn fetch_image(&self, _url: &str) -> FetchResult<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// Fetcher that always fails
struct FailingFetcher;

#[async_trait]
impl ImageFetcher for FailingFetcher {
    async fn fetch_image(&self, url: &str) -> FetchResult<Vec<u8>> {
        Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: 503,
        })
    }
}

/// Fetcher that records every URL it is asked for
struct RecordingFetcher {
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageFetcher for RecordingFetcher {
    async fn fetch_image(&self, url: &str) -> FetchResult<Vec<u8>> {
        self.urls.lock().push(url.to_string());
        Ok(Vec::new())
    }
}

/// Fetcher that tracks how many requests are in flight at once
struct GateFetcher {
    current: AtomicUsize,
    max_seen: AtomicUsize,
}

#[async_trait]
impl ImageFetcher for GateFetcher {
    async fn fetch_image(&self, _url: &str) -> FetchResult<Vec<u8>> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![0u8; 16])
    }
}

#[test]
fn test_server_url_parsing() {
    let url = ServerUrl::parse("https://test-tasks.myplantin.com").unwrap();
    assert_eq!(url.host, "test-tasks.myplantin.com");
    assert_eq!(url.base(), "https://test-tasks.myplantin.com");

    let url = ServerUrl::parse("http://localhost:8080/api").unwrap();
    assert_eq!(url.port, Some(8080));
    assert_eq!(url.base(), "http://localhost:8080/api");

    assert!(ServerUrl::parse("nfs://server/export").is_err());
}

#[tokio::test]
async fn test_run_collects_identifier_set() {
    let coordinator = ProbeCoordinator::new(test_config(200, 5, None));
    let result = coordinator.run(Arc::new(OkFetcher), |_| {}).await.unwrap();

    assert!(result.completed);
    assert_eq!(result.iterations, 200);
    assert_eq!(result.images_fetched, 200);
    assert_eq!(result.fetch_errors, 0);
    assert!(result.bytes_fetched > 0);

    assert!(!result.image_ids.is_empty());
    assert!(result.image_ids.len() <= 5);
    for id in &result.image_ids {
        let n: u64 = id.strip_prefix("image_").unwrap().parse().unwrap();
        assert!((1..=5).contains(&n));
    }
}

#[tokio::test]
async fn test_fetch_failures_do_not_affect_the_set() {
    let coordinator = ProbeCoordinator::new(test_config(200, 5, None));
    let result = coordinator
        .run(Arc::new(FailingFetcher), |_| {})
        .await
        .unwrap();

    // Every fetch failed, yet the run completed and the identifier set
    // was built exactly as if the fetches had succeeded
    assert!(result.completed);
    assert_eq!(result.fetch_errors, 200);
    assert_eq!(result.images_fetched, 0);
    assert!(!result.image_ids.is_empty());
    assert!(result.image_ids.len() <= 5);
}

#[tokio::test]
async fn test_single_id_space_collapses_to_one_member() {
    let coordinator = ProbeCoordinator::new(test_config(50, 1, None));
    let result = coordinator.run(Arc::new(OkFetcher), |_| {}).await.unwrap();

    assert_eq!(result.image_ids.len(), 1);
    assert!(result.image_ids.contains("image_1"));
}

#[tokio::test]
async fn test_fetch_urls_embed_identifier_and_token() {
    let fetcher = Arc::new(RecordingFetcher {
        urls: Mutex::new(Vec::new()),
    });
    let coordinator = ProbeCoordinator::new(test_config(25, 3, None));
    let result = coordinator
        .run(Arc::clone(&fetcher) as Arc<dyn ImageFetcher>, |_| {})
        .await
        .unwrap();

    let urls = fetcher.urls.lock();
    assert_eq!(urls.len(), 25);
    for url in urls.iter() {
        assert!(url.starts_with("https://host.example/test-tasks/get-image/image_"));
        assert!(url.ends_with(".png?session-token=test-token"));
    }
    drop(urls);
    assert!(result.completed);
}

#[tokio::test]
async fn test_in_flight_cap_is_honored() {
    let fetcher = Arc::new(GateFetcher {
        current: AtomicUsize::new(0),
        max_seen: AtomicUsize::new(0),
    });
    let coordinator = ProbeCoordinator::new(test_config(60, 10, Some(4)));
    let result = coordinator
        .run(Arc::clone(&fetcher) as Arc<dyn ImageFetcher>, |_| {})
        .await
        .unwrap();

    assert!(result.completed);
    assert_eq!(result.images_fetched, 60);
    assert!(fetcher.max_seen.load(Ordering::SeqCst) <= 4);
}

#[tokio::test]
async fn test_progress_reports_are_monotonic() {
    let percentages = Arc::new(Mutex::new(Vec::new()));
    let sink_percentages = Arc::clone(&percentages);

    let coordinator = ProbeCoordinator::new(test_config(100, 10, None));
    let result = coordinator
        .run(Arc::new(OkFetcher), move |update| {
            sink_percentages.lock().push(update.percentage);
        })
        .await
        .unwrap();

    assert!(result.completed);
    let percentages = percentages.lock();
    assert!(!percentages.is_empty());
    assert!(percentages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*percentages.last().unwrap(), 100);
}

#[tokio::test]
async fn test_pending_shutdown_stops_dispatch() {
    let coordinator = ProbeCoordinator::new(test_config(100, 10, None));
    coordinator.shutdown_flag().store(true, Ordering::SeqCst);

    let result = coordinator.run(Arc::new(OkFetcher), |_| {}).await.unwrap();
    assert!(!result.completed);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.images_fetched, 0);
}
