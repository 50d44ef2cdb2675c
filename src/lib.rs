//! image-prober - Concurrent Image Server Validation Probe
//!
//! A tool that exercises a remote test image server: it fetches a batch
//! of images by randomly-sampled ID concurrently, tracks progress as the
//! fetches complete, then submits the observed set of image IDs to the
//! server's validation endpoint and reports the pass/fail verdict.
//!
//! # Features
//!
//! - **Concurrent Fan-Out**: One tokio task per work item, launched all
//!   at once by default, with an optional semaphore-gated in-flight cap.
//!
//! - **Monotonic Progress**: Completion reports from racing tasks are
//!   max-merged under a mutex, so the reported percentage never
//!   regresses regardless of completion order.
//!
//! - **Tolerant Fetching**: An individual fetch failure is logged and
//!   counted, but never aborts the batch; the sampled identifier counts
//!   as touched either way.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Test Image Server                           │
//! │      GET /test-tasks/get-image/<id>.png    POST /validate        │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ProbeCoordinator                            │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │ Task 1  │  │ Task 2  │  │ Task 3  │  ...    │ Task N  │     │
//! │  │ GET png │  │ GET png │  │ GET png │         │ GET png │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       │            │            │                    │          │
//! │       └────────────┴─────┬──────┴────────────────────┘          │
//! │                          ▼                                      │
//! │            ┌──────────────────────────┐                         │
//! │            │     ProgressTracker      │                         │
//! │            │  (monotonic max-merge)   │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ identifier set
//!                               ▼
//!                    ┌──────────────────┐
//!                    │ ValidationClient │
//!                    │  POST /validate  │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Default run: 100 iterations over image_1..image_10
//! image-prober
//!
//! # Larger batch against a local server, capped at 64 in flight
//! image-prober http://localhost:8080 -i 1000 --max-image-id 100 -c 64
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod probe;
pub mod progress;

pub use config::{CliArgs, ProbeConfig, ServerUrl};
pub use error::{ProberError, Result};
pub use probe::{ProbeCoordinator, ProbeResult};
