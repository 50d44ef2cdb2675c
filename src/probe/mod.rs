//! Concurrent fetch-and-report subsystem
//!
//! One probe run fans a batch of randomly-sampled image fetches out over
//! tokio tasks, funnels completion reports through the shared progress
//! tracker, and hands the deduplicated identifier set to the validation
//! client.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!                  │     ProbeCoordinator     │
//!                  │  - samples work items    │
//!                  │  - owns identifier set   │
//!                  └────────────┬─────────────┘
//!                               │ spawn (unbounded, or semaphore-gated)
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//!  ┌─────▼─────┐          ┌─────▼─────┐          ┌─────▼─────┐
//!  │  Task 1   │          │  Task 2   │          │  Task N   │
//!  │  GET png  │          │  GET png  │          │  GET png  │
//!  └─────┬─────┘          └─────┬─────┘          └─────┬─────┘
//!        │                      │                      │
//!        └──────────────────────┼──────────────────────┘
//!                               ▼
//!                  ┌──────────────────────────┐
//!                  │     ProgressTracker      │
//!                  │  (mutex, max-merge)      │
//!                  └──────────────────────────┘
//! ```

pub mod coordinator;

pub use coordinator::{ProbeCoordinator, ProbeResult, ProbeStats, WorkItem};
