//! Progress tracking and reporting for the probe run
//!
//! `ProgressTracker` serializes concurrent completion reports into a
//! monotonic percentage; `ProgressReporter` renders updates using an
//! indicatif progress bar.

use crate::api::ValidateResponse;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

/// Sink invoked for every progress advance, in advance order
pub type ProgressSink = Box<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// A single progress advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Highest completed unit index seen so far
    pub latest: u64,

    /// Total number of units in the run
    pub total: u64,

    /// Completion percentage, rounded up to a whole number
    pub percentage: u64,

    /// Set once the raw percentage passes 99.9
    pub wrapping_up: bool,
}

/// Shared monotonic progress counter
///
/// Many in-flight fetch tasks report concurrently; updates are
/// max-merged under a mutex so the counter never regresses and lost
/// updates are impossible. The sink runs inside the critical section,
/// so observers see percentages in non-decreasing order.
pub struct ProgressTracker {
    latest: Mutex<u64>,
    total: u64,
    sink: Option<ProgressSink>,
}

impl ProgressTracker {
    /// Create a tracker with no sink
    pub fn new(total: u64) -> Self {
        Self {
            latest: Mutex::new(0),
            total,
            sink: None,
        }
    }

    /// Create a tracker that forwards every advance to `sink`
    pub fn with_sink<F>(total: u64, sink: F) -> Self
    where
        F: Fn(&ProgressUpdate) + Send + Sync + 'static,
    {
        Self {
            latest: Mutex::new(0),
            total,
            sink: Some(Box::new(sink)),
        }
    }

    /// Report completion of one unit of work
    ///
    /// Safe to call concurrently from any number of tasks. Only the
    /// maximum completed index is meaningful: reports that do not
    /// advance the counter are dropped and produce no output.
    pub fn report_completion(&self, unit_index: u64) -> Option<ProgressUpdate> {
        let mut latest = self.latest.lock();
        let new_latest = unit_index.max(*latest);
        if new_latest == *latest {
            return None;
        }
        *latest = new_latest;

        let raw = new_latest as f64 / self.total as f64 * 100.0;
        let update = ProgressUpdate {
            latest: new_latest,
            total: self.total,
            percentage: raw.ceil() as u64,
            wrapping_up: raw > 99.9,
        };

        debug!(
            latest = update.latest,
            percentage = update.percentage,
            "Progress advanced"
        );
        if let Some(sink) = &self.sink {
            sink(&update);
        }
        Some(update)
    }

    /// Highest completed unit index seen so far
    pub fn latest(&self) -> u64 {
        *self.latest.lock()
    }

    /// Total number of units in the run
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Progress reporter that displays fetch status
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter for `total` work items
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Render one progress advance
    pub fn report(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.latest);
        self.bar.set_message(format!("Progress: {}%", update.percentage));
        if update.wrapping_up {
            self.bar.println("Wrapping up...");
        }
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let reversed: Vec<char> = n.to_string().chars().rev().collect();
    let mut out = String::new();
    for (i, c) in reversed.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out.chars().rev().collect()
}

/// Print a header at the start of the run
pub fn print_header(url: &str, iterations: u64, max_image_id: u64, session_token: &str) {
    println!();
    println!(
        "{} {}",
        style("image-prober").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Server:").bold(), url);
    println!("  {} {}", style("Iterations:").bold(), format_number(iterations));
    println!("  {} image_1..image_{}", style("ID space:").bold(), max_image_id);
    println!("  {} {}", style("Session:").bold(), session_token);
    println!();
}

/// Print a summary of the probe results
pub fn print_summary(
    iterations: u64,
    distinct_ids: usize,
    images_fetched: u64,
    fetch_errors: u64,
    bytes_fetched: u64,
    duration: Duration,
) {
    let duration_secs = duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        iterations as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Probe Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Work items:").bold(),
        format_number(iterations)
    );
    println!(
        "  {} {}",
        style("Distinct IDs:").bold(),
        format_number(distinct_ids as u64)
    );
    println!(
        "  {} {}",
        style("Fetched:").bold(),
        format_number(images_fetched)
    );
    if fetch_errors > 0 {
        println!(
            "  {} {}",
            style("Fetch errors:").yellow().bold(),
            format_number(fetch_errors)
        );
    }
    println!(
        "  {} {}",
        style("Downloaded:").bold(),
        format_size(bytes_fetched, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} fetches/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    println!();
}

/// Print the server's validation verdict
pub fn print_verdict(response: &ValidateResponse) {
    println!();
    if response.success {
        println!("{}", style("✓ Validation passed").green().bold());
        return;
    }

    println!("{}", style("✗ Validation failed").red().bold());
    if let Some(violations) = &response.violations {
        for v in violations {
            println!(
                "  {} {}",
                style(&v.image_id).yellow().bold(),
                v.reason
            );
            println!(
                "    requests: {}  success: {}  failed: {}",
                v.total_requests, v.success, v.failed
            );
        }
    }
}
