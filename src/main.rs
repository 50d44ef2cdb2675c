//! image-prober - Concurrent Image Server Validation Probe
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use image_prober::api::ValidationClient;
use image_prober::config::{CliArgs, ProbeConfig};
use image_prober::fetch::HttpImageFetcher;
use image_prober::probe::ProbeCoordinator;
use image_prober::progress::{print_header, print_summary, print_verdict, ProgressReporter};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = ProbeConfig::from_args(args).context("Invalid configuration")?;

    // Print header
    if config.show_progress {
        print_header(
            &config.server_url.to_display_string(),
            config.iterations,
            config.max_image_id,
            &config.session_token,
        );
    }

    // Create tokio runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(run_inner(config))
}

/// Run one full validation cycle: reset, fetch batch, validate, report
async fn run_inner(config: ProbeConfig) -> Result<bool> {
    // One shared HTTP client for fetches and the validation API
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let fetcher = Arc::new(HttpImageFetcher::new(client.clone()));
    let api = ValidationClient::new(client, &config.server_url);
    let coordinator = ProbeCoordinator::new(config.clone());

    // Setup signal handler for graceful shutdown
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Create progress reporter
    let reporter = if config.show_progress {
        Some(Arc::new(ProgressReporter::new(config.iterations)))
    } else {
        None
    };

    // Reset server-side bookkeeping; failure here aborts the run
    if let Some(ref r) = reporter {
        r.set_status("Resetting validation state...");
    }
    api.reset()
        .await
        .context("Failed to reset validation state")?;

    // Run the fetch batch
    let progress_reporter = reporter.clone();
    let result = coordinator
        .run(fetcher, move |update| {
            if let Some(ref r) = progress_reporter {
                r.report(update);
            }
        })
        .await
        .context("Probe run failed")?;

    // Finish progress
    if let Some(ref r) = reporter {
        if result.completed {
            r.finish("Fetch phase completed");
        } else {
            r.finish("Fetch phase interrupted");
        }
    }

    // Submit the identifier set; failure here aborts the run
    let response = api
        .validate(&result.image_ids, &config.session_token)
        .await
        .context("Validation submission failed")?;

    print_verdict(&response);
    print_summary(
        result.iterations,
        result.image_ids.len(),
        result.images_fetched,
        result.fetch_errors,
        result.bytes_fetched,
        result.duration,
    );

    if !result.completed {
        info!("Run was interrupted before completion");
    }

    if result.fetch_errors > 0 {
        info!(errors = result.fetch_errors, "Run completed with fetch errors");
    }

    Ok(response.success)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("image_prober=debug,warn")
    } else {
        EnvFilter::new("image_prober=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
