//! Configuration types for image-prober
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Server base-URL parsing

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

/// Maximum reasonable iteration count
const MAX_ITERATIONS: u64 = 1_000_000;

/// Maximum in-flight request cap
const MAX_IN_FLIGHT: usize = 4096;

/// Default test server
const DEFAULT_SERVER: &str = "https://test-tasks.myplantin.com";

/// Regex for parsing server base URLs
static SERVER_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: http(s)://host[:port][/path]
    Regex::new(r"^(https?)://([^:/\s]+)(:\d+)?(/[^\s]*)?$").expect("Invalid server URL regex")
});

/// Concurrent validation probe for the test-tasks image server
#[derive(Parser, Debug, Clone)]
#[command(
    name = "image-prober",
    version,
    about = "Concurrent validation probe for the test-tasks image server",
    long_about = "Fetches a batch of randomly-sampled images from a test server, tracking\n\
                  progress as the concurrent fetches complete, then submits the observed\n\
                  set of image IDs to the server's validation endpoint and reports the\n\
                  pass/fail verdict.",
    after_help = "EXAMPLES:\n    \
        image-prober\n    \
        image-prober -i 1000 --max-image-id 100\n    \
        image-prober http://localhost:8080 -i 500 -c 64\n    \
        image-prober --session-token my-run-42 -v"
)]
pub struct CliArgs {
    /// Server base URL (http://host[:port][/path])
    #[arg(value_name = "SERVER_URL", default_value = DEFAULT_SERVER)]
    pub server_url: String,

    /// Number of fetch work items to launch
    #[arg(short = 'i', long, default_value = "100", value_name = "NUM")]
    pub iterations: u64,

    /// Image ID space size; IDs are sampled uniformly from [1, NUM]
    #[arg(long, default_value = "10", value_name = "NUM")]
    pub max_image_id: u64,

    /// Cap concurrent in-flight fetches (default: unbounded)
    #[arg(short = 'c', long, value_name = "NUM")]
    pub max_in_flight: Option<usize>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub timeout: u64,

    /// Session token correlating the run's requests (default: fresh UUID)
    #[arg(long, value_name = "TOKEN")]
    pub session_token: Option<String>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-fetch errors and debug detail)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Parsed server base URL components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl {
    /// URL scheme (http or https)
    pub scheme: String,

    /// Server hostname or IP
    pub host: String,

    /// Optional port
    pub port: Option<u16>,

    /// Path prefix without trailing slash (may be empty)
    pub path: String,
}

impl ServerUrl {
    /// Parse a server base URL string
    ///
    /// Accepts formats:
    /// - http://server
    /// - https://server/prefix
    /// - http://server:8080
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();

        let caps = SERVER_URL_REGEX
            .captures(url)
            .ok_or_else(|| ConfigError::InvalidServerUrl {
                url: url.to_string(),
                reason: "Expected format: http(s)://host[:port][/path]".into(),
            })?;

        let scheme = caps
            .get(1)
            .ok_or_else(|| ConfigError::InvalidServerUrl {
                url: url.to_string(),
                reason: "Missing scheme".into(),
            })?
            .as_str()
            .to_string();

        let host = caps
            .get(2)
            .ok_or_else(|| ConfigError::InvalidServerUrl {
                url: url.to_string(),
                reason: "Missing host".into(),
            })?
            .as_str()
            .to_string();

        let port = match caps.get(3) {
            Some(m) => Some(
                m.as_str()
                    .trim_start_matches(':')
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidServerUrl {
                        url: url.to_string(),
                        reason: "Port out of range".into(),
                    })?,
            ),
            None => None,
        };

        let path = caps
            .get(4)
            .map(|m| m.as_str().trim_end_matches('/').to_string())
            .unwrap_or_default();

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }

    /// The base URL with no trailing slash, used to build endpoint URLs
    pub fn base(&self) -> String {
        match self.port {
            Some(p) => format!("{}://{}:{}{}", self.scheme, self.host, p, self.path),
            None => format!("{}://{}{}", self.scheme, self.host, self.path),
        }
    }

    /// Format for display
    pub fn to_display_string(&self) -> String {
        self.base()
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Parsed server base URL
    pub server_url: ServerUrl,

    /// Number of fetch work items
    pub iterations: u64,

    /// Image ID space size
    pub max_image_id: u64,

    /// Optional cap on concurrent in-flight fetches
    pub max_in_flight: Option<usize>,

    /// HTTP request timeout (seconds)
    pub timeout_secs: u64,

    /// Session token for the run
    pub session_token: String,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl ProbeConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let server_url = ServerUrl::parse(&args.server_url)?;

        if args.iterations == 0 || args.iterations > MAX_ITERATIONS {
            return Err(ConfigError::InvalidIterations {
                count: args.iterations,
                max: MAX_ITERATIONS,
            });
        }

        if args.max_image_id == 0 {
            return Err(ConfigError::InvalidIdSpace {
                size: args.max_image_id,
            });
        }

        if let Some(limit) = args.max_in_flight {
            if limit == 0 || limit > MAX_IN_FLIGHT {
                return Err(ConfigError::InvalidInFlightLimit {
                    limit,
                    max: MAX_IN_FLIGHT,
                });
            }
        }

        if args.timeout == 0 {
            return Err(ConfigError::InvalidTimeout { secs: args.timeout });
        }

        let session_token = match args.session_token {
            Some(token) => {
                if token.trim().is_empty() {
                    return Err(ConfigError::EmptySessionToken);
                }
                token
            }
            None => Uuid::new_v4().to_string(),
        };

        Ok(Self {
            server_url,
            iterations: args.iterations,
            max_image_id: args.max_image_id,
            max_in_flight: args.max_in_flight,
            timeout_secs: args.timeout,
            session_token,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}
