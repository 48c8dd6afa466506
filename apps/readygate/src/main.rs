//! # readygate - Startup Readiness Gate
//!
//! Blocks the launch of a service until its dependencies are up, then
//! becomes that service.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────┐   ┌───────────┐
//! │ config file  │──▶│ DNS resolves  │──▶│ HTTP answers │──▶│  exec     │
//! │ (static)     │   │ (polling)     │   │ (polling)    │   │ successor │
//! └──────┬───────┘   └──────┬────────┘   └──────┬───────┘   └───────────┘
//!        └──────────────────┴───────────────────┘
//!                   any failure: exit 1
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Default plan: /app/config/local.js, api_sails, http://api_sails:1337/robots.txt
//! readygate run -- node app.js
//!
//! # Other target, short budget
//! readygate --target-host api --target-port 8080 --timeout-ms 30000 run -- ./server
//!
//! # Plan file, report only
//! readygate --plan gate.toml --json-mode check
//! ```

use clap::Parser;
use readygate::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse first so -v/-q can shape the default filter.
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help goes to stdout, rejections to stderr.
            let _ = e.print();
            std::process::exit(cli::parse_failure_exit_code(&e));
        }
    };

    init_tracing(default_filter(cli.verbose, cli.quiet));

    match cli::execute(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "readygate=warn"
    } else if verbose {
        "readygate=debug"
    } else {
        "readygate=info"
    }
}

/// Initialize tracing on stderr; stdout is left to the successor.
///
/// READYGATE_LOG_FORMAT=json enables machine-parseable output.
fn init_tracing(default_filter: &str) {
    let log_format = std::env::var("READYGATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
