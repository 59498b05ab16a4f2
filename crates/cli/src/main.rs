//! `triage` -- command-line client for the assignment-efficiency backend.
//!
//! Compares AI-driven and manual ticket assignment, manages assignees and
//! runs validated data imports with live progress.
//!
//! # Environment variables
//!
//! | Variable                      | Default                            |
//! |-------------------------------|------------------------------------|
//! | `TRIAGE_API_BASE_URL`         | `http://localhost:8080/api/v1`     |
//! | `TRIAGE_WS_URL`               | `ws://localhost:8080/ws/dashboard` |
//! | `TRIAGE_REQUEST_TIMEOUT_SECS` | `30`                               |
//! | `TRIAGE_POLL_INTERVAL_MS`     | `2000`                             |
//! | `TRIAGE_POLL_GRACE_MS`        | `2000`                             |
//! | `TRIAGE_TOKEN_FILE`           | `~/.triage/auth_token`             |

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod session;
mod table;

const DEFAULT_LOG_FILTER: &str = "triage=info,triage_client=info,triage_importer=info";
const VERBOSE_LOG_FILTER: &str = "triage=debug,triage_client=debug,triage_importer=debug";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = app::Cli::parse();
    init_logging(cli.verbose);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", commands::describe_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so tables on stdout stay pipeable.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
