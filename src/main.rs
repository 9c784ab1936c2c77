//! # News Monitor
//!
//! A single-run batch job that fetches a news feed, emails a daily digest,
//! and sends an alert for every monitored keyword that shows up in the
//! headlines. Delivery goes through the Brevo transactional email API.
//!
//! There is no scheduler, server or state here: run it from cron, a CI
//! workflow or a cloud scheduler and read the logs and exit status.
//!
//! ## Usage
//!
//! ```sh
//! BREVO_API_KEY=xkeysib-... MONITORED_KEYWORDS=ilkyar news_monitor
//! ```
//!
//! ## Pipeline
//!
//! 1. **Configure**: flags, environment, optional YAML file (fatal on error)
//! 2. **Fetch**: one request for top stories (soft failure → no articles)
//! 3. **Digest**: render and send to the daily recipients
//! 4. **Alerts**: per keyword, optionally search, match, render and send
//!
//! ## Exit status
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success, or partial failure with `--allow-partial-failure` |
//! | 1 | Configuration error, nothing was sent |
//! | 2 | A fetch or send failed |

use chrono::Local;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod feed;
mod mailer;
mod matcher;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use config::Config;
use feed::GoogleNewsFeed;
use mailer::{BrevoMailer, DryRunMailer};
use pipeline::{EXIT_CONFIG_ERROR, RunReport, StepOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "news_monitor starting up");

    let args = match Cli::try_parse_env() {
        Ok(args) => args,
        Err(e) => match parse_failure_status(&e) {
            None => e.exit(),
            Some(status) => {
                error!(
                    kind = ?e.kind(),
                    "Invalid command line or environment: {}",
                    e.to_string().trim_end()
                );
                return ExitCode::from(status);
            }
        },
    };

    let config = match Config::load(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error; aborting before any network call");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    debug!(?config, "Resolved configuration");
    info!(
        keywords = ?config.keywords,
        language = %config.language,
        dry_run = config.dry_run,
        "Configuration loaded"
    );

    let feed = match GoogleNewsFeed::new(&config) {
        Ok(feed) => feed,
        Err(e) => {
            error!(error = %e, "Failed to set up feed client");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let now = Local::now().naive_local();
    let report = if config.dry_run {
        pipeline::run(&config, &feed, &DryRunMailer, now).await
    } else {
        let mailer = match BrevoMailer::new(&config) {
            Ok(mailer) => mailer,
            Err(e) => {
                error!(error = %e, "Failed to set up email client");
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        };
        pipeline::run(&config, &feed, &mailer, now).await
    };

    log_summary(&report);

    let elapsed = start_time.elapsed();
    let status = report.exit_status(config.allow_partial_failure);
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        exit_status = status,
        "Execution complete"
    );
    report.exit_code(config.allow_partial_failure)
}

/// Exit status for arguments that did not parse, or `None` for help and
/// version output, which clap prints and exits on itself.
fn parse_failure_status(err: &clap::Error) -> Option<u8> {
    (!cli::is_informational(err)).then_some(EXIT_CONFIG_ERROR)
}

fn log_summary(report: &RunReport) {
    let digest = match &report.digest {
        StepOutcome::Sent(delivery) => {
            debug!(message_id = ?delivery.message_id, "Digest delivered");
            "sent"
        }
        StepOutcome::Skipped(reason) => *reason,
        StepOutcome::Failed(e) => {
            debug!(error = %e, "Digest not delivered");
            "failed"
        }
    };
    info!(
        articles = report.articles_fetched,
        digest,
        alerts_evaluated = report.alerts.len(),
        alerts_sent = report.alerts_sent(),
        "Run summary"
    );
    for alert in &report.alerts {
        debug!(
            keyword = %alert.keyword,
            matches = alert.matches,
            outcome = ?alert.outcome,
            "Alert result"
        );
    }
    if report.has_failures() {
        warn!(
            fetch_failures = report.fetch_failures(),
            send_failures = report.send_failures(),
            "Run finished with failures"
        );
    }
}
