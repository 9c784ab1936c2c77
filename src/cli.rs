//! Command-line interface definitions for News Monitor.
//!
//! Every option can come from a flag or an environment variable, so a bare
//! `news_monitor` invocation from cron or a CI job is fully driven by the
//! environment. Nothing here has a default: defaults are applied in
//! [`crate::config`] after the optional YAML file has been merged in.
//!
//! An environment variable that is set but blank (`DRY_RUN=`) counts as
//! unset and falls through to the file value or the default.

use clap::builder::{BoolishValueParser, Resettable};
use clap::error::ErrorKind;
use clap::{Command, CommandFactory, FromArgMatches, Parser};
use std::ffi::{OsStr, OsString};

/// Command-line arguments for the News Monitor job.
///
/// # Examples
///
/// ```sh
/// # Environment only (the normal scheduled invocation)
/// BREVO_API_KEY=xkeysib-... news_monitor
///
/// # Render everything but do not send
/// news_monitor --dry-run --keywords ilkyar,istanbul
///
/// # Settings from a file, key from the environment
/// news_monitor --config /etc/news_monitor.yaml
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWS_MONITOR_CONFIG")]
    pub config: Option<String>,

    /// Brevo API key
    #[arg(long, env = "BREVO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Sender address shown on outgoing emails
    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    /// Sender display name
    #[arg(long, env = "SENDER_NAME")]
    pub sender_name: Option<String>,

    /// Recipients of the daily digest (comma separated)
    #[arg(long, env = "DAILY_NEWS_RECIPIENT", value_delimiter = ',')]
    pub daily_recipient: Option<Vec<String>>,

    /// Recipients of keyword alerts (comma separated)
    #[arg(long, env = "ALERT_RECIPIENT", value_delimiter = ',')]
    pub alert_recipient: Option<Vec<String>>,

    /// Keywords to monitor (comma separated)
    #[arg(short, long, env = "MONITORED_KEYWORDS", value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,

    /// Feed language, e.g. `en` or `tr`
    #[arg(short, long, env = "NEWS_LANGUAGE")]
    pub language: Option<String>,

    /// Feed region, e.g. `US` or `TR`
    #[arg(long, env = "NEWS_REGION")]
    pub region: Option<String>,

    /// Maximum number of articles taken from each feed request
    #[arg(long, env = "MAX_ARTICLES")]
    pub max_articles: Option<usize>,

    /// Base URL of the RSS feed
    #[arg(long, env = "FEED_URL")]
    pub feed_url: Option<String>,

    /// Brevo transactional send endpoint
    #[arg(long, env = "BREVO_API_URL")]
    pub api_url: Option<String>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,

    /// Send the digest even when the feed returned nothing
    #[arg(long, env = "SEND_EMPTY_DIGEST", value_parser = BoolishValueParser::new())]
    pub send_empty_digest: Option<bool>,

    /// Also query the feed's search endpoint for each keyword
    #[arg(long, env = "KEYWORD_SEARCH", value_parser = BoolishValueParser::new())]
    pub keyword_search: Option<bool>,

    /// Match keywords against article summaries as well as titles
    #[arg(long, env = "MATCH_SUMMARIES", value_parser = BoolishValueParser::new())]
    pub match_summaries: Option<bool>,

    /// Exit with status 0 even when a fetch or send failed
    #[arg(long, env = "ALLOW_PARTIAL_FAILURE", value_parser = BoolishValueParser::new())]
    pub allow_partial_failure: Option<bool>,

    /// Render and log emails without sending them
    #[arg(
        long,
        env = "DRY_RUN",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub dry_run: Option<bool>,
}

impl Cli {
    /// Parse the process arguments and environment, ignoring blank
    /// environment variables.
    pub fn try_parse_env() -> Result<Self, clap::Error> {
        Self::try_parse_with(std::env::args_os(), |name: &OsStr| std::env::var_os(name))
    }

    /// Parse `args`, dropping the environment fallback of every argument
    /// whose variable `lookup` reports as blank.
    ///
    /// # Arguments
    ///
    /// * `args` - Full argument list, program name first
    /// * `lookup` - Reads an environment variable by name
    ///
    /// # Errors
    ///
    /// The clap error for an invalid flag or value, and for `--help` or
    /// `--version` (see [`is_informational`]).
    pub fn try_parse_with<I, T, E>(args: I, lookup: E) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        E: Fn(&OsStr) -> Option<OsString>,
    {
        let command = without_blank_env(Self::command(), lookup);
        let mut matches = command.try_get_matches_from(args)?;
        Self::from_arg_matches_mut(&mut matches)
    }
}

fn without_blank_env<E>(command: Command, lookup: E) -> Command
where
    E: Fn(&OsStr) -> Option<OsString>,
{
    command.mut_args(|arg| {
        let blank = arg
            .get_env()
            .and_then(&lookup)
            .is_some_and(|value| value.to_string_lossy().trim().is_empty());
        if blank { arg.env(Resettable::Reset) } else { arg }
    })
}

/// `true` for help and version requests, which are not input errors.
pub fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}
