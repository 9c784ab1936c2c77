//! Resolved runtime configuration.
//!
//! [`Config::resolve`] merges, per field, the command line and environment
//! (already folded together by clap), an optional YAML file, and the
//! built-in defaults, in that order of precedence. The result is validated
//! once and then only ever borrowed.
//!
//! A blank value from any source is treated as absent and falls through to
//! the next source. A recipient list counts as blank when every entry is
//! blank; an explicitly empty list in the file is still rejected.

use crate::cli::Cli;
use crate::error::ConfigError;
use itertools::Itertools;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_SENDER_EMAIL: &str = "news@yourdomain.com";
pub const DEFAULT_SENDER_NAME: &str = "News Monitor";
pub const DEFAULT_DAILY_RECIPIENT: &str = "your-email@example.com";
pub const DEFAULT_ALERT_RECIPIENT: &str = "special-recipient@example.com";
pub const DEFAULT_KEYWORDS: &[&str] = &["ilkyar"];
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_MAX_ARTICLES: usize = 20;
pub const DEFAULT_FEED_URL: &str = "https://news.google.com/rss";
pub const DEFAULT_API_URL: &str = "https://api.brevo.com/v3/smtp/email";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Value shipped in sample environments; treated the same as no key.
const PLACEHOLDER_API_KEY: &str = "your-brevo-api-key-here";

/// Fully resolved configuration for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: String,
    pub daily_recipients: Vec<String>,
    pub alert_recipients: Vec<String>,
    pub keywords: Vec<String>,
    pub language: String,
    pub region: Option<String>,
    pub max_articles: usize,
    pub feed_url: String,
    pub api_url: String,
    pub http_timeout: Duration,
    pub send_empty_digest: bool,
    pub keyword_search: bool,
    pub match_summaries: bool,
    pub allow_partial_failure: bool,
    pub dry_run: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field("daily_recipients", &self.daily_recipients)
            .field("alert_recipients", &self.alert_recipients)
            .field("keywords", &self.keywords)
            .field("language", &self.language)
            .field("region", &self.region)
            .field("max_articles", &self.max_articles)
            .field("feed_url", &self.feed_url)
            .field("api_url", &self.api_url)
            .field("http_timeout", &self.http_timeout)
            .field("send_empty_digest", &self.send_empty_digest)
            .field("keyword_search", &self.keyword_search)
            .field("match_summaries", &self.match_summaries)
            .field("allow_partial_failure", &self.allow_partial_failure)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Shape of the optional YAML config file. Every key is optional.
///
/// ```yaml
/// sender_email: news@example.org
/// daily_recipients: [me@example.org]
/// keywords: [ilkyar, istanbul]
/// language: tr
/// region: TR
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub daily_recipients: Option<Vec<String>>,
    pub alert_recipients: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub max_articles: Option<usize>,
    pub feed_url: Option<String>,
    pub api_url: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub send_empty_digest: Option<bool>,
    pub keyword_search: Option<bool>,
    pub match_summaries: Option<bool>,
    pub allow_partial_failure: Option<bool>,
}

impl FileConfig {
    /// Parse a YAML document.
    pub fn from_yaml(path: &str, yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::ParseFile {
            path: path.to_string(),
            source,
        })
    }

    /// Read and parse a YAML file from disk.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(path, &yaml)
    }
}

impl Config {
    /// Load the config file named on the command line (if any) and resolve.
    #[instrument(
        level = "info",
        skip_all,
        fields(config_file = cli.config.as_deref().unwrap_or("-"))
    )]
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => {
                let file = FileConfig::load(path)?;
                info!(path, "Loaded config file");
                file
            }
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge flag/env values over file values over defaults, then validate.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let api_key = present(cli.api_key)
            .or_else(|| present(file.api_key))
            .filter(|k| k != PLACEHOLDER_API_KEY)
            .ok_or(ConfigError::MissingApiKey)?;

        let sender_email = present(cli.sender_email)
            .or_else(|| present(file.sender_email))
            .unwrap_or_else(|| DEFAULT_SENDER_EMAIL.to_string());
        let sender_email = validate_address("sender_email", &sender_email)?;

        let sender_name = present(cli.sender_name)
            .or_else(|| present(file.sender_name))
            .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string());

        let daily_recipients = recipients(
            "daily_recipients",
            present_list(cli.daily_recipient).or_else(|| present_list(file.daily_recipients)),
            DEFAULT_DAILY_RECIPIENT,
        )?;
        let alert_recipients = recipients(
            "alert_recipients",
            present_list(cli.alert_recipient).or_else(|| present_list(file.alert_recipients)),
            DEFAULT_ALERT_RECIPIENT,
        )?;

        let keywords = normalize_keywords(
            cli.keywords
                .or(file.keywords)
                .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()),
        );

        let language = present(cli.language)
            .or_else(|| present(file.language))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let region = present(cli.region)
            .or_else(|| present(file.region))
            .map(|r| r.to_uppercase());

        let max_articles = cli
            .max_articles
            .or(file.max_articles)
            .unwrap_or(DEFAULT_MAX_ARTICLES);
        if max_articles == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_articles",
                reason: "must be at least 1".to_string(),
            });
        }

        let http_timeout_secs = cli
            .http_timeout_secs
            .or(file.http_timeout_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }

        let feed_url = validate_url(
            "feed_url",
            present(cli.feed_url)
                .or_else(|| present(file.feed_url))
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
        )?;
        let api_url = validate_url(
            "api_url",
            present(cli.api_url)
                .or_else(|| present(file.api_url))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;

        Ok(Config {
            api_key,
            sender_email,
            sender_name,
            daily_recipients,
            alert_recipients,
            keywords,
            language,
            region,
            max_articles,
            feed_url,
            api_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            send_empty_digest: cli
                .send_empty_digest
                .or(file.send_empty_digest)
                .unwrap_or(true),
            keyword_search: cli.keyword_search.or(file.keyword_search).unwrap_or(true),
            match_summaries: cli.match_summaries.or(file.match_summaries).unwrap_or(false),
            allow_partial_failure: cli
                .allow_partial_failure
                .or(file.allow_partial_failure)
                .unwrap_or(false),
            dry_run: cli.dry_run.unwrap_or(false),
        })
    }
}

/// Trimmed value, or `None` when missing or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The list, or `None` when it has entries and all of them are blank.
fn present_list(value: Option<Vec<String>>) -> Option<Vec<String>> {
    value.filter(|list| list.is_empty() || list.iter().any(|v| !v.trim().is_empty()))
}

/// Trim, drop blanks, and drop case-insensitive duplicates, keeping the
/// first spelling seen.
pub fn normalize_keywords(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unique_by(|k| k.to_lowercase())
        .collect()
}

fn recipients(
    field: &'static str,
    value: Option<Vec<String>>,
    default: &str,
) -> Result<Vec<String>, ConfigError> {
    let list = value.unwrap_or_else(|| vec![default.to_string()]);
    let list = list
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| validate_address(field, a))
        .collect::<Result<Vec<_>, _>>()?;
    if list.is_empty() {
        return Err(ConfigError::NoRecipients { field });
    }
    Ok(list.into_iter().unique().collect())
}

fn validate_address(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
        })
    }
}

fn validate_url(field: &'static str, value: String) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    match url::Url::parse(&value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(value),
        Ok(parsed) => Err(ConfigError::InvalidValue {
            field,
            reason: format!("unsupported scheme {:?}", parsed.scheme()),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            field,
            reason: e.to_string(),
        }),
    }
}
