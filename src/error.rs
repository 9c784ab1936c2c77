//! Error taxonomy for the monitor.
//!
//! Configuration problems are fatal and surface before any network call.
//! Fetch and send errors are soft: the pipeline records them in its report
//! and keeps going.

use reqwest::StatusCode;
use thiserror::Error;

/// Fatal problems found while resolving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Brevo API key is missing (set BREVO_API_KEY or pass --api-key)")]
    MissingApiKey,

    #[error("{field} is not a valid email address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must name at least one recipient")]
    NoRecipients { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Reasons a feed request produced no articles.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid feed URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("feed request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("feed returned HTTP {status}")]
    Status { status: StatusCode, body: String },

    #[error("feed is not valid RSS: {0}")]
    Parse(#[from] quick_xml::DeError),
}

/// Reasons a single email could not be delivered to the provider.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("email request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("email provider rejected the message with HTTP {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}
