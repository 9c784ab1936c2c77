//! Data models shared across the pipeline.
//!
//! - [`Article`]: one feed entry, immutable once parsed
//! - [`Published`]: the entry's publication time, parsed when possible
//! - [`MatchResult`]: the articles that mention one keyword
//! - [`EmailMessage`] / [`Delivery`]: what the mailer sends and what it gets back
//!
//! Nothing here outlives a single run.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::fmt;

/// A news article as read from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Headline with markup stripped and whitespace collapsed.
    pub title: String,
    /// Link to the story.
    pub link: String,
    /// Publisher name, `"Unknown"` when the feed does not say.
    pub source: String,
    /// When the story was published, if the feed carries a date.
    pub published: Option<Published>,
    /// Plain-text description, if any.
    pub summary: Option<String>,
}

/// Publication time of an article.
///
/// Feeds are loose about dates, so a value that does not parse as RFC 2822
/// is kept verbatim instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    At(DateTime<FixedOffset>),
    Raw(String),
}

impl Published {
    /// Parse a `<pubDate>` value. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match DateTime::parse_from_rfc2822(raw) {
            Ok(dt) => Published::At(dt),
            Err(_) => Published::Raw(raw.to_string()),
        })
    }
}

impl fmt::Display for Published {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Published::At(dt) => write!(f, "{}", dt.format("%b %d, %Y %H:%M %:z")),
            Published::Raw(s) => f.write_str(s),
        }
    }
}

/// Articles mentioning a single keyword, in feed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub keyword: String,
    pub articles: Vec<Article>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// A rendered email ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Provider acknowledgement for an accepted email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Delivery {
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
}
