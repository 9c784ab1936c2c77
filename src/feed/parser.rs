//! RSS 2.0 → [`Article`] parse step.
//!
//! Field mapping, per `<item>` in document order:
//!
//! | Article field | Source | Rule |
//! |---------------|--------|------|
//! | `title` | `<title>` | entities decoded, whitespace collapsed; item skipped if empty |
//! | `link` | `<link>` | trimmed; item skipped if missing |
//! | `source` | `<source>` text | else host of `<source url="…">`, else `"Unknown"` |
//! | `published` | `<pubDate>` | RFC 2822 → timestamp, otherwise kept raw |
//! | `summary` | `<description>` | HTML markup stripped; `None` when empty |
//!
//! Titles are plain text: an escaped `&lt;up&gt;` comes out as `<up>` and is
//! never read as a tag. Only `<description>` carries an HTML fragment.
//!
//! Items may be interleaved with other channel elements (`<image>`,
//! `<ttl>`, …) in any order.
//!
//! The parse is independent of the network so it can be tested on fixtures.

use crate::error::FetchError;
use crate::models::{Article, Published};
use crate::utils::{clean_text, collapse_whitespace, host_of};
use serde::Deserialize;
use tracing::debug;

const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "$text")]
    name: Option<String>,
}

/// Parse an RSS document into at most `limit` articles.
///
/// Items are mapped in document order per the table above. Items without
/// a title or link are dropped before the limit is applied, so a feed with
/// broken entries still yields up to `limit` usable articles.
///
/// # Arguments
///
/// * `xml` - The raw response body
/// * `limit` - Maximum number of articles to keep
///
/// # Returns
///
/// The articles, possibly empty when the channel has no usable items.
///
/// # Errors
///
/// [`FetchError::Parse`] when the body is not an RSS document.
pub fn parse_feed(xml: &str, limit: usize) -> Result<Vec<Article>, FetchError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    let total = rss.channel.items.len();

    let articles: Vec<Article> = rss
        .channel
        .items
        .into_iter()
        .filter_map(into_article)
        .take(limit)
        .collect();

    debug!(total, kept = articles.len(), limit, "Parsed feed items");
    Ok(articles)
}

fn into_article(item: Item) -> Option<Article> {
    let title = collapse_whitespace(item.title.as_deref()?);
    if title.is_empty() {
        return None;
    }
    let link = item.link?.trim().to_string();
    if link.is_empty() {
        return None;
    }

    let source = item
        .source
        .and_then(|s| {
            s.name
                .map(|n| collapse_whitespace(&n))
                .filter(|n| !n.is_empty())
                .or_else(|| s.url.as_deref().and_then(host_of))
        })
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    let summary = item
        .description
        .map(|d| clean_text(&d))
        .filter(|d| !d.is_empty());

    Some(Article {
        title,
        link,
        source,
        published: item.pub_date.as_deref().and_then(Published::parse),
        summary,
    })
}
