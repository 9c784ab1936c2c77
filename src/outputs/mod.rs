//! HTML email rendering.
//!
//! Two templates, both pure functions of their inputs and an explicit
//! timestamp so the same input always renders the same bytes:
//!
//! - [`digest`]: the daily digest, every fetched article in feed order
//! - [`alert`]: one keyword and the articles that mention it
//!
//! Every value taken from the feed or the configuration goes through
//! [`escape`] before it is embedded, in text and in attributes alike.

pub mod alert;
pub mod digest;

use crate::models::Article;
use std::borrow::Cow;

/// Escape `&`, `<`, `>`, `'` and `"` for HTML text and attribute values.
pub fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

/// Shared page scaffolding. `accent` is the left-border color of items and
/// `header_gradient` the banner background.
pub(crate) fn page(
    header_gradient: &str,
    accent: &str,
    header: &str,
    body: &str,
    footer: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; }}
  .header {{ background: {header_gradient}; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }}
  .alert-badge {{ background: #ff4757; padding: 5px 15px; border-radius: 20px; display: inline-block; margin-bottom: 10px; }}
  .content {{ padding: 20px; background: #f9f9f9; }}
  .news-item {{ background: white; padding: 15px; margin-bottom: 15px; border-radius: 8px; border-left: 4px solid {accent}; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
  .news-title {{ font-size: 16px; font-weight: bold; color: #333; text-decoration: none; }}
  .news-meta {{ font-size: 12px; color: #888; margin-top: 8px; }}
  .keyword {{ background: #fff3cd; padding: 2px 6px; border-radius: 3px; font-weight: bold; }}
  .footer {{ text-align: center; padding: 20px; color: #888; font-size: 12px; }}
</style>
</head>
<body>
<div class="header">
{header}
</div>
<div class="content">
{body}
</div>
<div class="footer">
<p>{footer}</p>
</div>
</body>
</html>
"#
    )
}

/// One article card. Appends to `out`.
pub(crate) fn push_article(out: &mut String, article: &Article) {
    let published = article
        .published
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_default();
    out.push_str(&format!(
        r#"<div class="news-item">
  <a href="{link}" class="news-title">{title}</a>
  <div class="news-meta">📌 {source} | 🕐 {published}</div>
</div>
"#,
        link = escape(&article.link),
        title = escape(&article.title),
        source = escape(&article.source),
        published = escape(&published),
    ));
}
