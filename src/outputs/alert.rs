//! Keyword alert template.

use super::{escape, page, push_article};
use crate::models::MatchResult;
use chrono::NaiveDateTime;

const HEADER_GRADIENT: &str = "linear-gradient(135deg, #f093fb 0%, #f5576c 100%)";
const ACCENT: &str = "#f5576c";

/// Subject line, e.g. `🚨 News Alert: 'ilkyar' mentioned in 2 article(s)`.
pub fn alert_subject(result: &MatchResult) -> String {
    format!(
        "🚨 News Alert: '{}' mentioned in {} article(s)",
        result.keyword,
        result.articles.len()
    )
}

/// Render the alert body for one keyword's matches.
pub fn render_alert(result: &MatchResult, generated_at: NaiveDateTime) -> String {
    let keyword = escape(&result.keyword);
    let header = format!(
        "<div class=\"alert-badge\">🚨 KEYWORD ALERT</div>\n<h1>News Alert: &quot;{keyword}&quot;</h1>\n<p>{}</p>",
        generated_at.format("%B %d, %Y %H:%M")
    );

    let mut body = format!(
        "<p>We found <strong>{}</strong> news item(s) containing the keyword <span class=\"keyword\">{keyword}</span>:</p>\n",
        result.articles.len()
    );
    for article in &result.articles {
        push_article(&mut body, article);
    }

    page(
        HEADER_GRADIENT,
        ACCENT,
        &header,
        &body,
        "This is an automated keyword alert from News Monitor",
    )
}
