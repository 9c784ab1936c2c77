//! Daily digest template.

use super::{escape, page, push_article};
use crate::models::Article;
use chrono::NaiveDateTime;

const HEADER_GRADIENT: &str = "linear-gradient(135deg, #667eea 0%, #764ba2 100%)";
const ACCENT: &str = "#667eea";

/// Subject line, e.g. `📰 Daily News Digest - May 06, 2025`.
pub fn digest_subject(generated_at: NaiveDateTime) -> String {
    format!("📰 Daily News Digest - {}", generated_at.format("%B %d, %Y"))
}

/// Render the digest body for `articles`, in the order given.
///
/// An empty list renders a short "nothing today" notice rather than an
/// empty page.
pub fn render_digest(articles: &[Article], generated_at: NaiveDateTime) -> String {
    let date = generated_at.format("%B %d, %Y").to_string();
    let header = format!(
        "<h1>📰 Daily News Digest</h1>\n<p>{}</p>",
        escape(&date)
    );

    let mut body = String::new();
    if articles.is_empty() {
        body.push_str("<p>No news items found for today.</p>\n");
    } else {
        for article in articles {
            push_article(&mut body, article);
        }
    }

    page(
        HEADER_GRADIENT,
        ACCENT,
        &header,
        &body,
        "This email was automatically generated by News Monitor",
    )
}
