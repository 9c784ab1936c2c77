//! Keyword matching.
//!
//! A keyword matches an article when the case-folded title (and, with
//! [`MatchScope::TitleAndSummary`], the case-folded summary) contains the
//! case-folded keyword as a plain substring. Matches keep the article order
//! they were given in.

use crate::models::{Article, MatchResult};
use itertools::Itertools;

/// Which article fields are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchScope {
    #[default]
    Title,
    TitleAndSummary,
}

impl MatchScope {
    pub fn from_flag(match_summaries: bool) -> Self {
        if match_summaries {
            MatchScope::TitleAndSummary
        } else {
            MatchScope::Title
        }
    }
}

/// Articles mentioning `keyword`, in input order.
///
/// A blank keyword matches nothing.
pub fn match_keyword(articles: &[Article], keyword: &str, scope: MatchScope) -> MatchResult {
    let needle = keyword.trim().to_lowercase();
    let matched = if needle.is_empty() {
        Vec::new()
    } else {
        articles
            .iter()
            .filter(|a| mentions(a, &needle, scope))
            .cloned()
            .collect()
    };
    MatchResult {
        keyword: keyword.to_string(),
        articles: matched,
    }
}

/// One [`MatchResult`] per keyword, in keyword order, empty ones included.
pub fn match_keywords(
    articles: &[Article],
    keywords: &[String],
    scope: MatchScope,
) -> Vec<MatchResult> {
    keywords
        .iter()
        .map(|k| match_keyword(articles, k, scope))
        .collect()
}

/// Concatenate article lists and drop repeated titles, first one wins.
pub fn merge_unique(primary: &[Article], extra: &[Article]) -> Vec<Article> {
    primary
        .iter()
        .chain(extra)
        .unique_by(|a| a.title.clone())
        .cloned()
        .collect()
}

fn mentions(article: &Article, needle: &str, scope: MatchScope) -> bool {
    if article.title.to_lowercase().contains(needle) {
        return true;
    }
    match (scope, &article.summary) {
        (MatchScope::TitleAndSummary, Some(summary)) => summary.to_lowercase().contains(needle),
        _ => false,
    }
}
