//! News feed access.
//!
//! The pipeline talks to the feed through the [`FeedSource`] trait so the
//! orchestrator can be exercised without a network. [`GoogleNewsFeed`] is the
//! production implementation. It requests the Google News RSS endpoints and
//! hands the body to [`parser::parse_feed`].
//!
//! # Endpoints
//!
//! | Request | URL |
//! |---------|-----|
//! | Top stories | `{feed_url}?hl={lang}[&gl={REGION}&ceid={REGION}:{lang}]` |
//! | Keyword search | `{feed_url}/search?q={query}&hl={lang}[…]` |
//!
//! A request is attempted exactly once. [`fetch_articles`] turns any failure
//! into a [`FetchOutcome::Failed`] so callers decide how to continue.

pub mod parser;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::Article;
use crate::utils::truncate_for_log;
use reqwest::Client;
use std::time::Instant;
use tracing::{info, instrument, warn};
use url::Url;

const USER_AGENT: &str = concat!("news_monitor/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce a list of articles, either top stories or the
/// results of a search.
pub trait FeedSource {
    /// Fetch top stories when `query` is `None`, search results otherwise.
    async fn fetch(&self, query: Option<&str>) -> Result<Vec<Article>, FetchError>;
}

/// Google News RSS client.
#[derive(Debug)]
pub struct GoogleNewsFeed {
    client: Client,
    base_url: String,
    language: String,
    region: Option<String>,
    max_articles: usize,
}

impl GoogleNewsFeed {
    /// Create a feed client from the resolved configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the base URL, language, region, article cap
    ///   and HTTP timeout
    ///
    /// # Errors
    ///
    /// [`FetchError::Build`] if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Build)?;
        Ok(Self {
            client,
            base_url: config.feed_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            region: config.region.clone(),
            max_articles: config.max_articles,
        })
    }

    /// Build the request URL for top stories or a search.
    ///
    /// # Arguments
    ///
    /// * `query` - `None` for top stories, `Some(keyword)` for the search
    ///   endpoint. The query is form-encoded.
    ///
    /// # Returns
    ///
    /// The full URL including `hl`, and `gl`/`ceid` when a region is set.
    pub fn feed_url(&self, query: Option<&str>) -> Result<Url, FetchError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        let endpoint = match query {
            Some(q) => {
                params.push(("q", q.to_string()));
                format!("{}/search", self.base_url)
            }
            None => self.base_url.clone(),
        };
        params.push(("hl", self.language.clone()));
        if let Some(region) = &self.region {
            params.push(("gl", region.clone()));
            params.push(("ceid", format!("{}:{}", region, self.language)));
        }
        Ok(Url::parse_with_params(&endpoint, &params)?)
    }
}

impl FeedSource for GoogleNewsFeed {
    #[instrument(level = "info", skip(self), fields(language = %self.language))]
    async fn fetch(&self, query: Option<&str>) -> Result<Vec<Article>, FetchError> {
        let url = self.feed_url(query)?;
        let t0 = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status,
                body: truncate_for_log(&body, 300),
            });
        }

        let body = response.text().await.map_err(FetchError::Request)?;
        let articles = parser::parse_feed(&body, self.max_articles)?;

        info!(
            %url,
            count = articles.len(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched feed"
        );
        Ok(articles)
    }
}

/// Result of one feed request, with failures kept as data.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(Vec<Article>),
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    /// Articles fetched, or an empty list after a failure.
    pub fn articles(&self) -> &[Article] {
        match self {
            FetchOutcome::Fetched(articles) => articles,
            FetchOutcome::Failed(_) => &[],
        }
    }
}

/// Run one feed request and absorb any failure into the outcome.
///
/// Failures are logged at `warn` and never propagate: a broken feed means
/// nothing to report, not a broken run. A non-2xx status, a network error
/// and an unparseable body are all treated the same way.
///
/// # Arguments
///
/// * `feed` - The source to query
/// * `query` - `None` for top stories, `Some(keyword)` for a search
///
/// # Returns
///
/// [`FetchOutcome::Fetched`] with the articles (possibly empty), or
/// [`FetchOutcome::Failed`] holding the error. Either way
/// [`FetchOutcome::articles`] yields a usable list.
pub async fn fetch_articles<F: FeedSource>(feed: &F, query: Option<&str>) -> FetchOutcome {
    match feed.fetch(query).await {
        Ok(articles) => {
            if articles.is_empty() {
                warn!(query = query.unwrap_or("-"), "Feed returned no articles");
            }
            FetchOutcome::Fetched(articles)
        }
        Err(e) => {
            match &e {
                FetchError::Status { status, body } => warn!(
                    query = query.unwrap_or("-"),
                    status = status.as_u16(),
                    %body,
                    "Feed request rejected; continuing with no articles"
                ),
                other => warn!(
                    query = query.unwrap_or("-"),
                    error = %other,
                    "Feed fetch failed; continuing with no articles"
                ),
            }
            FetchOutcome::Failed(e)
        }
    }
}
