//! The run: fetch once, send the digest, evaluate and send keyword alerts.
//!
//! ```text
//! Start → Fetched → DigestSent | DigestSkipped | DigestFailed → AlertsEvaluated → Done
//! ```
//!
//! Every step after configuration is best-effort. A failed fetch leaves an
//! empty article list, and a failed send is recorded and the next send is
//! still attempted. The [`RunReport`] collects each outcome so `main` can
//! turn it into an exit status.

use crate::config::Config;
use crate::error::{FetchError, SendError};
use crate::feed::{FeedSource, FetchOutcome, fetch_articles};
use crate::mailer::Mailer;
use crate::matcher::{MatchScope, match_keyword, match_keywords, merge_unique};
use crate::models::{Article, Delivery, EmailMessage, MatchResult};
use crate::outputs::alert::{alert_subject, render_alert};
use crate::outputs::digest::{digest_subject, render_digest};
use chrono::NaiveDateTime;
use std::process::ExitCode;
use tracing::{error, info, instrument};

/// Outcome of one email step.
#[derive(Debug)]
pub enum StepOutcome {
    Sent(Delivery),
    Skipped(&'static str),
    Failed(SendError),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// What happened for one keyword.
#[derive(Debug)]
pub struct AlertReport {
    pub keyword: String,
    pub matches: usize,
    /// Failure of the keyword's own search request, when one was made.
    pub search_error: Option<FetchError>,
    pub outcome: StepOutcome,
}

/// Everything a run did, for logging and the exit status.
#[derive(Debug)]
pub struct RunReport {
    pub articles_fetched: usize,
    pub fetch_error: Option<FetchError>,
    pub digest: StepOutcome,
    pub alerts: Vec<AlertReport>,
}

impl RunReport {
    pub fn fetch_failures(&self) -> usize {
        usize::from(self.fetch_error.is_some())
            + self
                .alerts
                .iter()
                .filter(|a| a.search_error.is_some())
                .count()
    }

    pub fn send_failures(&self) -> usize {
        usize::from(self.digest.is_failed())
            + self.alerts.iter().filter(|a| a.outcome.is_failed()).count()
    }

    pub fn alerts_sent(&self) -> usize {
        self.alerts
            .iter()
            .filter(|a| matches!(a.outcome, StepOutcome::Sent(_)))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.fetch_failures() + self.send_failures() > 0
    }

    /// `0` when clean (or when partial failures are allowed), `2` otherwise.
    pub fn exit_status(&self, allow_partial_failure: bool) -> u8 {
        if self.has_failures() && !allow_partial_failure {
            EXIT_PARTIAL_FAILURE
        } else {
            0
        }
    }

    pub fn exit_code(&self, allow_partial_failure: bool) -> ExitCode {
        ExitCode::from(self.exit_status(allow_partial_failure))
    }
}

/// Configuration could not be loaded; nothing was attempted.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// At least one fetch or send failed.
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Run the whole job once.
#[instrument(level = "info", skip_all, fields(keywords = config.keywords.len()))]
pub async fn run<F, M>(config: &Config, feed: &F, mailer: &M, now: NaiveDateTime) -> RunReport
where
    F: FeedSource,
    M: Mailer,
{
    let fetched = fetch_articles(feed, None).await;
    let articles = fetched.articles().to_vec();
    info!(
        count = articles.len(),
        failed = fetched.is_failed(),
        "Fetched top stories"
    );

    let digest = send_digest(config, mailer, &articles, now).await;

    let scope = MatchScope::from_flag(config.match_summaries);
    let mut alerts = Vec::with_capacity(config.keywords.len());
    if config.keyword_search {
        for keyword in &config.keywords {
            let (result, search_error) =
                search_and_match(feed, &articles, keyword, scope).await;
            alerts.push(send_alert(config, mailer, result, search_error, now).await);
        }
    } else {
        for result in match_keywords(&articles, &config.keywords, scope) {
            alerts.push(send_alert(config, mailer, result, None, now).await);
        }
    }

    let fetch_error = match fetched {
        FetchOutcome::Failed(e) => Some(e),
        FetchOutcome::Fetched(_) => None,
    };

    RunReport {
        articles_fetched: articles.len(),
        fetch_error,
        digest,
        alerts,
    }
}

#[instrument(level = "info", skip_all, fields(articles = articles.len()))]
async fn send_digest<M: Mailer>(
    config: &Config,
    mailer: &M,
    articles: &[Article],
    now: NaiveDateTime,
) -> StepOutcome {
    if articles.is_empty() && !config.send_empty_digest {
        info!("No articles and empty digests disabled; skipping digest");
        return StepOutcome::Skipped("no articles");
    }

    let email = EmailMessage {
        to: config.daily_recipients.clone(),
        subject: digest_subject(now),
        html: render_digest(articles, now),
    };
    deliver(mailer, &email, "digest").await
}

/// Match `keyword` against the top stories plus the keyword's own search
/// results. A failed search falls back to the top stories alone.
#[instrument(level = "info", skip_all, fields(keyword = %keyword))]
async fn search_and_match<F: FeedSource>(
    feed: &F,
    top_stories: &[Article],
    keyword: &str,
    scope: MatchScope,
) -> (MatchResult, Option<FetchError>) {
    match fetch_articles(feed, Some(keyword)).await {
        FetchOutcome::Fetched(found) => {
            let candidates = merge_unique(top_stories, &found);
            (match_keyword(&candidates, keyword, scope), None)
        }
        FetchOutcome::Failed(e) => (match_keyword(top_stories, keyword, scope), Some(e)),
    }
}

#[instrument(level = "info", skip_all, fields(keyword = %result.keyword))]
async fn send_alert<M: Mailer>(
    config: &Config,
    mailer: &M,
    result: MatchResult,
    search_error: Option<FetchError>,
    now: NaiveDateTime,
) -> AlertReport {
    let outcome = if result.is_empty() {
        info!("No articles mention keyword");
        StepOutcome::Skipped("no matches")
    } else {
        info!(matches = result.articles.len(), "Keyword found; sending alert");
        let email = EmailMessage {
            to: config.alert_recipients.clone(),
            subject: alert_subject(&result),
            html: render_alert(&result, now),
        };
        deliver(mailer, &email, "alert").await
    };

    AlertReport {
        matches: result.articles.len(),
        keyword: result.keyword,
        search_error,
        outcome,
    }
}

async fn deliver<M: Mailer>(
    mailer: &M,
    email: &EmailMessage,
    kind: &'static str,
) -> StepOutcome {
    match mailer.send(email).await {
        Ok(delivery) => {
            info!(kind, to = ?email.to, "Email sent");
            StepOutcome::Sent(delivery)
        }
        Err(e) => {
            error!(kind, to = ?email.to, error = %e, "Email failed; continuing");
            StepOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::FileConfig;
    use crate::feed::parser::parse_feed;
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
            source: "Example".to_string(),
            published: None,
            summary: None,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    fn config(keywords: &[&str], keyword_search: bool) -> Config {
        let cli = Cli {
            api_key: Some("xkeysib-test".to_string()),
            daily_recipient: Some(vec!["daily@example.com".to_string()]),
            alert_recipient: Some(vec!["alerts@example.com".to_string()]),
            keywords: Some(keywords.iter().map(|k| k.to_string()).collect()),
            keyword_search: Some(keyword_search),
            ..Cli::default()
        };
        Config::resolve(cli, FileConfig::default()).unwrap()
    }

    /// How a scripted request fails.
    enum Failure {
        Status(StatusCode),
        /// The body came back but is not RSS.
        Malformed,
    }

    /// Feed scripted per query; `None` key is top stories. Missing queries
    /// return an empty list.
    #[derive(Default)]
    struct ScriptedFeed {
        responses: HashMap<Option<String>, Result<Vec<Article>, Failure>>,
        requests: RefCell<Vec<Option<String>>>,
    }

    impl ScriptedFeed {
        fn top(mut self, result: Result<Vec<Article>, Failure>) -> Self {
            self.responses.insert(None, result);
            self
        }

        fn search(mut self, query: &str, result: Result<Vec<Article>, Failure>) -> Self {
            self.responses.insert(Some(query.to_string()), result);
            self
        }
    }

    impl FeedSource for ScriptedFeed {
        async fn fetch(&self, query: Option<&str>) -> Result<Vec<Article>, FetchError> {
            let key = query.map(str::to_string);
            self.requests.borrow_mut().push(key.clone());
            match self.responses.get(&key) {
                Some(Ok(articles)) => Ok(articles.clone()),
                Some(Err(Failure::Status(status))) => Err(FetchError::Status {
                    status: *status,
                    body: String::new(),
                }),
                Some(Err(Failure::Malformed)) => {
                    parse_feed("<html><body>Service unavailable</body></html>", 20)
                }
                None => Ok(Vec::new()),
            }
        }
    }

    /// Records every message; fails for recipients listed in `reject`.
    #[derive(Default)]
    struct RecordingMailer {
        reject: Vec<String>,
        sent: RefCell<Vec<EmailMessage>>,
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, email: &EmailMessage) -> Result<Delivery, SendError> {
            self.sent.borrow_mut().push(email.clone());
            if email.to.iter().any(|to| self.reject.contains(to)) {
                return Err(SendError::Rejected {
                    status: StatusCode::BAD_REQUEST,
                    body: r#"{"code":"invalid_parameter"}"#.to_string(),
                });
            }
            Ok(Delivery {
                message_id: Some(format!("<{}@test>", self.sent.borrow().len())),
            })
        }
    }

    #[tokio::test]
    async fn test_digest_and_alert_scenario() {
        let config = config(&["ilkyar"], false);
        let feed = ScriptedFeed::default()
            .top(Ok(vec![article("Ilkyar wins award"), article("Weather update")]));
        let mailer = RecordingMailer::default();

        let report = run(&config, &feed, &mailer, now()).await;

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 2);

        let digest = &sent[0];
        assert_eq!(digest.to, vec!["daily@example.com"]);
        assert!(digest.html.contains("Ilkyar wins award"));
        assert!(digest.html.contains("Weather update"));

        let alert = &sent[1];
        assert_eq!(alert.to, vec!["alerts@example.com"]);
        assert_eq!(
            alert.subject,
            "🚨 News Alert: 'ilkyar' mentioned in 1 article(s)"
        );
        assert!(alert.html.contains("Ilkyar wins award"));
        assert!(!alert.html.contains("Weather update"));

        assert_eq!(report.articles_fetched, 2);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].matches, 1);
        assert_eq!(report.alerts_sent(), 1);
        assert!(!report.has_failures());
        assert_eq!(report.exit_status(false), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_still_completes() {
        let config = config(&["ilkyar"], false);
        let feed =
            ScriptedFeed::default().top(Err(Failure::Status(StatusCode::SERVICE_UNAVAILABLE)));
        let mailer = RecordingMailer::default();

        let report = run(&config, &feed, &mailer, now()).await;

        assert_eq!(report.articles_fetched, 0);
        assert!(report.fetch_error.is_some());
        // Empty digest still goes out by default.
        assert!(matches!(report.digest, StepOutcome::Sent(_)));
        assert!(
            mailer.sent.borrow()[0]
                .html
                .contains("No news items found for today.")
        );
        assert!(matches!(report.alerts[0].outcome, StepOutcome::Skipped(_)));
        assert_eq!(report.fetch_failures(), 1);
        assert_eq!(report.exit_status(false), EXIT_PARTIAL_FAILURE);
        assert_eq!(report.exit_status(true), 0);
    }

    #[tokio::test]
    async fn test_unparseable_feed_still_completes() {
        let config = config(&["ilkyar"], true);
        let feed = ScriptedFeed::default()
            .top(Err(Failure::Malformed))
            .search("ilkyar", Err(Failure::Malformed));
        let mailer = RecordingMailer::default();

        let report = run(&config, &feed, &mailer, now()).await;

        assert_eq!(report.articles_fetched, 0);
        assert!(matches!(report.fetch_error, Some(FetchError::Parse(_))));
        assert!(matches!(
            report.alerts[0].search_error,
            Some(FetchError::Parse(_))
        ));
        assert!(matches!(report.digest, StepOutcome::Sent(_)));
        assert!(matches!(report.alerts[0].outcome, StepOutcome::Skipped(_)));
        assert_eq!(mailer.sent.borrow().len(), 1);
        assert_eq!(report.fetch_failures(), 2);
        assert_eq!(report.send_failures(), 0);
        assert_eq!(report.exit_status(false), EXIT_PARTIAL_FAILURE);
    }

    #[tokio::test]
    async fn test_empty_digest_skipped_when_disabled() {
        let mut config = config(&[], false);
        config.send_empty_digest = false;
        let feed = ScriptedFeed::default().top(Ok(vec![]));
        let mailer = RecordingMailer::default();

        let report = run(&config, &feed, &mailer, now()).await;

        assert!(matches!(report.digest, StepOutcome::Skipped(_)));
        assert!(mailer.sent.borrow().is_empty());
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_digest_failure_does_not_block_alerts() {
        let config = config(&["ilkyar"], false);
        let feed = ScriptedFeed::default().top(Ok(vec![article("Ilkyar wins award")]));
        let mailer = RecordingMailer {
            reject: vec!["daily@example.com".to_string()],
            ..RecordingMailer::default()
        };

        let report = run(&config, &feed, &mailer, now()).await;

        assert!(report.digest.is_failed());
        assert!(matches!(report.alerts[0].outcome, StepOutcome::Sent(_)));
        assert_eq!(mailer.sent.borrow().len(), 2);
        assert_eq!(report.send_failures(), 1);
        assert_eq!(report.exit_status(false), EXIT_PARTIAL_FAILURE);
    }

    #[tokio::test]
    async fn test_alert_failure_does_not_block_later_alerts() {
        let config = config(&["ilkyar", "weather"], false);
        let feed = ScriptedFeed::default()
            .top(Ok(vec![article("Ilkyar wins award"), article("Weather update")]));
        let mailer = RecordingMailer {
            reject: vec!["alerts@example.com".to_string()],
            ..RecordingMailer::default()
        };

        let report = run(&config, &feed, &mailer, now()).await;

        assert_eq!(mailer.sent.borrow().len(), 3);
        assert!(report.alerts.iter().all(|a| a.outcome.is_failed()));
        assert_eq!(report.send_failures(), 2);
    }

    #[tokio::test]
    async fn test_no_keywords_no_alerts() {
        let config = config(&[], true);
        let feed = ScriptedFeed::default().top(Ok(vec![article("Ilkyar wins award")]));
        let mailer = RecordingMailer::default();

        let report = run(&config, &feed, &mailer, now()).await;

        assert!(report.alerts.is_empty());
        assert_eq!(mailer.sent.borrow().len(), 1);
        assert_eq!(*feed.requests.borrow(), vec![None]);
    }

    #[tokio::test]
    async fn test_keyword_search_merges_and_dedupes() {
        let config = config(&["ilkyar"], true);
        let feed = ScriptedFeed::default()
            .top(Ok(vec![article("Ilkyar wins award"), article("Weather update")]))
            .search(
                "ilkyar",
                Ok(vec![article("Ilkyar wins award"), article("Ilkyar opens plant")]),
            );
        let mailer = RecordingMailer::default();

        let report = run(&config, &feed, &mailer, now()).await;

        assert_eq!(
            *feed.requests.borrow(),
            vec![None, Some("ilkyar".to_string())]
        );
        assert_eq!(report.alerts[0].matches, 2);
        let sent = mailer.sent.borrow();
        let alert = &sent[1];
        assert_eq!(alert.html.matches("Ilkyar wins award").count(), 1);
        assert!(alert.html.contains("Ilkyar opens plant"));
        // Digest only carries top stories.
        assert!(!sent[0].html.contains("Ilkyar opens plant"));
    }

    #[tokio::test]
    async fn test_keyword_search_failure_falls_back_to_top_stories() {
        let config = config(&["ilkyar"], true);
        let feed = ScriptedFeed::default()
            .top(Ok(vec![article("Ilkyar wins award")]))
            .search("ilkyar", Err(Failure::Status(StatusCode::TOO_MANY_REQUESTS)));
        let mailer = RecordingMailer::default();

        let report = run(&config, &feed, &mailer, now()).await;

        assert!(report.alerts[0].search_error.is_some());
        assert_eq!(report.alerts[0].matches, 1);
        assert!(matches!(report.alerts[0].outcome, StepOutcome::Sent(_)));
        assert_eq!(report.fetch_failures(), 1);
    }
}
