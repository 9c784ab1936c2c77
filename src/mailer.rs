//! Transactional email delivery.
//!
//! # Architecture
//!
//! - [`Mailer`]: the seam the pipeline sends through
//! - [`BrevoMailer`]: POSTs to the Brevo `/v3/smtp/email` endpoint
//! - [`DryRunMailer`]: logs what would be sent and reports success
//!
//! Each call is a single attempt. Any non-2xx answer becomes
//! [`SendError::Rejected`] carrying the status and (truncated) body.
//!
//! # Request body
//!
//! ```json
//! {
//!   "sender": { "name": "News Monitor", "email": "news@yourdomain.com" },
//!   "to": [ { "email": "your-email@example.com" } ],
//!   "subject": "📰 Daily News Digest - May 06, 2025",
//!   "htmlContent": "<!DOCTYPE html>…"
//! }
//! ```

use crate::config::Config;
use crate::error::SendError;
use crate::models::{Delivery, EmailMessage};
use crate::utils::truncate_for_log;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const API_KEY_HEADER: &str = "api-key";
const USER_AGENT: &str = concat!("news_monitor/", env!("CARGO_PKG_VERSION"));

/// Something that can deliver an [`EmailMessage`].
pub trait Mailer {
    /// Deliver `email`. One attempt, no retry.
    async fn send(&self, email: &EmailMessage) -> Result<Delivery, SendError>;
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

/// Brevo transactional email client.
pub struct BrevoMailer {
    client: Client,
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
}

impl fmt::Debug for BrevoMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrevoMailer")
            .field("api_url", &self.api_url)
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .finish_non_exhaustive()
    }
}

impl BrevoMailer {
    /// Create a Brevo client from the resolved configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the endpoint, API key, sender identity and
    ///   HTTP timeout
    ///
    /// # Errors
    ///
    /// [`SendError::Build`] if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, SendError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(SendError::Build)?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        })
    }

    fn request_body<'a>(&'a self, email: &'a EmailMessage) -> SendRequest<'a> {
        SendRequest {
            sender: Contact {
                name: Some(self.sender_name.as_str()),
                email: &self.sender_email,
            },
            to: email
                .to
                .iter()
                .map(|addr| Contact {
                    name: None,
                    email: addr,
                })
                .collect(),
            subject: &email.subject,
            html_content: &email.html,
        }
    }
}

impl Mailer for BrevoMailer {
    /// POST `email` to Brevo with the `api-key` header.
    ///
    /// # Returns
    ///
    /// The [`Delivery`] parsed from the response. A 2xx answer whose body
    /// has no `messageId` still counts as delivered.
    ///
    /// # Errors
    ///
    /// * [`SendError::Request`] - the request could not be completed
    /// * [`SendError::Rejected`] - Brevo answered with a non-2xx status
    #[instrument(level = "info", skip_all, fields(to = ?email.to, subject = %email.subject))]
    async fn send(&self, email: &EmailMessage) -> Result<Delivery, SendError> {
        let t0 = Instant::now();
        let response = self
            .client
            .post(&self.api_url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.request_body(email))
            .send()
            .await
            .map_err(SendError::Request)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms,
                body = %truncate_for_log(&body, 500),
                "Brevo rejected email"
            );
            return Err(SendError::Rejected {
                status,
                body: truncate_for_log(&body, 500),
            });
        }

        let delivery: Delivery = serde_json::from_str(&body).unwrap_or_else(|e| {
            debug!(error = %e, "Brevo response had no readable message id");
            Delivery::default()
        });
        info!(
            status = status.as_u16(),
            elapsed_ms,
            message_id = delivery.message_id.as_deref().unwrap_or("-"),
            "Email accepted"
        );
        Ok(delivery)
    }
}

/// Mailer that only logs. Used by `--dry-run`.
#[derive(Debug, Default)]
pub struct DryRunMailer;

impl Mailer for DryRunMailer {
    #[instrument(level = "info", skip_all, fields(to = ?email.to, subject = %email.subject))]
    async fn send(&self, email: &EmailMessage) -> Result<Delivery, SendError> {
        info!(bytes = email.html.len(), "Dry run: email not sent");
        debug!(html = %truncate_for_log(&email.html, 2000), "Dry run body");
        Ok(Delivery::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::FileConfig;

    fn mailer() -> BrevoMailer {
        let cli = Cli {
            api_key: Some("xkeysib-test".to_string()),
            sender_email: Some("alerts@example.org".to_string()),
            sender_name: Some("Alerts".to_string()),
            ..Cli::default()
        };
        BrevoMailer::new(&Config::resolve(cli, FileConfig::default()).unwrap()).unwrap()
    }

    #[test]
    fn test_request_body_matches_brevo_schema() {
        let mailer = mailer();
        let email = EmailMessage {
            to: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            subject: "Hello".to_string(),
            html: "<p>Hi</p>".to_string(),
        };
        let json = serde_json::to_value(mailer.request_body(&email)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "sender": { "name": "Alerts", "email": "alerts@example.org" },
                "to": [ { "email": "a@example.com" }, { "email": "b@example.com" } ],
                "subject": "Hello",
                "htmlContent": "<p>Hi</p>"
            })
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let debug = format!("{:?}", mailer());
        assert!(!debug.contains("xkeysib-test"));
        assert!(debug.contains("alerts@example.org"));
    }

    #[tokio::test]
    async fn test_dry_run_reports_success() {
        let email = EmailMessage {
            to: vec!["a@example.com".to_string()],
            subject: "Hello".to_string(),
            html: "<p>Hi</p>".to_string(),
        };
        let delivery = DryRunMailer.send(&email).await.unwrap();
        assert_eq!(delivery, Delivery::default());
    }
}
