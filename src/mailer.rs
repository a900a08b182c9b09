use crate::config::EmailConfig;
use crate::emissions::{
    CarbonFootprintResult, FootprintComparison, GLOBAL_AVERAGE_KG, US_AVERAGE_KG,
};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const RESULTS_SUBJECT: &str = "Your Carbon Footprint Results";

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    )
    .unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Mail API returned status {0}")]
    Status(u16),
}

/// Hands a rendered message to whatever actually delivers mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Posts messages as JSON to an HTTP mail API.
pub struct HttpMailTransport {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpMailTransport {
    pub fn new(api_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("EcoViz/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut request = self.client.post(&self.api_url).json(email);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Status(status.as_u16()));
        }

        log::info!("Results email accepted by mail API for {}", email.to);
        Ok(())
    }
}

/// Logs messages instead of delivering them, for deployments without a mail API.
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        log::info!("EMAIL (not delivered, no mail API configured):");
        log::info!("From: {}", email.from);
        log::info!("To: {}", email.to);
        log::info!("Subject: {}", email.subject);
        log::debug!("Body:\n{}", email.html);
        Ok(())
    }
}

/// Builds the transport described by the email config.
pub fn transport_from_config(config: &EmailConfig) -> Arc<dyn MailTransport> {
    match &config.api_url {
        Some(api_url) => {
            let api_key = std::env::var(&config.api_key_env).ok();
            if api_key.is_none() {
                log::warn!(
                    "{} is not set, mail API requests will be unauthenticated",
                    config.api_key_env
                );
            }
            Arc::new(HttpMailTransport::new(
                api_url.clone(),
                api_key,
                Duration::from_secs(config.timeout_seconds),
            ))
        }
        None => Arc::new(LogMailTransport),
    }
}

/// Renders footprint summaries and sends them through a transport.
pub struct ResultsMailer {
    transport: Arc<dyn MailTransport>,
    from_address: String,
}

impl ResultsMailer {
    pub fn new(transport: Arc<dyn MailTransport>, from_address: String) -> Self {
        Self {
            transport,
            from_address,
        }
    }

    pub async fn send_results(
        &self,
        to: &str,
        results: &CarbonFootprintResult,
    ) -> Result<(), MailError> {
        if !is_valid_email(to) {
            return Err(MailError::InvalidRecipient(to.to_string()));
        }

        let email = OutgoingEmail {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: RESULTS_SUBJECT.to_string(),
            html: render_results_email(to, results),
        };

        self.transport.send(&email).await
    }
}

/// Fixed HTML summary of a calculation.
pub fn render_results_email(recipient: &str, results: &CarbonFootprintResult) -> String {
    let comparison = FootprintComparison::new(results.total);

    let mut rows = String::new();
    for (name, value) in results.categories() {
        rows.push_str(&format!(
            "        <tr><td style=\"padding: 6px 12px;\">{name}</td>\
             <td style=\"padding: 6px 12px; text-align: right;\">{value:.2} kg CO2e</td></tr>\n"
        ));
    }

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{subject}</title>
  </head>
  <body style="font-family: 'Segoe UI', sans-serif; color: #1f2937;">
    <h1 style="color: #15803d;">{subject}</h1>
    <p>Your estimated annual carbon footprint is <strong>{total:.2} kg CO2e</strong>.</p>
    <table style="border-collapse: collapse;">
      <thead>
        <tr><th style="padding: 6px 12px; text-align: left;">Category</th><th style="padding: 6px 12px; text-align: right;">Emissions</th></tr>
      </thead>
      <tbody>
{rows}      </tbody>
    </table>
    <p>That is {comparison}.</p>
    <p style="font-size: 12px; color: #6b7280;">Global average: {global:.0} kg CO2e per year. US average: {us:.0} kg CO2e per year.</p>
    <p style="font-size: 12px; color: #6b7280;">This summary was sent to {recipient} by EcoViz.</p>
  </body>
</html>
"##,
        subject = RESULTS_SUBJECT,
        total = results.total,
        rows = rows,
        comparison = comparison.describe(),
        global = GLOBAL_AVERAGE_KG,
        us = US_AVERAGE_KG,
        recipient = html_escape::encode_text(recipient),
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Records every message and optionally fails delivery.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<OutgoingEmail>>,
        pub fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Status(503));
            }
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }
}
