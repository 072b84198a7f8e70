//! Transactional email delivery
//!
//! Sends the welcome email through the delivery provider's HTTP API.
//! Delivery is best-effort: callers log failures and never fail the
//! triggering request on them.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("email API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl Mailer {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: settings.email_api_url.trim_end_matches('/').to_string(),
            api_key: settings.email_api_key.clone(),
            from: settings.email_from.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let url = format!("{}/emails", self.api_url);

        debug!(to = %to, subject = %subject, "Sending email");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to: [to],
                subject,
                html,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Api { status, body });
        }

        Ok(())
    }

    /// Welcome email for a newly registered user or profile
    pub async fn send_welcome(&self, to: &str, first_name: &str) -> Result<(), EmailError> {
        let subject = "Welcome to Godown";
        let html = welcome_template(first_name);
        self.send(to, subject, &html).await
    }
}

fn welcome_template(first_name: &str) -> String {
    let greeting = if first_name.trim().is_empty() {
        "Hello".to_string()
    } else {
        format!("Hello {}", first_name.trim())
    };
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #1a56db;">{greeting},</h2>
  <p>Welcome to Godown, the marketplace for warehouses and commercial spaces.</p>
  <p>You can now browse listings, save searches, and list your own properties.
     Listings go live as soon as our team approves them.</p>
  <p>If you did not create this account, you can ignore this email.</p>
  <p style="color: #6b7280; font-size: 12px;">The Godown team</p>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_template_addresses_the_user() {
        let html = welcome_template("Maya");
        assert!(html.contains("Hello Maya,"));
        assert!(html.contains("Welcome to Godown"));
    }

    #[test]
    fn welcome_template_handles_missing_name() {
        let html = welcome_template("   ");
        assert!(html.contains("Hello,"));
    }
}
