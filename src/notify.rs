//! Webhook delivery.
//!
//! Messages are posted as `{"text": "..."}` JSON, the shape Slack incoming
//! webhooks (and most chat bridges that copy them) accept.
use serde::Serialize;
use thiserror::Error;

use crate::util::redact_url;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Builds the relayed message: link, title, description separated by blank lines.
pub fn format_message(link: &str, title: &str, description: &str) -> String {
    format!("{link}\n\n{title}\n\n{description}")
}

/// Posts messages to webhook URLs. The response body is never read.
#[derive(Clone)]
pub struct WebhookPoster {
    client: reqwest::Client,
}

impl WebhookPoster {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn post(&self, url: &str, text: &str) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(&WebhookPayload { text })?;

        let response = self
            .client
            .post(url.trim())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryError::HttpStatus(response.status().as_u16()));
        }

        tracing::debug!(destination = %redact_url(url), "Delivered");
        Ok(())
    }
}
