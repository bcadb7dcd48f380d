use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Invalid response from translation service: {0}")]
    InvalidResponse(String),
    #[error("Failed to encode translation request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("No translation endpoint configured")]
    NotConfigured,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

/// Client for a LibreTranslate-compatible `/translate` endpoint.
///
/// One synchronous call per text; no retries.
pub struct Translator {
    client: reqwest::Client,
    url: Url,
    api_key: Option<SecretString>,
}

impl Translator {
    /// `url` is the full `/translate` URL (see `TranslationConfig::translate_url`).
    pub fn new(client: reqwest::Client, url: Url, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            url,
            api_key,
        }
    }

    /// Translates `text` from `source` to `target` (free-form language tags).
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let body = serde_json::to_vec(&TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_ref().map(|k| k.expose_secret()),
        })?;

        tracing::trace!(source, target, chars = text.len(), "Translating");

        let response = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranslateError::HttpStatus(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        let parsed: TranslateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| TranslateError::InvalidResponse(e.to_string()))?;
        Ok(parsed.translated_text)
    }
}
