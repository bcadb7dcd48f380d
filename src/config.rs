//! Configuration file parser for ~/.config/feedrelay/config.toml.
//!
//! The file carries the global relay record: default destinations, abort policy,
//! language defaults and the list of feeds (bare URLs or override tables).
//! Unknown keys are accepted by serde, though we log a warning for each one.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Environment variable that takes precedence over `[translation].api_key`.
pub const TRANSLATE_API_KEY_ENV: &str = "FEEDRELAY_TRANSLATE_API_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Config file is empty: {0}")]
    Empty(PathBuf),

    #[error("Invalid abort policy {0:?} (expected \"immediately\", \"yes\" or \"no\")")]
    InvalidAbortPolicy(String),

    #[error("Feed #{0} has an empty feed_url")]
    EmptyFeedUrl(usize),

    #[error("Feed #{index} does not exist ({count} feeds configured)")]
    FeedIndexOutOfRange { index: usize, count: usize },

    #[error("Translation is configured for {0} but [translation].endpoint is missing")]
    MissingTranslationEndpoint(String),

    #[error("Invalid translation endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Insecure translation endpoint {0}: HTTPS required (except localhost)")]
    InsecureEndpoint(String),
}

// ============================================================================
// Abort Policy
// ============================================================================

/// How scoped failures (feed, entry, destination) affect the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbortPolicy {
    /// The first scoped failure terminates the run.
    Immediately,
    /// Keep going, then fail the run at the end if anything went wrong.
    Yes,
    /// Keep going and report success; failures are only logged.
    #[default]
    No,
}

impl FromStr for AbortPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediately" => Ok(Self::Immediately),
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(ConfigError::InvalidAbortPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for AbortPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Immediately => "immediately",
            Self::Yes => "yes",
            Self::No => "no",
        })
    }
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level relay configuration.
///
/// Optional scalar fields stay `Option` so the resolver can tell "absent" from
/// "explicitly empty"; defaults are applied in [`crate::profile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global webhook destinations. Trusted as-is (no prefix check).
    pub slack_urls: Vec<String>,

    /// Raw abort policy. Validated by [`Config::abort_policy`].
    pub abort: Option<String>,

    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub translate_title: Option<bool>,

    pub feeds: Vec<FeedEntry>,

    /// Seen-ID database location. `--db` takes precedence.
    pub database_path: Option<PathBuf>,

    /// Per-request HTTP timeout. Absent means the client default.
    pub request_timeout_secs: Option<u64>,

    pub translation: TranslationConfig,
}

/// One element of `feeds`: a bare URL or a table with per-feed overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeedEntry {
    Url(String),
    Override(FeedOverride),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedOverride {
    pub feed_url: String,
    #[serde(default)]
    pub slack_urls: Option<Vec<DestinationRef>>,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
    #[serde(default)]
    pub translate_title: Option<bool>,
}

/// A per-feed destination: an index into the global list or a literal URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DestinationRef {
    Index(usize),
    Url(String),
}

/// `[translation]` table.
///
/// SEC-015: Custom Debug impl masks `api_key` to prevent secret leakage.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of a LibreTranslate-compatible service.
    pub endpoint: Option<String>,
    /// API key (alternative to FEEDRELAY_TRANSLATE_API_KEY env var).
    pub api_key: Option<String>,
}

impl std::fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TranslationConfig {
    /// Resolves the full `/translate` URL from `endpoint`.
    ///
    /// Returns `Ok(None)` when no endpoint is configured. HTTP is only
    /// accepted for localhost so API keys never travel in cleartext.
    pub fn translate_url(&self) -> Result<Option<Url>, ConfigError> {
        let Some(endpoint) = self.endpoint.as_deref().map(str::trim) else {
            return Ok(None);
        };

        let mut url =
            Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))?;

        match url.scheme() {
            "https" => {}
            "http" if matches!(url.host_str(), Some("localhost" | "127.0.0.1")) => {
                tracing::warn!(endpoint = %endpoint, "Using non-HTTPS translation endpoint (localhost only)");
            }
            _ => return Err(ConfigError::InsecureEndpoint(endpoint.to_string())),
        }

        url.path_segments_mut()
            .map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?
            .pop_if_empty()
            .push("translate");
        Ok(Some(url))
    }

    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(TRANSLATE_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .map(SecretString::from)
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "slack_urls",
        "abort",
        "source_lang",
        "target_lang",
        "translate_title",
        "feeds",
        "database_path",
        "request_timeout_secs",
        "translation",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::Io)`
    /// - Empty file → `Err(ConfigError::Empty)`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(ConfigError::Empty(path.to_path_buf()));
        }

        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            destinations = config.slack_urls.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from TOML text, warning about unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: toml::Table = content.parse()?;
        for key in raw.keys() {
            if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            }
        }

        let config: Self = toml::Value::Table(raw).try_into()?;
        Ok(config)
    }

    /// Validated abort policy; absent means [`AbortPolicy::No`].
    pub fn abort_policy(&self) -> Result<AbortPolicy, ConfigError> {
        match self.abort.as_deref() {
            None => Ok(AbortPolicy::default()),
            Some(raw) => raw.parse(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
