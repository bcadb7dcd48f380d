//! The relay run: feeds → entries → destinations → commit.
//!
//! Everything is sequential. Each stage returns `Result<(), RunError>`; a
//! scoped failure is handed to [`RunContext::record`], which decides between
//! "continue with the next unit" (`Ok`) and "abort the run" (`Err`, bubbled
//! up with `?` through every loop).
//!
//! An entry's ID is committed to the [`SeenSet`] only after every destination
//! accepted it, or unconditionally in [`RunMode::DryRun`].

mod context;
mod error;

pub use context::{RunContext, RunMode, RunSummary};
pub use error::{RunError, ScopedError};

use crate::config::{AbortPolicy, Config, ConfigError};
use crate::feed::{fetch_entries, Entry};
use crate::notify::{format_message, WebhookPoster};
use crate::profile::{resolve_profiles, FeedProfile};
use crate::storage::SeenSet;
use crate::translate::{TranslateError, Translator};
use crate::util::{format_description, redact_url};

pub struct Pipeline {
    client: reqwest::Client,
    policy: AbortPolicy,
    profiles: Vec<FeedProfile>,
    translator: Option<Translator>,
    poster: WebhookPoster,
}

impl Pipeline {
    /// Validates the configuration and resolves every feed profile.
    ///
    /// The abort policy is checked first, so an invalid value fails before
    /// anything else is looked at.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Result<Self, ConfigError> {
        let policy = config.abort_policy()?;
        let profiles = resolve_profiles(config)?;

        let translator = match config.translation.translate_url()? {
            Some(url) => Some(Translator::new(
                client.clone(),
                url,
                config.translation.api_key(),
            )),
            None => {
                if let Some(p) = profiles.iter().find(|p| p.wants_translation()) {
                    return Err(ConfigError::MissingTranslationEndpoint(p.feed_url.clone()));
                }
                None
            }
        };

        Ok(Self {
            poster: WebhookPoster::new(client.clone()),
            client,
            policy,
            profiles,
            translator,
        })
    }

    pub fn policy(&self) -> AbortPolicy {
        self.policy
    }

    pub fn profiles(&self) -> &[FeedProfile] {
        &self.profiles
    }

    /// Runs one pass over every feed.
    ///
    /// # Errors
    ///
    /// - [`RunError::Aborted`] - policy `immediately` and a scoped failure
    /// - [`RunError::Failed`] - policy `yes` and the error log is non-empty
    /// - [`RunError::Storage`] - the seen-ID store rejected a write
    pub async fn run(&self, seen: &mut SeenSet, mode: RunMode) -> Result<RunSummary, RunError> {
        let mut ctx = RunContext::new(self.policy, mode);
        tracing::info!(
            feeds = self.profiles.len(),
            policy = %self.policy,
            mode = ?mode,
            known_ids = seen.len(),
            "Starting run"
        );

        for profile in &self.profiles {
            self.process_feed(profile, seen, &mut ctx).await?;
        }

        ctx.finish()
    }

    async fn process_feed(
        &self,
        profile: &FeedProfile,
        seen: &mut SeenSet,
        ctx: &mut RunContext,
    ) -> Result<(), RunError> {
        tracing::info!(feed = %profile.feed_url, "Check feed");
        ctx.summary.feeds_checked += 1;

        let parsed = match fetch_entries(&self.client, &profile.feed_url).await {
            Ok(parsed) => parsed,
            Err(source) => {
                ctx.summary.feeds_failed += 1;
                return ctx.record(ScopedError::FeedFetch {
                    feed_url: profile.feed_url.clone(),
                    source,
                });
            }
        };

        for entry in &parsed.entries {
            self.process_entry(profile, entry, seen, ctx).await?;
        }
        Ok(())
    }

    async fn process_entry(
        &self,
        profile: &FeedProfile,
        entry: &Entry,
        seen: &mut SeenSet,
        ctx: &mut RunContext,
    ) -> Result<(), RunError> {
        if seen.contains(&entry.id) {
            tracing::debug!(id = %entry.id, "Already acquired");
            ctx.summary.entries_seen += 1;
            return Ok(());
        }

        tracing::info!(id = %entry.id, feed = %profile.feed_url, "New entry");
        ctx.summary.entries_new += 1;

        let mut title = entry.title.clone();
        let mut description = format_description(&entry.description);

        if ctx.mode() == RunMode::Normal && profile.wants_translation() {
            match self.translate_entry(profile, &title, &description).await {
                Ok((t, d)) => {
                    title = t;
                    description = d;
                }
                Err(source) => {
                    return ctx.record(ScopedError::Translation {
                        id: entry.id.clone(),
                        source,
                    });
                }
            }
        }

        let message = format_message(&entry.link, &title, &description);

        match ctx.mode() {
            RunMode::DryRun => {
                tracing::info!(id = %entry.id, "Dry run, not delivered:\n{}", message);
            }
            RunMode::Normal => {
                if !self.deliver(profile, entry, &message, ctx).await? {
                    tracing::warn!(id = %entry.id, "Not recorded; will be retried next run");
                    return Ok(());
                }
            }
        }

        seen.commit(&entry.id).await?;
        ctx.summary.entries_committed += 1;
        Ok(())
    }

    /// Description first, then the title if requested. One failure boundary.
    async fn translate_entry(
        &self,
        profile: &FeedProfile,
        title: &str,
        description: &str,
    ) -> Result<(String, String), TranslateError> {
        let translator = self.translator.as_ref().ok_or(TranslateError::NotConfigured)?;

        let description = translator
            .translate(description, &profile.source_lang, &profile.target_lang)
            .await?;
        let title = if profile.translate_title {
            translator
                .translate(title, &profile.source_lang, &profile.target_lang)
                .await?
        } else {
            title.to_string()
        };
        Ok((title, description))
    }

    /// Posts to every destination. Returns whether all of them succeeded.
    async fn deliver(
        &self,
        profile: &FeedProfile,
        entry: &Entry,
        message: &str,
        ctx: &mut RunContext,
    ) -> Result<bool, RunError> {
        let mut all_ok = true;

        for destination in &profile.destination_urls {
            match self.poster.post(destination, message).await {
                Ok(()) => ctx.summary.deliveries += 1,
                Err(source) => {
                    all_ok = false;
                    ctx.record(ScopedError::Delivery {
                        id: entry.id.clone(),
                        destination: redact_url(destination),
                        source,
                    })?;
                }
            }
        }

        Ok(all_ok)
    }
}
