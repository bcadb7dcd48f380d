//! Per-feed execution profiles.
//!
//! Each entry in `feeds` is merged with the global settings into a fully
//! resolved [`FeedProfile`]. Override fields replace the global value as a
//! whole; `slack_urls` is the one field with special handling (empty list
//! falls back to the global list, integers index into it).
use crate::config::{Config, ConfigError, DestinationRef, FeedEntry};

/// Literal per-feed destinations must start with this prefix.
pub const WEBHOOK_URL_PREFIX: &str = "https://hooks.slack.com/services/";

const DEFAULT_SOURCE_LANG: &str = "en";

/// Resolved settings for one feed. Immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedProfile {
    pub feed_url: String,
    /// Ordered, de-duplicated webhook URLs.
    pub destination_urls: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub translate_title: bool,
}

impl FeedProfile {
    /// True when both languages are set and differ.
    pub fn wants_translation(&self) -> bool {
        !self.source_lang.is_empty()
            && !self.target_lang.is_empty()
            && self.source_lang != self.target_lang
    }
}

/// Resolves the profile for `config.feeds[index]`.
///
/// # Errors
///
/// - [`ConfigError::FeedIndexOutOfRange`] - `index` is past the end of `feeds`
/// - [`ConfigError::EmptyFeedUrl`] - the URL is blank after trimming
pub fn resolve_profile(config: &Config, index: usize) -> Result<FeedProfile, ConfigError> {
    let global_destinations: Vec<String> = config
        .slack_urls
        .iter()
        .map(|u| u.trim().to_string())
        .collect();
    let global_source = config
        .source_lang
        .clone()
        .unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string());
    let global_target = config.target_lang.clone().unwrap_or_default();
    let global_translate_title = config.translate_title.unwrap_or(false);

    let profile = match config.feeds.get(index) {
        None => {
            return Err(ConfigError::FeedIndexOutOfRange {
                index,
                count: config.feeds.len(),
            })
        }
        Some(FeedEntry::Url(url)) => FeedProfile {
            feed_url: url.trim().to_string(),
            destination_urls: global_destinations,
            source_lang: global_source,
            target_lang: global_target,
            translate_title: global_translate_title,
        },
        Some(FeedEntry::Override(o)) => FeedProfile {
            feed_url: o.feed_url.trim().to_string(),
            destination_urls: match &o.slack_urls {
                Some(refs) if !refs.is_empty() => resolve_destinations(&global_destinations, refs),
                _ => global_destinations,
            },
            source_lang: o.source_lang.clone().unwrap_or(global_source),
            target_lang: o.target_lang.clone().unwrap_or(global_target),
            translate_title: o.translate_title.unwrap_or(global_translate_title),
        },
    };

    if profile.feed_url.is_empty() {
        return Err(ConfigError::EmptyFeedUrl(index));
    }

    Ok(FeedProfile {
        destination_urls: dedup_preserving_order(profile.destination_urls),
        ..profile
    })
}

/// Resolves every configured feed, keeping the first occurrence of a URL.
pub fn resolve_profiles(config: &Config) -> Result<Vec<FeedProfile>, ConfigError> {
    let mut profiles: Vec<FeedProfile> = Vec::with_capacity(config.feeds.len());

    for index in 0..config.feeds.len() {
        let profile = resolve_profile(config, index)?;

        if profiles.iter().any(|p| p.feed_url == profile.feed_url) {
            tracing::warn!(feed = %profile.feed_url, index, "Duplicate feed URL, skipping");
            continue;
        }
        if profile.destination_urls.is_empty() {
            tracing::warn!(feed = %profile.feed_url, "Feed has no destinations");
        }
        profiles.push(profile);
    }

    Ok(profiles)
}

/// Resolves a non-empty override list against the global destinations.
///
/// Integers select from `global` (out-of-range indices are dropped with a
/// warning). Strings are trimmed and kept only if they start with
/// [`WEBHOOK_URL_PREFIX`]; anything else is dropped silently.
pub fn resolve_destinations(global: &[String], refs: &[DestinationRef]) -> Vec<String> {
    refs.iter()
        .filter_map(|r| match r {
            DestinationRef::Index(i) => {
                let url = global.get(*i).cloned();
                if url.is_none() {
                    tracing::warn!(index = *i, available = global.len(), "Destination index out of range");
                }
                url
            }
            DestinationRef::Url(raw) => {
                let url = raw.trim();
                url.starts_with(WEBHOOK_URL_PREFIX).then(|| url.to_string())
            }
        })
        .collect()
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedOverride;
    use pretty_assertions::assert_eq;

    fn global(feeds: Vec<FeedEntry>) -> Config {
        Config {
            slack_urls: vec!["A".into(), "B".into(), "C".into()],
            feeds,
            ..Config::default()
        }
    }

    fn override_with(refs: Option<Vec<DestinationRef>>) -> FeedEntry {
        FeedEntry::Override(FeedOverride {
            feed_url: "https://example.com/rss".into(),
            slack_urls: refs,
            ..FeedOverride::default()
        })
    }

    #[test]
    fn test_bare_url_uses_defaults() {
        let config = global(vec![FeedEntry::Url("  https://example.com/rss \n".into())]);
        let profile = resolve_profile(&config, 0).unwrap();
        assert_eq!(
            profile,
            FeedProfile {
                feed_url: "https://example.com/rss".into(),
                destination_urls: vec!["A".into(), "B".into(), "C".into()],
                source_lang: "en".into(),
                target_lang: "".into(),
                translate_title: false,
            }
        );
        assert!(!profile.wants_translation());
    }

    #[test]
    fn test_index_and_literal_destinations() {
        let config = global(vec![override_with(Some(vec![
            DestinationRef::Index(1),
            DestinationRef::Url("https://hooks.slack.com/services/X".into()),
        ]))]);
        let profile = resolve_profile(&config, 0).unwrap();
        assert_eq!(
            profile.destination_urls,
            vec!["B".to_string(), "https://hooks.slack.com/services/X".to_string()]
        );
    }

    #[test]
    fn test_disallowed_literal_dropped_silently() {
        let config = global(vec![override_with(Some(vec![
            DestinationRef::Url("http://not-allowed.example".into()),
            DestinationRef::Index(0),
        ]))]);
        let profile = resolve_profile(&config, 0).unwrap();
        assert_eq!(profile.destination_urls, vec!["A".to_string()]);
    }

    #[test]
    fn test_literal_is_trimmed_before_prefix_check() {
        let refs = [DestinationRef::Url("  https://hooks.slack.com/services/T/B/x  ".into())];
        assert_eq!(
            resolve_destinations(&[], &refs),
            vec!["https://hooks.slack.com/services/T/B/x".to_string()]
        );
    }

    #[test]
    fn test_empty_override_list_falls_back_to_global() {
        let config = global(vec![override_with(Some(vec![]))]);
        let profile = resolve_profile(&config, 0).unwrap();
        assert_eq!(profile.destination_urls.len(), 3);
    }

    #[test]
    fn test_absent_override_list_uses_global() {
        let config = global(vec![override_with(None)]);
        assert_eq!(resolve_profile(&config, 0).unwrap().destination_urls.len(), 3);
    }

    #[test]
    fn test_all_literals_dropped_leaves_no_destinations() {
        let config = global(vec![override_with(Some(vec![DestinationRef::Url(
            "https://evil.example/hook".into(),
        )]))]);
        assert!(resolve_profile(&config, 0).unwrap().destination_urls.is_empty());
    }

    #[test]
    fn test_out_of_range_index_dropped() {
        let refs = [DestinationRef::Index(7), DestinationRef::Index(2)];
        let global = ["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(resolve_destinations(&global, &refs), vec!["C".to_string()]);
    }

    #[test]
    fn test_duplicate_destinations_collapsed() {
        let config = global(vec![override_with(Some(vec![
            DestinationRef::Index(0),
            DestinationRef::Index(0),
            DestinationRef::Index(2),
        ]))]);
        assert_eq!(
            resolve_profile(&config, 0).unwrap().destination_urls,
            vec!["A".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn test_override_fields_replace_globals() {
        let mut config = global(vec![FeedEntry::Override(FeedOverride {
            feed_url: "https://example.com/rss".into(),
            source_lang: Some("de".into()),
            target_lang: Some("".into()),
            translate_title: Some(true),
            ..FeedOverride::default()
        })]);
        config.target_lang = Some("ja".into());

        let profile = resolve_profile(&config, 0).unwrap();
        assert_eq!(profile.source_lang, "de");
        assert_eq!(profile.target_lang, "");
        assert!(profile.translate_title);
        assert!(!profile.wants_translation());
    }

    #[test]
    fn test_global_languages_inherited() {
        let mut config = global(vec![override_with(None)]);
        config.target_lang = Some("ja".into());
        let profile = resolve_profile(&config, 0).unwrap();
        assert_eq!(profile.source_lang, "en");
        assert_eq!(profile.target_lang, "ja");
        assert!(profile.wants_translation());
    }

    #[test]
    fn test_same_languages_do_not_translate() {
        let mut config = global(vec![FeedEntry::Url("https://example.com/rss".into())]);
        config.source_lang = Some("ja".into());
        config.target_lang = Some("ja".into());
        assert!(!resolve_profile(&config, 0).unwrap().wants_translation());
    }

    #[test]
    fn test_empty_feed_url_rejected() {
        let config = global(vec![FeedEntry::Url("   ".into())]);
        assert!(matches!(
            resolve_profile(&config, 0),
            Err(ConfigError::EmptyFeedUrl(0))
        ));
    }

    #[test]
    fn test_feed_index_out_of_range() {
        let config = global(vec![FeedEntry::Url("https://example.com/rss".into())]);
        match resolve_profile(&config, 3) {
            Err(ConfigError::FeedIndexOutOfRange { index, count }) => {
                assert_eq!(index, 3);
                assert_eq!(count, 1);
            }
            other => panic!("Expected FeedIndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_feeds_keep_first() {
        let config = global(vec![
            FeedEntry::Url("https://example.com/rss".into()),
            FeedEntry::Url("https://example.com/other".into()),
            FeedEntry::Url(" https://example.com/rss".into()),
        ]);
        let profiles = resolve_profiles(&config).unwrap();
        let urls: Vec<_> = profiles.iter().map(|p| p.feed_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/rss", "https://example.com/other"]);
    }
}
