use crate::config::AbortPolicy;

use super::error::{RunError, ScopedError};

/// Whether network side effects (translation, delivery) are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Normal,
    /// No translation or delivery; seen IDs are still committed.
    DryRun,
}

/// Counters and the accumulated error log for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feeds_checked: usize,
    pub feeds_failed: usize,
    /// Entries skipped because their ID was already recorded.
    pub entries_seen: usize,
    pub entries_new: usize,
    pub entries_committed: usize,
    /// Successful posts, counted per destination.
    pub deliveries: usize,
    /// Human-readable scoped failures, in the order they happened.
    pub errors: Vec<String>,
}

/// State threaded by reference through feed, entry and destination loops.
#[derive(Debug)]
pub struct RunContext {
    policy: AbortPolicy,
    mode: RunMode,
    pub(crate) summary: RunSummary,
}

impl RunContext {
    pub fn new(policy: AbortPolicy, mode: RunMode) -> Self {
        Self {
            policy,
            mode,
            summary: RunSummary::default(),
        }
    }

    pub fn policy(&self) -> AbortPolicy {
        self.policy
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Logs and accumulates a scoped failure.
    ///
    /// Returns `Err(RunError::Aborted)` under [`AbortPolicy::Immediately`];
    /// callers propagate it with `?` to unwind every loop. Otherwise the
    /// caller continues with the next unit of work.
    pub fn record(&mut self, error: ScopedError) -> Result<(), RunError> {
        let message = error.to_string();
        tracing::warn!(policy = %self.policy, "{}", message);
        self.summary.errors.push(message);

        match self.policy {
            AbortPolicy::Immediately => Err(RunError::Aborted(error)),
            AbortPolicy::Yes | AbortPolicy::No => Ok(()),
        }
    }

    /// Emits the error log and turns it into the run's final result.
    ///
    /// Only [`AbortPolicy::Yes`] converts accumulated errors into a failure.
    pub fn finish(self) -> Result<RunSummary, RunError> {
        let summary = self.summary;

        tracing::info!(
            feeds = summary.feeds_checked,
            feeds_failed = summary.feeds_failed,
            new = summary.entries_new,
            committed = summary.entries_committed,
            deliveries = summary.deliveries,
            errors = summary.errors.len(),
            "Run finished"
        );

        if summary.errors.is_empty() {
            return Ok(summary);
        }

        let log = summary.errors.join("\n");
        tracing::error!("Errors during run:\n{}", log);

        match self.policy {
            AbortPolicy::Yes => Err(RunError::Failed { log }),
            AbortPolicy::No | AbortPolicy::Immediately => Ok(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FetchError;

    fn fetch_error(url: &str) -> ScopedError {
        ScopedError::FeedFetch {
            feed_url: url.to_string(),
            source: FetchError::HttpStatus(500),
        }
    }

    #[test]
    fn test_no_policy_continues_and_succeeds() {
        let mut ctx = RunContext::new(AbortPolicy::No, RunMode::Normal);
        assert!(ctx.record(fetch_error("https://a.example/rss")).is_ok());
        assert!(ctx.record(fetch_error("https://b.example/rss")).is_ok());

        let summary = ctx.finish().unwrap();
        assert_eq!(summary.errors.len(), 2);
        assert!(summary.errors[0].contains("https://a.example/rss"));
    }

    #[test]
    fn test_yes_policy_fails_at_end_with_full_log() {
        let mut ctx = RunContext::new(AbortPolicy::Yes, RunMode::Normal);
        assert!(ctx.record(fetch_error("https://a.example/rss")).is_ok());
        assert!(ctx.record(fetch_error("https://b.example/rss")).is_ok());

        match ctx.finish() {
            Err(RunError::Failed { log }) => {
                assert!(log.contains("https://a.example/rss"));
                assert!(log.contains("https://b.example/rss"));
                assert_eq!(log.lines().count(), 2);
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_yes_policy_without_errors_succeeds() {
        let ctx = RunContext::new(AbortPolicy::Yes, RunMode::DryRun);
        assert!(ctx.finish().is_ok());
    }

    #[test]
    fn test_immediately_policy_aborts_on_first_error() {
        let mut ctx = RunContext::new(AbortPolicy::Immediately, RunMode::Normal);
        match ctx.record(fetch_error("https://a.example/rss")) {
            Err(RunError::Aborted(ScopedError::FeedFetch { feed_url, .. })) => {
                assert_eq!(feed_url, "https://a.example/rss");
            }
            other => panic!("Expected Aborted, got {:?}", other),
        }
    }
}
