use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FetchError;
use crate::notify::DeliveryError;
use crate::storage::DatabaseError;
use crate::translate::TranslateError;

/// A failure confined to one unit of work: a feed, an entry, or one
/// destination of one entry.
#[derive(Debug, Error)]
pub enum ScopedError {
    #[error("Failed to fetch feed {feed_url}: {source}")]
    FeedFetch {
        feed_url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to translate {id}: {source}")]
    Translation {
        id: String,
        #[source]
        source: TranslateError,
    },

    /// `destination` is already redacted.
    #[error("Failed to deliver {id} to {destination}: {source}")]
    Delivery {
        id: String,
        destination: String,
        #[source]
        source: DeliveryError,
    },
}

/// Why a run did not complete successfully.
#[derive(Debug, Error)]
pub enum RunError {
    /// Invalid configuration; nothing was processed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The seen-ID store could not be read or written.
    #[error("Seen-ID store error: {0}")]
    Storage(#[from] DatabaseError),

    /// `abort = "immediately"` and a scoped failure occurred.
    #[error("Run aborted: {0}")]
    Aborted(#[source] ScopedError),

    /// `abort = "yes"` and at least one scoped failure occurred.
    #[error("Run finished with errors:\n{log}")]
    Failed { log: String },
}
