//! Feed retrieval and parsing.
//!
//! - [`xml`] - owned, namespace-aware element tree built with `quick-xml`
//! - [`parser`] - dialect detection (RSS 2.0, RSS 1.0/RDF, Atom) and entry extraction
//! - [`fetcher`] - HTTP GET with a size limit, feeding the parser
//!
//! ```ignore
//! use feedrelay::feed::fetch_entries;
//!
//! let result = fetch_entries(&client, "https://example.com/rss.xml").await?;
//! for entry in result.entries { /* ... */ }
//! ```

mod fetcher;
mod parser;
mod xml;

pub use fetcher::{fetch_entries, fetch_feed, FetchError};
pub use parser::{
    parse_feed, Entry, FeedDialect, FeedDocument, ParseResult, ParsedFeed, ATOM_NAMESPACE,
    RSS_1_0_NAMESPACE,
};
pub use xml::{parse_document, ParseError, XmlElement};
