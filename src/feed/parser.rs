use super::xml::{parse_document, ParseError, XmlElement};

pub const RSS_1_0_NAMESPACE: &str = "http://purl.org/rss/1.0/";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// A feed item in the shape every dialect is reduced to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Identity key. Always the link.
    pub id: String,
    pub title: String,
    pub link: String,
    /// Raw description, possibly HTML.
    pub description: String,
}

/// Supported feed dialects, selected by the root element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedDialect {
    Rss,
    Atom,
    Rdf,
}

impl FeedDialect {
    /// Case-insensitive dispatch on the root's local name.
    pub fn from_root_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rdf" => Some(Self::Rdf),
            "feed" => Some(Self::Atom),
            "rss" => Some(Self::Rss),
            _ => None,
        }
    }
}

/// A recognized document, holding only the element its entries live under.
#[derive(Debug, Clone)]
pub enum FeedDocument {
    /// RSS 2.0: the `<channel>` element.
    Rss(XmlElement),
    /// Atom: the `<feed>` root.
    Atom(XmlElement),
    /// RSS 1.0: the `<rdf:RDF>` root.
    Rdf(XmlElement),
}

/// Entries extracted from one document.
#[derive(Debug, Default)]
pub struct ParseResult {
    pub entries: Vec<Entry>,
    /// Items dropped because a required field was missing.
    pub skipped: usize,
}

/// Outcome of parsing a fetched document.
#[derive(Debug)]
pub enum ParsedFeed {
    Entries(ParseResult),
    /// The root element is not one of the known dialects.
    Unsupported { root: String },
}

impl FeedDocument {
    /// Wraps a parsed root, or returns `Ok(None)` for an unknown dialect.
    pub fn from_root(root: XmlElement) -> Result<Option<Self>, ParseError> {
        let Some(dialect) = FeedDialect::from_root_name(&root.name) else {
            return Ok(None);
        };

        let document = match dialect {
            FeedDialect::Rdf => FeedDocument::Rdf(root),
            FeedDialect::Atom => FeedDocument::Atom(root),
            FeedDialect::Rss => {
                let channel = root
                    .children
                    .into_iter()
                    .find(|c| c.name == "channel" && c.namespace.is_none())
                    .ok_or(ParseError::MissingChannel)?;
                FeedDocument::Rss(channel)
            }
        };
        Ok(Some(document))
    }

    pub fn dialect(&self) -> FeedDialect {
        match self {
            FeedDocument::Rss(_) => FeedDialect::Rss,
            FeedDocument::Atom(_) => FeedDialect::Atom,
            FeedDocument::Rdf(_) => FeedDialect::Rdf,
        }
    }

    /// Extracts every item, skipping (and logging) malformed ones.
    pub fn entries(&self) -> ParseResult {
        let (container, namespace) = match self {
            FeedDocument::Rss(channel) => (channel, None),
            FeedDocument::Atom(root) => (root, Some(ATOM_NAMESPACE)),
            FeedDocument::Rdf(root) => (root, Some(RSS_1_0_NAMESPACE)),
        };

        let mut result = ParseResult::default();
        // Atom entries are read from `item` children too, not `entry`.
        for (position, item) in container.children_named("item", namespace).enumerate() {
            match self.extract(item, namespace) {
                Ok(entry) => result.entries.push(entry),
                Err(field) => {
                    tracing::warn!(
                        dialect = ?self.dialect(),
                        position,
                        missing = field,
                        "Skipping malformed feed item"
                    );
                    result.skipped += 1;
                }
            }
        }
        result
    }

    fn extract(&self, item: &XmlElement, namespace: Option<&str>) -> Result<Entry, &'static str> {
        let title = item.child("title", namespace).ok_or("title")?.text.clone();

        let (link, description) = match self {
            FeedDocument::Atom(_) => (
                item.child("link", namespace)
                    .and_then(|l| l.attribute("href"))
                    .ok_or("link")?,
                &item.child("content", namespace).ok_or("content")?.text,
            ),
            FeedDocument::Rss(_) | FeedDocument::Rdf(_) => (
                item.child("link", namespace).ok_or("link")?.text.as_str(),
                &item.child("description", namespace).ok_or("description")?.text,
            ),
        };

        if link.trim().is_empty() {
            return Err("link");
        }

        Ok(Entry {
            id: link.to_string(),
            title,
            link: link.to_string(),
            description: description.clone(),
        })
    }
}

/// Parses raw feed XML into entries.
///
/// An unrecognized root element is not an error: it yields
/// [`ParsedFeed::Unsupported`] so the caller can skip the feed.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed, ParseError> {
    let root = parse_document(xml)?;
    let root_name = root.name.clone();

    match FeedDocument::from_root(root)? {
        Some(document) => Ok(ParsedFeed::Entries(document.entries())),
        None => Ok(ParsedFeed::Unsupported { root: root_name }),
    }
}
