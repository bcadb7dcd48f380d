use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

/// SEC-003: Maximum element nesting depth accepted in a feed document.
const MAX_XML_DEPTH: usize = 64;

/// Errors that can occur while turning feed XML into entries.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// SEC-003: Nesting depth exceeds safety limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// No root element was found.
    #[error("Document has no root element")]
    NoRoot,

    /// RSS 2.0 document without a `<channel>` element.
    #[error("RSS document has no <channel> element")]
    MissingChannel,
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        ParseError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ParseError::Xml(e.to_string())
    }
}

/// An owned element with its resolved namespace.
///
/// `text` holds the concatenation of the element's direct text and CDATA
/// children, which is what feed readers mean by "the text of `<title>`".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First child with the given local name and namespace (`None` = no namespace).
    pub fn child(&self, name: &str, namespace: Option<&str>) -> Option<&XmlElement> {
        self.children
            .iter()
            .find(|c| c.name == name && c.namespace.as_deref() == namespace)
    }

    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
        namespace: Option<&'a str>,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children
            .iter()
            .filter(move |c| c.name == name && c.namespace.as_deref() == namespace)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses a whole document and returns its root element.
///
/// # Security
///
/// SEC-002: quick-xml (0.37) never parses `<!ENTITY>` declarations. Only the
/// five XML builtins are resolved by `unescape()`; any custom entity reference
/// is an error, so DOCTYPE-based expansion attacks cannot inject content.
pub fn parse_document(xml: &str) -> Result<XmlElement, ParseError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let namespace = resolved_namespace(ns)?;

        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_XML_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_XML_DEPTH));
                }
                stack.push(start_element(&e, namespace, &reader)?);
            }
            Event::Empty(e) => {
                let element = start_element(&e, namespace, &reader)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or(ParseError::NoRoot)
}

fn resolved_namespace(ns: ResolveResult<'_>) -> Result<Option<String>, ParseError> {
    match ns {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::Xml(format!(
            "unknown namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn start_element(
    e: &BytesStart<'_>,
    namespace: Option<String>,
    reader: &NsReader<&[u8]>,
) -> Result<XmlElement, ParseError> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        namespace,
        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
        attributes,
        ..XmlElement::default()
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ParseError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}
