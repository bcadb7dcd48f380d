use crate::feed::parser::{parse_feed, ParseResult, ParsedFeed};
use crate::feed::xml::ParseError;
use futures::StreamExt;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching and parsing one feed.
///
/// Every variant is scoped to a single feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Feed XML could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Root element is not rss, rdf or feed
    #[error("Unsupported feed format (root element <{root}>)")]
    UnsupportedFormat { root: String },
}

/// Fetches a feed document as text.
///
/// Single attempt, no retries. Timeouts come from the client configuration.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fetches and parses a feed.
///
/// # Errors
///
/// - [`FetchError::Network`] / [`FetchError::HttpStatus`] - the GET failed
/// - [`FetchError::ResponseTooLarge`] - body exceeded 10MB
/// - [`FetchError::Parse`] - the body is not a usable XML document
/// - [`FetchError::UnsupportedFormat`] - unknown root element
pub async fn fetch_entries(client: &reqwest::Client, url: &str) -> Result<ParseResult, FetchError> {
    let xml = fetch_feed(client, url).await?;

    let result = match parse_feed(&xml)? {
        ParsedFeed::Entries(result) => result,
        ParsedFeed::Unsupported { root } => {
            tracing::warn!(feed = %url, root = %root, "Feed format not supported");
            return Err(FetchError::UnsupportedFormat { root });
        }
    };

    if result.skipped > 0 {
        tracing::warn!(
            feed = %url,
            skipped = result.skipped,
            "Malformed feed items skipped"
        );
    }

    Ok(result)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>Test</title><link>https://example.com/1</link><description>Body</description></item>
</channel></rss>"#;

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = fetch_entries(&client, &format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].id, "https://example.com/1");
    }

    #[tokio::test]
    async fn test_fetch_404_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        match fetch_entries(&client, &format!("{}/feed", mock_server.uri())).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = fetch_entries(&client, &format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(503))));
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = fetch_entries(&client, &format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<opml version=\"2.0\"/>"))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        match fetch_entries(&client, &format!("{}/feed", mock_server.uri())).await {
            Err(FetchError::UnsupportedFormat { root }) => assert_eq!(root, "opml"),
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_response_too_large() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b' '; MAX_FEED_SIZE + 1]))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge)));
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_error() {
        let client = reqwest::Client::new();
        let result = fetch_feed(&client, "not a url").await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
