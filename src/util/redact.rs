use url::Url;

/// Masks the path and query of a URL for logging.
///
/// Webhook URLs carry their credential in the path
/// (`https://hooks.slack.com/services/T000/B000/XXXX`), so only the scheme,
/// host and port are kept. Unparseable input is fully masked.
///
/// # Examples
///
/// ```
/// use feedrelay::util::redact_url;
///
/// assert_eq!(
///     redact_url("https://hooks.slack.com/services/T0/B0/secret"),
///     "https://hooks.slack.com/***"
/// );
/// assert_eq!(redact_url("not a url"), "***");
/// ```
pub fn redact_url(url_str: &str) -> String {
    let Ok(url) = Url::parse(url_str.trim()) else {
        return "***".to_string();
    };

    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}://{}:{}/***", url.scheme(), host, port),
        (Some(host), None) => format!("{}://{}/***", url.scheme(), host),
        (None, _) => "***".to_string(),
    }
}
