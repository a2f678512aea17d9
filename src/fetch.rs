//! Outbound HTTP fetching with security measures.
//!
//! Every page, feed and API request made by the monitor and the news
//! collector goes through [`Fetcher`], which applies SSRF protection,
//! timeouts and body size limits.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;

use crate::config::MonitorConfig;
use crate::error::{Result, RivalError};

/// Accept header sent with page requests.
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// HTTP fetcher with SSRF protection and resource limits.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    max_body_bytes: u64,
    allow_private_hosts: bool,
}

impl Fetcher {
    /// Create a fetcher from monitor settings.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| RivalError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Underlying HTTP client, for callers that need custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Check a URL against the SSRF policy of this fetcher.
    pub fn check_url(&self, url: &str) -> Result<()> {
        if self.allow_private_hosts {
            parse_http_url(url).map(|_| ())
        } else {
            validate_url(url)
        }
    }

    /// Fetch a URL and return the raw body.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.check_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RivalError::Fetch(format!("failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(RivalError::Fetch(format!(
                "HTTP error {} for {}",
                response.status(),
                url
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_body_bytes {
                return Err(RivalError::Fetch(format!(
                    "response too large: {} bytes (max {} bytes)",
                    content_length, self.max_body_bytes
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RivalError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > self.max_body_bytes {
            return Err(RivalError::Fetch(format!(
                "response too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_body_bytes
            )));
        }

        Ok(bytes.to_vec())
    }

    /// Fetch a URL and decode the body as UTF-8 (lossy).
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn parse_http_url(url: &str) -> Result<url::Url> {
    let parsed =
        url::Url::parse(url).map_err(|e| RivalError::Validation(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(RivalError::Validation(format!(
            "unsupported URL scheme: {}",
            scheme
        ))),
    }
}

/// Validate a URL for SSRF protection.
///
/// This function checks that:
/// - The URL uses http or https scheme
/// - The host is not a private/loopback address
/// - The host is not a reserved hostname
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = parse_http_url(url)?;

    let host = parsed
        .host()
        .ok_or_else(|| RivalError::Validation("URL has no host".to_string()))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(RivalError::Validation(format!("forbidden host: {}", domain)));
            }
        }
        url::Host::Ipv4(ipv4) => {
            let ip = IpAddr::V4(ipv4);
            if is_private_ip(&ip) {
                return Err(RivalError::Validation(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
        url::Host::Ipv6(ipv6) => {
            let ip = IpAddr::V6(ipv6);
            if is_private_ip(&ip) {
                return Err(RivalError::Validation(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    let host = host.to_lowercase();
    host == "localhost" || FORBIDDEN_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // Documentation: 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24
                || matches!(octets, [192, 0, 2, _] | [198, 51, 100, _] | [203, 0, 113, _])
        }
        IpAddr::V6(ipv6) => {
            let first = ipv6.segments()[0];
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local fc00::/7, link-local fe80::/10
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Strip HTML tags and decode common entities, collapsing whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                // Tags separate words
                result.push(' ');
            }
            '>' => in_tag = false,
            '&' if !in_tag => {
                in_entity = true;
                entity.clear();
            }
            ';' if in_entity => {
                in_entity = false;
                match entity.as_str() {
                    "amp" => result.push('&'),
                    "lt" => result.push('<'),
                    "gt" => result.push('>'),
                    "quot" => result.push('"'),
                    "apos" | "#39" => result.push('\''),
                    "nbsp" => result.push(' '),
                    _ if entity.starts_with('#') => {
                        if let Some(c) = parse_numeric_entity(&entity).and_then(char::from_u32) {
                            result.push(c);
                        }
                    }
                    _ => {
                        result.push('&');
                        result.push_str(&entity);
                        result.push(';');
                    }
                }
            }
            _ if in_entity => {
                // Bare ampersand followed by text that is not an entity
                if entity.len() > 10 || ch.is_whitespace() {
                    in_entity = false;
                    result.push('&');
                    result.push_str(&entity);
                    result.push(ch);
                } else {
                    entity.push(ch);
                }
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    if in_entity {
        result.push('&');
        result.push_str(&entity);
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#')?.parse().ok()
    }
}

/// Truncate a string to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Truncate an optional string to at most `max` characters.
pub fn truncate_opt(text: Option<&str>, max: usize) -> Option<String> {
    text.map(|t| truncate_chars(t, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            allow_private_hosts: true,
            max_body_bytes: 64,
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn test_validate_url_valid() {
        assert!(validate_url("https://example.com/pricing").is_ok());
        assert!(validate_url("http://example.com/").is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        let result = validate_url("ftp://example.com/file");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported URL scheme"));
    }

    #[test]
    fn test_validate_url_forbidden_hosts() {
        for url in [
            "http://localhost/",
            "http://server.local/",
            "http://api.internal/",
            "http://wiki.corp/",
        ] {
            let err = validate_url(url).unwrap_err();
            assert!(err.to_string().contains("forbidden host"), "{url}");
        }
    }

    #[test]
    fn test_validate_url_private_ips() {
        for url in [
            "http://127.0.0.1/",
            "http://10.0.0.1/",
            "http://172.16.0.1/",
            "http://192.168.1.1/",
            "http://169.254.169.254/latest/meta-data",
            "http://0.0.0.0/",
            "http://203.0.113.5/",
            "http://[::1]/",
            "http://[fd00::1]/",
            "http://[fe80::1]/",
        ] {
            let err = validate_url(url).unwrap_err();
            assert!(err.to_string().contains("private IP"), "{url}");
        }
        assert!(validate_url("http://172.32.0.1/").is_ok());
        assert!(validate_url("http://[2001:4860:4860::8888]/").is_ok());
    }

    #[test]
    fn test_is_forbidden_hostname() {
        assert!(is_forbidden_hostname("LOCALHOST"));
        assert!(is_forbidden_hostname("router.lan"));
        assert!(!is_forbidden_hostname("localhost.example.com"));
        assert!(!is_forbidden_hostname("news.google.com"));
    }

    #[test]
    fn test_check_url_allows_private_when_configured() {
        let fetcher = Fetcher::new(&test_config()).unwrap();
        assert!(fetcher.check_url("http://127.0.0.1:8080/").is_ok());
        assert!(fetcher.check_url("file:///etc/passwd").is_err());

        let strict = Fetcher::new(&MonitorConfig::default()).unwrap();
        assert!(strict.check_url("http://127.0.0.1:8080/").is_err());
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html("<b>Bold</b>text"), "Bold text");
        assert_eq!(strip_html("&lt;tag&gt; &amp; &quot;q&quot;"), "<tag> & \"q\"");
        assert_eq!(strip_html("A&nbsp;B &#65;&#x42;"), "A B AB");
        assert_eq!(strip_html("R&D team"), "R&D team");
        assert_eq!(strip_html("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(strip_html("<p>\n\tMany   spaces\n</p>"), "Many spaces");
    }

    #[test]
    fn test_parse_numeric_entity() {
        assert_eq!(parse_numeric_entity("#65"), Some(65));
        assert_eq!(parse_numeric_entity("#x41"), Some(65));
        assert_eq!(parse_numeric_entity("#X41"), Some(65));
        assert_eq!(parse_numeric_entity("invalid"), None);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("ああああ", 2), "ああ");
        assert_eq!(truncate_opt(Some("abcdef"), 2), Some("ab".to_string()));
        assert_eq!(truncate_opt(None, 2), None);
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>hi</html>")
            .create_async()
            .await;

        let fetcher = Fetcher::new(&test_config()).unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/page", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "<html>hi</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = Fetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, RivalError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/big")
            .with_status(200)
            .with_body("x".repeat(200))
            .create_async()
            .await;

        let fetcher = Fetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch_bytes(&format!("{}/big", server.url()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
