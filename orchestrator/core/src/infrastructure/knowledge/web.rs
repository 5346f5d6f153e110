// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Allow-listed web page fetcher.
//!
//! Builds the page URL from the configured template and refuses hosts
//! outside the allow-list before any request is made. Redirects are only
//! followed to allow-listed hosts. Consecutive fetches are spaced by
//! `min_interval` and the HTML is reduced to plain text.

use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::redirect;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::domain::knowledge::{ConsultRequest, ConsultSource, KnowledgeClient, KnowledgeError};
use crate::domain::mind_config::WebConfig;

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
#[error("redirect to disallowed host {0}")]
struct RedirectRefused(String);

pub struct WebKnowledgeClient {
    client: reqwest::Client,
    config: WebConfig,
    last_fetch: Mutex<Option<Instant>>,
}

impl WebKnowledgeClient {
    pub fn new(config: WebConfig) -> Result<Self, KnowledgeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(redirect_policy(config.allowed_hosts.clone()))
            .user_agent(concat!("mindloop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KnowledgeError::Network(e.to_string()))?;
        Ok(Self {
            client,
            config,
            last_fetch: Mutex::new(None),
        })
    }

    /// Resolve the page URL for a request and check it against the
    /// allow-list.
    pub fn url_for(&self, request: &ConsultRequest) -> Result<Url, KnowledgeError> {
        let raw = self
            .config
            .url_template
            .replace("{signature}", request.signature.as_str())
            .replace("{plugin}", request.plugin.as_str());
        let url = Url::parse(&raw).map_err(|e| KnowledgeError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(KnowledgeError::InvalidUrl(raw));
        }
        let host = url
            .host_str()
            .ok_or_else(|| KnowledgeError::InvalidUrl(raw.clone()))?;
        if !is_allowed(host, &self.config.allowed_hosts) {
            return Err(KnowledgeError::HostNotAllowed(host.to_string()));
        }
        Ok(url)
    }

    /// Reserve the next fetch slot; returns how long to wait for it.
    fn reserve_slot(&self) -> std::time::Duration {
        let mut last = self.last_fetch.lock();
        let now = Instant::now();
        let slot = match *last {
            Some(previous) if previous + self.config.min_interval > now => {
                previous + self.config.min_interval
            }
            _ => now,
        };
        *last = Some(slot);
        slot.saturating_duration_since(now)
    }
}

/// Follow a redirect only when its target passes the same checks as the
/// initial URL.
fn redirect_policy(allowed: Vec<String>) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let url = attempt.url();
        match url.host_str() {
            Some(host) if matches!(url.scheme(), "http" | "https") && is_allowed(host, &allowed) => {
                attempt.follow()
            }
            host => {
                let host = host.unwrap_or_default().to_string();
                warn!(url = %url, "Refusing redirect outside the allow-list");
                attempt.error(RedirectRefused(host))
            }
        }
    })
}

fn transport_error(e: reqwest::Error) -> KnowledgeError {
    if e.is_timeout() {
        return KnowledgeError::Timeout;
    }
    let mut source = std::error::Error::source(&e);
    while let Some(inner) = source {
        if let Some(refused) = inner.downcast_ref::<RedirectRefused>() {
            return KnowledgeError::HostNotAllowed(refused.0.clone());
        }
        source = inner.source();
    }
    KnowledgeError::Network(e.to_string())
}

pub fn is_allowed(host: &str, allowed: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    allowed.iter().any(|a| {
        let a = a.to_ascii_lowercase();
        host == a || host.ends_with(&format!(".{}", a))
    })
}

/// Plain text of an HTML page, whitespace collapsed, at most `max_chars`.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let markdown = html2md::parse_html(html);
    markdown
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}

#[async_trait]
impl KnowledgeClient for WebKnowledgeClient {
    fn source(&self) -> ConsultSource {
        ConsultSource::Web
    }

    async fn consult(&self, request: &ConsultRequest) -> Result<String, KnowledgeError> {
        let url = self.url_for(request)?;

        let wait = self.reserve_slot();
        if !wait.is_zero() {
            debug!(wait = ?wait, "Rate limiting web fetch");
            tokio::time::sleep(wait).await;
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(KnowledgeError::Response(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        let html = response.text().await.map_err(transport_error)?;

        let text = extract_text(&html, self.config.max_chars);
        if text.is_empty() {
            return Err(KnowledgeError::Response(format!("empty page at {}", url)));
        }
        debug!(url = %url, chars = text.len(), "Fetched web knowledge");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::outcome::ErrorSignature;
    use crate::domain::plugin::PluginId;

    fn request() -> ConsultRequest {
        ConsultRequest {
            plugin: PluginId::new("sample_plugin").unwrap(),
            signature: ErrorSignature::TypeMismatch,
            streak: 4,
            source: ConsultSource::Web,
        }
    }

    fn config(template: String) -> WebConfig {
        WebConfig {
            allowed_hosts: vec!["127.0.0.1".to_string()],
            url_template: template,
            timeout: Duration::from_secs(2),
            min_interval: Duration::from_millis(1),
            max_chars: 64,
        }
    }

    #[test]
    fn test_allow_list_matches_subdomains_only() {
        let allowed = vec!["python.org".to_string()];
        assert!(is_allowed("docs.python.org", &allowed));
        assert!(is_allowed("PYTHON.org", &allowed));
        assert!(!is_allowed("evilpython.org", &allowed));
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let text = extract_text("<html><body><p>Type   errors\n\nhappen</p></body></html>", 100);
        assert_eq!(text, "Type errors happen");
        assert_eq!(extract_text("<p>abcdef</p>", 3), "abc");
    }

    #[tokio::test]
    async fn test_fetches_allowed_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "type_mismatch".into()))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body><p>Check operand types before adding.</p></body></html>")
            .create_async()
            .await;

        let client =
            WebKnowledgeClient::new(config(format!("{}/search?q={{signature}}", server.url()))).unwrap();
        let text = client.consult(&request()).await.unwrap();

        assert!(text.contains("Check operand types"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejects_host_outside_allow_list() {
        let client =
            WebKnowledgeClient::new(config("https://example.com/?q={signature}".to_string())).unwrap();
        let err = client.consult(&request()).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::HostNotAllowed(h) if h == "example.com"));
    }

    #[tokio::test]
    async fn test_http_error_is_response_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let client =
            WebKnowledgeClient::new(config(format!("{}/search?q={{signature}}", server.url()))).unwrap();
        assert!(matches!(
            client.consult(&request()).await,
            Err(KnowledgeError::Response(_))
        ));
    }

    #[tokio::test]
    async fn test_redirect_to_disallowed_host_is_refused() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(302)
            .with_header("location", "http://example.com/leak")
            .create_async()
            .await;
        let client =
            WebKnowledgeClient::new(config(format!("{}/search?q={{signature}}", server.url()))).unwrap();

        let err = client.consult(&request()).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::HostNotAllowed(h) if h == "example.com"));
    }

    #[tokio::test]
    async fn test_redirect_within_allow_list_is_followed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(301)
            .with_header("location", &format!("{}/page", server.url()))
            .create_async()
            .await;
        let page = server
            .mock("GET", "/page")
            .with_status(200)
            .with_body("<p>Moved here.</p>")
            .create_async()
            .await;
        let client =
            WebKnowledgeClient::new(config(format!("{}/search?q={{signature}}", server.url()))).unwrap();

        assert_eq!(client.consult(&request()).await.unwrap(), "Moved here.");
        page.assert_async().await;
    }
}
