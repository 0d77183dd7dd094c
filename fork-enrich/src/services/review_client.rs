//! Review page client
//!
//! Fetches a review page relative to the configured origin and reduces it to
//! the plain text of its paragraphs.

use super::musicbrainz_client::{build_http_client, request_limiter, DirectLimiter};
use super::{LookupError, RetryPolicy, ReviewTextSource};
use crate::config::LookupSettings;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<p[^>]*>(.*?)</p>").expect("paragraph pattern is valid"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&[a-z]+;|&#\d+;").expect("entity pattern is valid"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Paragraph text of an HTML page, tags and entities replaced by spaces
pub fn extract_review_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let paragraphs: Vec<&str> = PARAGRAPH
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let joined = paragraphs.join(" ");
    let untagged = TAG.replace_all(&joined, " ");
    let plain = ENTITY.replace_all(&untagged, " ");
    WHITESPACE.replace_all(&plain, " ").trim().to_string()
}

pub struct ReviewClient {
    client: Client,
    origin: String,
    rate_limiter: DirectLimiter,
    retry: RetryPolicy,
}

impl ReviewClient {
    pub fn new(settings: &LookupSettings) -> Result<Self, LookupError> {
        Ok(Self {
            client: build_http_client(&settings.user_agent)?,
            origin: settings.review_origin.clone(),
            rate_limiter: request_limiter(settings.delay),
            retry: RetryPolicy::new(settings.max_attempts, settings.delay),
        })
    }

    async fn get_once(&self, url: &str) -> Result<String, LookupError> {
        self.rate_limiter.until_ready().await;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::from_status(status.as_u16(), url));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ReviewTextSource for ReviewClient {
    async fn fetch_review_text(&self, path: &str) -> Result<Option<String>, LookupError> {
        let url = format!("{}{}", self.origin, path);
        match self.retry.run(&url, || self.get_once(&url)).await {
            Ok(html) => {
                let text = extract_review_text(&html);
                debug!(%url, chars = text.len(), "Fetched review text");
                Ok(Some(text))
            }
            Err(LookupError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_paragraphs_only() {
        let html = r#"<html><head><title>Ignore me</title></head><body>
            <nav>Menu</nav>
            <p class="lead">The <a href="/x">Lagos-based</a> collective&#8217;s debut.</p>
            <div>Sidebar</div>
            <p>Second
            paragraph &amp; more.</p>
            </body></html>"#;
        assert_eq!(
            extract_review_text(html),
            "The Lagos-based collective s debut. Second paragraph more."
        );
    }

    #[test]
    fn test_no_paragraphs() {
        assert_eq!(extract_review_text("<div>nothing</div>"), "");
        assert_eq!(extract_review_text(""), "");
    }
}
