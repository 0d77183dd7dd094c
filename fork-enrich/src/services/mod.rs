//! External lookup services
//!
//! Capability traits the enrichment jobs depend on, plus their network
//! implementations. Jobs only see the traits, so tests swap in in-memory
//! lookups.

pub mod musicbrainz_client;
pub mod retry;
pub mod review_client;
pub mod wikidata_client;

pub use musicbrainz_client::MusicBrainzClient;
pub use retry::RetryPolicy;
pub use review_client::ReviewClient;
pub use wikidata_client::WikidataClient;

use crate::types::ArtistCacheEntry;
use async_trait::async_trait;
use thiserror::Error;

/// Lookup failures
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited (HTTP {0})")]
    RateLimited(u16),

    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl LookupError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, url: &str) -> Self {
        match status {
            404 => Self::NotFound(url.to_string()),
            429 => Self::RateLimited(status),
            _ => Self::Http(status, url.to_string()),
        }
    }

    /// Rate limiting, timeouts, server errors and network failures are retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited(_) => true,
            Self::Http(status, _) => matches!(status, 408 | 425 | 500..=599),
            Self::NotFound(_) | Self::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Best release match for one album
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumMatch {
    pub country: Option<String>,
    pub language: Option<String>,
    pub mbid: Option<String>,
    /// Search score plus title/artist similarity bonuses
    pub score: i64,
}

/// Artist origin lookup
#[async_trait]
pub trait ArtistLookup: Send + Sync {
    /// `Ok(None)` when no candidate is a confident match
    async fn lookup_artist(&self, name: &str) -> Result<Option<ArtistCacheEntry>, LookupError>;
}

/// Per-album release lookup
#[async_trait]
pub trait AlbumLookup: Send + Sync {
    /// `Ok(None)` when nothing useful was found
    async fn lookup_album(&self, artist: &str, title: &str) -> Result<Option<AlbumMatch>, LookupError>;
}

/// Review page text
#[async_trait]
pub trait ReviewTextSource: Send + Sync {
    /// Plain paragraph text of the review at `path`; `Ok(None)` when the page is gone
    async fn fetch_review_text(&self, path: &str) -> Result<Option<String>, LookupError>;
}
