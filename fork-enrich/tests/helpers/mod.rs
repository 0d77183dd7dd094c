//! Test Helper Utilities
//!
//! Record builders, a temporary data folder, and in-memory lookups that stand
//! in for the network clients.

#![allow(dead_code)]

use async_trait::async_trait;
use fork_enrich::config::LookupSettings;
use fork_enrich::services::{AlbumLookup, AlbumMatch, ArtistLookup, LookupError, ReviewTextSource};
use fork_enrich::store::DataStore;
use fork_enrich::types::{AlbumEvidence, AlbumRecord, ArtistCache, ArtistCacheEntry, EvidenceCache};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub fn album(artist: &str, title: &str, url: &str) -> AlbumRecord {
    AlbumRecord {
        id: url.trim_start_matches('/').to_string(),
        artist: artist.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        score: 7.5,
        ..Default::default()
    }
}

pub fn album_with_description(artist: &str, url: &str, description: &str) -> AlbumRecord {
    AlbumRecord {
        description: description.to_string(),
        ..album(artist, "Untitled", url)
    }
}

pub fn evidence(country: Option<&str>, language: Option<&str>) -> AlbumEvidence {
    AlbumEvidence {
        country: country.map(str::to_string),
        language: language.map(str::to_string),
        ..Default::default()
    }
}

pub fn artist_entry(country: Option<&str>, area: Option<&str>, language: Option<&str>) -> ArtistCacheEntry {
    ArtistCacheEntry {
        country: country.map(str::to_string),
        area: area.map(str::to_string),
        language: language.map(str::to_string),
        ..Default::default()
    }
}

pub fn evidence_cache(entries: &[(&str, AlbumEvidence)]) -> EvidenceCache {
    entries
        .iter()
        .map(|(url, e)| (url.to_string(), e.clone()))
        .collect()
}

pub fn artist_cache(entries: &[(&str, ArtistCacheEntry)]) -> ArtistCache {
    entries
        .iter()
        .map(|(name, e)| (name.to_string(), e.clone()))
        .collect()
}

/// Data folder in a temp dir; dropped with the returned guard
pub fn temp_store() -> (TempDir, DataStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = DataStore::new(dir.path());
    (dir, store)
}

/// Settings for job tests: no request spacing, small checkpoints
pub fn test_settings(workers: usize, save_every: usize) -> LookupSettings {
    LookupSettings {
        delay: Duration::from_millis(0),
        workers,
        save_every,
        ..Default::default()
    }
}

/// Canned artist lookups; names in `failing` return a network error
#[derive(Default)]
pub struct MockArtistLookup {
    pub answers: HashMap<String, ArtistCacheEntry>,
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockArtistLookup {
    pub fn answer(mut self, name: &str, entry: ArtistCacheEntry) -> Self {
        self.answers.insert(name.to_string(), entry);
        self
    }

    pub fn fail(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn called(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl ArtistLookup for MockArtistLookup {
    async fn lookup_artist(&self, name: &str) -> Result<Option<ArtistCacheEntry>, LookupError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.failing.contains(name) {
            return Err(LookupError::Network("connection reset".into()));
        }
        Ok(self.answers.get(name).cloned())
    }
}

/// Canned release lookups keyed by album title
#[derive(Default)]
pub struct MockAlbumLookup {
    pub answers: HashMap<String, AlbumMatch>,
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockAlbumLookup {
    pub fn answer(mut self, title: &str, country: Option<&str>, language: Option<&str>) -> Self {
        self.answers.insert(
            title.to_string(),
            AlbumMatch {
                country: country.map(str::to_string),
                language: language.map(str::to_string),
                mbid: Some(format!("mbid-{title}")),
                score: 120,
            },
        );
        self
    }

    pub fn fail(mut self, title: &str) -> Self {
        self.failing.insert(title.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AlbumLookup for MockAlbumLookup {
    async fn lookup_album(&self, _artist: &str, title: &str) -> Result<Option<AlbumMatch>, LookupError> {
        self.calls.lock().unwrap().push(title.to_string());
        if self.failing.contains(title) {
            return Err(LookupError::Http(503, "unavailable".into()));
        }
        Ok(self.answers.get(title).cloned())
    }
}

/// Canned review text keyed by review path
#[derive(Default)]
pub struct MockReviewSource {
    pub pages: HashMap<String, String>,
    pub failing: HashSet<String>,
}

impl MockReviewSource {
    pub fn page(mut self, path: &str, text: &str) -> Self {
        self.pages.insert(path.to_string(), text.to_string());
        self
    }

    pub fn fail(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }
}

#[async_trait]
impl ReviewTextSource for MockReviewSource {
    async fn fetch_review_text(&self, path: &str) -> Result<Option<String>, LookupError> {
        if self.failing.contains(path) {
            return Err(LookupError::Network("timed out".into()));
        }
        Ok(self.pages.get(path).cloned())
    }
}
