//! Artist lookup job
//!
//! Looks up each selected artist once and merges the result into the artist
//! cache (keyed by the artist name as written on the album, trimmed).

use super::worker_pool::{run_pool, PoolSink, PoolStats};
use crate::codes::is_known_tag;
use crate::config::LookupSettings;
use crate::services::{ArtistLookup, LookupError};
use crate::store::DataStore;
use crate::types::{AlbumRecord, ArtistCache, ArtistCacheEntry};
use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Which artists to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtistSelection {
    /// Catalog artists with no cache entry
    Uncached,
    /// Catalog artists whose cached country is unknown
    RefreshMissingCountry,
    /// Catalog artists whose cached country or language is unknown
    RefreshMissing,
    /// Exactly one artist
    Named(String),
    /// An explicit list (duplicates removed, order kept)
    List(Vec<String>),
}

impl ArtistSelection {
    pub fn describe(&self) -> String {
        match self {
            Self::Uncached => "lookup uncached".to_string(),
            Self::RefreshMissingCountry => "refresh missing country".to_string(),
            Self::RefreshMissing => "refresh missing country/language".to_string(),
            Self::Named(name) => format!("single artist ({name})"),
            Self::List(names) => format!("artists file ({} artists)", names.len()),
        }
    }
}

/// Artist names from a file holding a JSON array or one name per line
pub fn read_artist_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading artist list {}", path.display()))?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.starts_with('[') {
        let parsed: Vec<serde_json::Value> = serde_json::from_str(raw)
            .with_context(|| format!("parsing artist list {}", path.display()))?;
        return Ok(parsed
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect());
    }
    Ok(raw
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Distinct artist names (trimmed) of albums that have both an artist and a url
pub fn catalog_artists(albums: &[AlbumRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    albums
        .iter()
        .filter(|a| !a.artist.trim().is_empty() && !a.url.is_empty())
        .map(|a| a.artist.trim().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

pub fn select_artists(
    albums: &[AlbumRecord],
    cache: &ArtistCache,
    selection: &ArtistSelection,
) -> Vec<String> {
    let missing = |name: &String, need_language: bool| match cache.get(name) {
        None => true,
        Some(entry) => {
            !is_known_tag(entry.country.as_deref())
                || (need_language && !is_known_tag(entry.language.as_deref()))
        }
    };

    match selection {
        ArtistSelection::Named(name) => {
            let name = name.trim();
            if name.is_empty() {
                Vec::new()
            } else {
                vec![name.to_string()]
            }
        }
        ArtistSelection::List(names) => {
            let mut seen = HashSet::new();
            names
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty() && seen.insert(n.clone()))
                .collect()
        }
        ArtistSelection::Uncached => catalog_artists(albums)
            .into_iter()
            .filter(|name| !cache.contains_key(name))
            .collect(),
        ArtistSelection::RefreshMissingCountry => catalog_artists(albums)
            .into_iter()
            .filter(|name| missing(name, false))
            .collect(),
        ArtistSelection::RefreshMissing => catalog_artists(albums)
            .into_iter()
            .filter(|name| missing(name, true))
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtistJobSummary {
    pub selected: usize,
    pub found: usize,
    pub missed: usize,
    pub failed: usize,
    pub pool: PoolStats,
}

struct ArtistCacheSink<'a> {
    store: &'a DataStore,
    cache: ArtistCache,
    summary: ArtistJobSummary,
}

impl PoolSink<(String, Result<Option<ArtistCacheEntry>, LookupError>)> for ArtistCacheSink<'_> {
    fn apply(&mut self, outcome: (String, Result<Option<ArtistCacheEntry>, LookupError>)) {
        let (name, result) = outcome;
        match result {
            Ok(Some(found)) => {
                if is_known_tag(found.country.as_deref()) {
                    self.summary.found += 1;
                } else {
                    self.summary.missed += 1;
                }
                self.cache.entry(name).or_default().merge_from(found);
            }
            Ok(None) => {
                self.summary.missed += 1;
                self.cache.entry(name).or_default();
            }
            Err(e) => {
                warn!(artist = %name, error = %e, "Artist lookup failed");
                self.summary.failed += 1;
            }
        }
    }

    fn checkpoint(&mut self, processed: usize) -> anyhow::Result<()> {
        self.store
            .save_artist_cache(&self.cache)
            .with_context(|| format!("saving artist cache after {processed} lookups"))?;
        info!(
            processed,
            found = self.summary.found,
            missed = self.summary.missed,
            failed = self.summary.failed,
            "Artist cache saved"
        );
        Ok(())
    }
}

pub async fn run_artist_job(
    store: &DataStore,
    lookup: &dyn ArtistLookup,
    selection: &ArtistSelection,
    settings: &LookupSettings,
    cancel: &CancellationToken,
) -> anyhow::Result<ArtistJobSummary> {
    let albums = match selection {
        ArtistSelection::Named(_) | ArtistSelection::List(_) => Vec::new(),
        _ => store.load_albums()?,
    };
    let cache = store.load_artist_cache()?;
    let queue = select_artists(&albums, &cache, selection);

    info!(
        mode = %selection.describe(),
        cached = cache.len(),
        to_lookup = queue.len(),
        workers = settings.workers,
        "Artist lookup job"
    );

    let mut sink = ArtistCacheSink {
        store,
        cache,
        summary: ArtistJobSummary {
            selected: queue.len(),
            ..Default::default()
        },
    };
    if queue.is_empty() {
        return Ok(sink.summary);
    }

    let pool = run_pool(
        queue,
        settings.workers,
        settings.save_every,
        cancel,
        |name: String| async move {
            let result = lookup.lookup_artist(&name).await;
            (name, result)
        },
        &mut sink,
    )
    .await?;

    sink.summary.pool = pool;
    info!(
        found = sink.summary.found,
        missed = sink.summary.missed,
        failed = sink.summary.failed,
        cancelled = pool.cancelled,
        "Artist lookups done"
    );
    Ok(sink.summary)
}
