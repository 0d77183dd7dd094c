//! Wikidata origin job
//!
//! Looks up artists that still have no country anywhere: no cached artist
//! country and at least one album whose evidence country is unresolved. A
//! hit is written to the evidence entries of that artist's unresolved
//! albums; the artist cache is left alone.

use super::review_job::{apply_found_country, needs_country};
use super::worker_pool::{run_pool, PoolSink, PoolStats};
use crate::codes::{is_known_tag, CountryResult, LanguageCode};
use crate::config::LookupSettings;
use crate::fusion::artist_key;
use crate::services::{ArtistLookup, LookupError};
use crate::store::DataStore;
use crate::types::{AlbumRecord, ArtistCache, ArtistCacheEntry, EvidenceCache};
use anyhow::Context;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Artist names that never identify an act
const NON_ARTISTS: [&str; 2] = ["Various Artists", "Unknown"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WikidataJobOptions {
    /// Count hits without touching the evidence cache
    pub dry_run: bool,
    pub limit: Option<usize>,
}

/// An artist with no known country and the albums waiting on it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownArtist {
    /// Name as first written in the catalog
    pub name: String,
    pub urls: Vec<String>,
}

/// Artists with unresolved albums and no cached country, in catalog order
pub fn select_unknown_artists(
    albums: &[AlbumRecord],
    evidence: &EvidenceCache,
    cache: &ArtistCache,
    options: &WikidataJobOptions,
) -> Vec<UnknownArtist> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, UnknownArtist> = HashMap::new();

    for album in albums {
        let name = album.artist.trim();
        if name.is_empty() || album.url.is_empty() || NON_ARTISTS.contains(&name) {
            continue;
        }
        if evidence
            .get(&album.url)
            .is_some_and(|entry| !needs_country(entry.country.as_deref()))
        {
            continue;
        }
        if cache
            .get(name)
            .is_some_and(|entry| is_known_tag(entry.country.as_deref()))
        {
            continue;
        }

        let key = artist_key(name);
        let artist = by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            UnknownArtist {
                name: name.to_string(),
                urls: Vec::new(),
            }
        });
        if !artist.urls.contains(&album.url) {
            artist.urls.push(album.url.clone());
        }
    }

    let selected = order.into_iter().filter_map(|key| by_key.remove(&key));
    match options.limit {
        Some(limit) => selected.take(limit).collect(),
        None => selected.collect(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WikidataJobSummary {
    pub selected: usize,
    pub found: usize,
    pub missed: usize,
    pub errors: usize,
    /// Evidence entries given a country
    pub albums_updated: usize,
    /// Albums whose country is still unresolved after the run
    pub remaining: usize,
    pub pool: PoolStats,
}

type WikidataOutcome = (UnknownArtist, Result<Option<ArtistCacheEntry>, LookupError>);

struct WikidataSink<'a> {
    store: &'a DataStore,
    evidence: EvidenceCache,
    dry_run: bool,
    summary: WikidataJobSummary,
}

impl PoolSink<WikidataOutcome> for WikidataSink<'_> {
    fn apply(&mut self, outcome: WikidataOutcome) {
        let (artist, result) = outcome;
        let found = match result {
            Ok(found) => found,
            Err(e) => {
                warn!(artist = %artist.name, error = %e, "Wikidata lookup failed");
                self.summary.errors += 1;
                return;
            }
        };
        let Some(entry) = found else {
            self.summary.missed += 1;
            return;
        };
        let Some(country) = CountryResult::parse(entry.country.as_deref()).into_known() else {
            self.summary.missed += 1;
            return;
        };

        self.summary.found += 1;
        info!(
            artist = %artist.name,
            country = %country,
            albums = artist.urls.len(),
            dry_run = self.dry_run,
            "Country found on Wikidata"
        );
        if self.dry_run {
            return;
        }
        let language = LanguageCode::parse(entry.language.as_deref());
        for url in &artist.urls {
            if apply_found_country(&mut self.evidence, url, &country, language.as_ref()) {
                self.summary.albums_updated += 1;
            }
        }
    }

    fn checkpoint(&mut self, processed: usize) -> anyhow::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        self.store
            .save_evidence(&self.evidence)
            .with_context(|| format!("saving album evidence after {processed} artists"))?;
        debug!(processed, found = self.summary.found, "Album evidence saved");
        Ok(())
    }
}

pub async fn run_wikidata_job(
    store: &DataStore,
    lookup: &dyn ArtistLookup,
    options: &WikidataJobOptions,
    settings: &LookupSettings,
    cancel: &CancellationToken,
) -> anyhow::Result<WikidataJobSummary> {
    let albums = store.load_albums()?;
    let evidence = store.load_evidence()?;
    let cache = store.load_artist_cache()?;
    let queue = select_unknown_artists(&albums, &evidence, &cache, options);

    info!(
        unknown_artists = queue.len(),
        workers = settings.workers,
        dry_run = options.dry_run,
        "Wikidata origin job"
    );

    let mut sink = WikidataSink {
        store,
        evidence,
        dry_run: options.dry_run,
        summary: WikidataJobSummary {
            selected: queue.len(),
            ..Default::default()
        },
    };

    if !queue.is_empty() {
        let pool = run_pool(
            queue,
            settings.workers,
            settings.save_every,
            cancel,
            |artist: UnknownArtist| async move {
                let result = lookup.lookup_artist(&artist.name).await;
                (artist, result)
            },
            &mut sink,
        )
        .await?;
        sink.summary.pool = pool;
    }

    sink.summary.remaining = albums
        .iter()
        .filter(|a| {
            sink.evidence
                .get(&a.url)
                .map_or(true, |entry| needs_country(entry.country.as_deref()))
        })
        .count();

    let hit_rate = if sink.summary.selected == 0 {
        0.0
    } else {
        100.0 * sink.summary.found as f64 / sink.summary.selected as f64
    };
    info!(
        found = sink.summary.found,
        missed = sink.summary.missed,
        errors = sink.summary.errors,
        albums_updated = sink.summary.albums_updated,
        remaining = sink.summary.remaining,
        hit_rate = %format!("{hit_rate:.1}%"),
        "Wikidata origins done"
    );
    Ok(sink.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlbumEvidence;

    fn album(artist: &str, url: &str) -> AlbumRecord {
        AlbumRecord {
            artist: artist.into(),
            title: "Title".into(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn entry(country: &str) -> AlbumEvidence {
        AlbumEvidence {
            country: Some(country.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_selects_unresolved_uncached_artists() {
        let albums = vec![
            album("Khruangbin", "/k1"),
            album("khruangbin ", "/k2"),
            album("Khruangbin", "/k3"),
            album("Various Artists", "/va"),
            album("Cached", "/c1"),
            album("Resolved", "/r1"),
            album("No Entry", "/n1"),
            album("", "/blank"),
        ];
        let evidence: EvidenceCache = [
            ("/k1", entry("Unknown")),
            ("/k2", entry("XW")),
            ("/k3", entry("US")),
            ("/va", entry("Unknown")),
            ("/c1", entry("Unknown")),
            ("/r1", entry("GB")),
        ]
        .into_iter()
        .map(|(url, e)| (url.to_string(), e))
        .collect();
        let mut cache = ArtistCache::new();
        cache.insert(
            "Cached".into(),
            ArtistCacheEntry {
                country: Some("SE".into()),
                ..Default::default()
            },
        );

        let selected =
            select_unknown_artists(&albums, &evidence, &cache, &WikidataJobOptions::default());
        assert_eq!(
            selected,
            vec![
                UnknownArtist {
                    name: "Khruangbin".into(),
                    urls: vec!["/k1".into(), "/k2".into()],
                },
                UnknownArtist {
                    name: "No Entry".into(),
                    urls: vec!["/n1".into()],
                },
            ]
        );
    }

    #[test]
    fn test_limit() {
        let albums = vec![album("A", "/a"), album("B", "/b"), album("C", "/c")];
        let options = WikidataJobOptions {
            limit: Some(2),
            ..Default::default()
        };
        let selected =
            select_unknown_artists(&albums, &EvidenceCache::new(), &ArtistCache::new(), &options);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].name, "B");
    }
}
