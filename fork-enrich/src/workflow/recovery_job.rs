//! Recovery job for stalled artists
//!
//! Targets artists whose albums all still have an unresolved evidence
//! country and whose own artist cache entry has none. Two passes:
//!
//! 1. Collaborations ("A / B", "A & B") take the country of the first part
//!    with a known cached country. No requests are made.
//! 2. The rest retry the artist lookup under name variations (see
//!    [`name_variations`]). A variation already cached with a country is
//!    used as is; a fresh hit is also stored in the artist cache under the
//!    variation.
//!
//! Hits are written to the artist's evidence entries. Nothing is defaulted
//! when both passes miss.

use super::review_job::{apply_found_country, needs_country};
use super::worker_pool::{run_pool, PoolSink, PoolStats};
use crate::codes::{is_known_tag, CountryCode, CountryResult, LanguageCode};
use crate::config::LookupSettings;
use crate::services::{ArtistLookup, LookupError};
use crate::store::DataStore;
use crate::types::{AlbumRecord, ArtistCache, ArtistCacheEntry, EvidenceCache};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

static COLLABORATION_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[/&]\s*").expect("collaboration pattern is valid"));
static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]+\)\s*").expect("parenthetical pattern is valid"));
static NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&[a-z]+;").expect("entity pattern is valid"));

/// Names shorter than this are not worth a lookup
const MIN_NAME_CHARS: usize = 2;

fn long_enough(name: &str) -> bool {
    name.chars().count() >= MIN_NAME_CHARS
}

/// `&amp;` decoded, other named entities dropped
pub fn decode_entities(name: &str) -> String {
    let decoded = name.replace("&amp;", "&");
    NAMED_ENTITY.replace_all(&decoded, "").trim().to_string()
}

/// Parts of a collaboration, or nothing when `name` names a single act
pub fn collaboration_parts(name: &str) -> Vec<String> {
    let parts: Vec<String> = COLLABORATION_SEPARATOR
        .split(name)
        .map(str::trim)
        .filter(|part| long_enough(part))
        .map(String::from)
        .collect();
    if parts.len() > 1 {
        parts
    } else {
        Vec::new()
    }
}

/// Alternative spellings to retry, in order, without duplicates
///
/// Each collaboration part, the name without a leading "The ", without
/// parentheticals, and with HTML entities decoded. The name itself is never
/// included.
pub fn name_variations(name: &str) -> Vec<String> {
    let name = name.trim();
    let mut variations = collaboration_parts(&decode_entities(name));

    if let Some(rest) = name.strip_prefix("The ") {
        variations.push(rest.trim().to_string());
    }

    let without_parens = PARENTHETICAL
        .replace_all(name, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    variations.push(without_parens);

    variations.push(decode_entities(name));

    let mut seen = HashSet::new();
    variations
        .into_iter()
        .filter(|v| v != name && long_enough(v))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// An artist none of whose albums has a resolved country yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StalledArtist {
    pub name: String,
    pub urls: Vec<String>,
}

/// Artists (trimmed name) whose every album has an evidence entry with an
/// unresolved country, and with no cached country of their own
pub fn select_stalled_artists(
    albums: &[AlbumRecord],
    evidence: &EvidenceCache,
    cache: &ArtistCache,
) -> Vec<StalledArtist> {
    let mut order: Vec<String> = Vec::new();
    let mut urls_by_name: HashMap<String, Vec<String>> = HashMap::new();
    for album in albums {
        let name = album.artist.trim();
        if name.is_empty() || album.url.is_empty() {
            continue;
        }
        let urls = urls_by_name.entry(name.to_string()).or_insert_with(|| {
            order.push(name.to_string());
            Vec::new()
        });
        if !urls.contains(&album.url) {
            urls.push(album.url.clone());
        }
    }

    order
        .into_iter()
        .filter(|name| {
            !cache
                .get(name)
                .is_some_and(|entry| is_known_tag(entry.country.as_deref()))
        })
        .filter_map(|name| {
            let urls = urls_by_name.remove(&name)?;
            let all_unresolved = urls.iter().all(|url| {
                evidence
                    .get(url)
                    .is_some_and(|entry| needs_country(entry.country.as_deref()))
            });
            all_unresolved.then_some(StalledArtist { name, urls })
        })
        .collect()
}

/// Known country (and language, if cached) of a cache entry
fn cached_origin(entry: &ArtistCacheEntry) -> Option<(CountryCode, Option<LanguageCode>)> {
    let country = CountryResult::parse(entry.country.as_deref()).into_known()?;
    Some((country, LanguageCode::parse(entry.language.as_deref())))
}

/// Origin of the first collaboration part with a known cached country
pub fn origin_from_parts(
    name: &str,
    cache: &ArtistCache,
) -> Option<(CountryCode, Option<LanguageCode>)> {
    collaboration_parts(name)
        .iter()
        .find_map(|part| cache.get(part.as_str()).and_then(cached_origin))
}

/// Where a variation's country came from
#[derive(Debug, Clone, PartialEq)]
pub struct VariationHit {
    pub variation: String,
    pub entry: ArtistCacheEntry,
    /// False when the variation was already cached
    pub fetched: bool,
}

/// Try each variation in order; lookup errors fall through to the next one
/// and are reported only when no variation hits
async fn lookup_variations(
    lookup: &dyn ArtistLookup,
    cache: &ArtistCache,
    name: &str,
) -> Result<Option<VariationHit>, LookupError> {
    let mut last_error = None;
    for variation in name_variations(name) {
        if let Some(entry) = cache
            .get(&variation)
            .filter(|entry| cached_origin(entry).is_some())
        {
            return Ok(Some(VariationHit {
                entry: entry.clone(),
                variation,
                fetched: false,
            }));
        }
        match lookup.lookup_artist(&variation).await {
            Ok(Some(entry)) if cached_origin(&entry).is_some() => {
                return Ok(Some(VariationHit {
                    variation,
                    entry,
                    fetched: true,
                }));
            }
            Ok(_) => debug!(artist = %name, %variation, "Variation missed"),
            Err(e) => {
                debug!(artist = %name, %variation, error = %e, "Variation lookup failed");
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryJobSummary {
    pub stalled: usize,
    /// Collaborations resolved from their parts' cache entries
    pub from_parts: usize,
    /// Artists sent to the variation pass
    pub queued: usize,
    pub from_variations: usize,
    pub missed: usize,
    pub failed: usize,
    /// Evidence entries given a country by either pass
    pub albums_resolved: usize,
    pub pool: PoolStats,
}

type RecoveryOutcome = (StalledArtist, Result<Option<VariationHit>, LookupError>);

struct RecoverySink<'a> {
    store: &'a DataStore,
    evidence: EvidenceCache,
    cache: ArtistCache,
    summary: RecoveryJobSummary,
}

impl RecoverySink<'_> {
    fn resolve_albums(&mut self, urls: &[String], country: &CountryCode, language: Option<&LanguageCode>) {
        for url in urls {
            let unresolved = self
                .evidence
                .get(url)
                .is_some_and(|entry| needs_country(entry.country.as_deref()));
            if unresolved && apply_found_country(&mut self.evidence, url, country, language) {
                self.summary.albums_resolved += 1;
            }
        }
    }
}

impl PoolSink<RecoveryOutcome> for RecoverySink<'_> {
    fn apply(&mut self, outcome: RecoveryOutcome) {
        let (artist, result) = outcome;
        let hit = match result {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                self.summary.missed += 1;
                return;
            }
            Err(e) => {
                warn!(artist = %artist.name, error = %e, "Variation lookups failed");
                self.summary.failed += 1;
                return;
            }
        };
        let Some((country, language)) = cached_origin(&hit.entry) else {
            self.summary.missed += 1;
            return;
        };

        self.summary.from_variations += 1;
        info!(
            artist = %artist.name,
            variation = %hit.variation,
            country = %country,
            cached = !hit.fetched,
            "Country found under a name variation"
        );
        self.resolve_albums(&artist.urls, &country, language.as_ref());
        if hit.fetched {
            self.cache.entry(hit.variation).or_default().merge_from(hit.entry);
        }
    }

    fn checkpoint(&mut self, processed: usize) -> anyhow::Result<()> {
        self.store
            .save_evidence(&self.evidence)
            .with_context(|| format!("saving album evidence after {processed} artists"))?;
        self.store
            .save_artist_cache(&self.cache)
            .with_context(|| format!("saving artist cache after {processed} artists"))?;
        debug!(processed, resolved = self.summary.albums_resolved, "Recovery progress saved");
        Ok(())
    }
}

pub async fn run_recovery_job(
    store: &DataStore,
    lookup: &dyn ArtistLookup,
    settings: &LookupSettings,
    cancel: &CancellationToken,
) -> anyhow::Result<RecoveryJobSummary> {
    let albums = store.load_albums()?;
    let evidence = store.load_evidence()?;
    let cache = store.load_artist_cache()?;
    let stalled = select_stalled_artists(&albums, &evidence, &cache);

    let mut sink = RecoverySink {
        store,
        evidence,
        cache,
        summary: RecoveryJobSummary {
            stalled: stalled.len(),
            ..Default::default()
        },
    };

    let mut queue = Vec::new();
    for artist in stalled {
        match origin_from_parts(&artist.name, &sink.cache) {
            Some((country, language)) => {
                debug!(artist = %artist.name, country = %country, "Collaboration resolved from parts");
                sink.summary.from_parts += 1;
                sink.resolve_albums(&artist.urls, &country, language.as_ref());
            }
            None if !name_variations(&artist.name).is_empty() => queue.push(artist),
            None => sink.summary.missed += 1,
        }
    }
    sink.summary.queued = queue.len();

    info!(
        stalled = sink.summary.stalled,
        from_parts = sink.summary.from_parts,
        to_lookup = queue.len(),
        workers = settings.workers,
        "Stalled artist recovery"
    );

    if queue.is_empty() {
        if sink.summary.albums_resolved > 0 {
            sink.checkpoint(0)?;
        }
        return Ok(sink.summary);
    }

    let snapshot = sink.cache.clone();
    let snapshot = &snapshot;
    let pool = run_pool(
        queue,
        settings.workers,
        settings.save_every,
        cancel,
        |artist: StalledArtist| async move {
            let result = lookup_variations(lookup, snapshot, &artist.name).await;
            (artist, result)
        },
        &mut sink,
    )
    .await?;
    sink.summary.pool = pool;

    info!(
        from_parts = sink.summary.from_parts,
        from_variations = sink.summary.from_variations,
        missed = sink.summary.missed,
        failed = sink.summary.failed,
        albums_resolved = sink.summary.albums_resolved,
        "Stalled artist recovery done"
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
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn unresolved() -> AlbumEvidence {
        AlbumEvidence {
            country: Some("Unknown".into()),
            language: Some("Unknown".into()),
            ..Default::default()
        }
    }

    fn cached(country: &str) -> ArtistCacheEntry {
        ArtistCacheEntry {
            country: Some(country.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_collaboration_parts() {
        assert_eq!(collaboration_parts("Burial / Four Tet"), vec!["Burial", "Four Tet"]);
        assert_eq!(collaboration_parts("Simon & Garfunkel"), vec!["Simon", "Garfunkel"]);
        assert_eq!(collaboration_parts("AC/DC"), vec!["AC", "DC"]);
        assert!(collaboration_parts("Burial").is_empty());
        // Single-character parts are dropped, leaving one part
        assert!(collaboration_parts("X / Burial").is_empty());
    }

    #[test]
    fn test_name_variations() {
        assert_eq!(name_variations("The National"), vec!["National"]);
        assert_eq!(
            name_variations("Sun Ra (and His Arkestra)"),
            vec!["Sun Ra"]
        );
        assert_eq!(
            name_variations("Earl Sweatshirt / The Alchemist"),
            vec!["Earl Sweatshirt", "The Alchemist"]
        );
        assert_eq!(
            name_variations("Simon &amp; Garfunkel"),
            vec!["Simon", "Garfunkel", "Simon & Garfunkel"]
        );
        assert_eq!(name_variations("Ma&iuml;a"), vec!["Maa"]);
        assert!(name_variations("Burial").is_empty());
    }

    #[test]
    fn test_name_variations_have_no_duplicates() {
        let variations = name_variations("The Books (band)");
        assert_eq!(variations, vec!["Books (band)", "The Books"]);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Hall &amp; Oates"), "Hall & Oates");
        assert_eq!(decode_entities("R&eacute;mi"), "Rmi");
        assert_eq!(decode_entities("Plain"), "Plain");
    }

    #[test]
    fn test_select_requires_every_album_unresolved() {
        let albums = vec![
            album("Stalled", "/s1"),
            album("Stalled", "/s2"),
            album("Half", "/h1"),
            album("Half", "/h2"),
            album("Missing Entry", "/m1"),
            album("Cached", "/c1"),
        ];
        let mut evidence = EvidenceCache::new();
        evidence.insert("/s1".into(), unresolved());
        evidence.insert(
            "/s2".into(),
            AlbumEvidence {
                country: Some("XW".into()),
                ..Default::default()
            },
        );
        evidence.insert("/h1".into(), unresolved());
        evidence.insert(
            "/h2".into(),
            AlbumEvidence {
                country: Some("US".into()),
                ..Default::default()
            },
        );
        evidence.insert("/c1".into(), unresolved());
        let mut cache = ArtistCache::new();
        cache.insert("Cached".into(), cached("GB"));

        let selected = select_stalled_artists(&albums, &evidence, &cache);
        assert_eq!(
            selected,
            vec![StalledArtist {
                name: "Stalled".into(),
                urls: vec!["/s1".into(), "/s2".into()],
            }]
        );
    }

    #[test]
    fn test_origin_from_parts_uses_first_known_part() {
        let mut cache = ArtistCache::new();
        cache.insert("Four Tet".into(), cached("GB"));
        cache.insert("Burial".into(), cached("Unknown"));
        let (country, language) = origin_from_parts("Burial / Four Tet", &cache).unwrap();
        assert_eq!(country.as_str(), "GB");
        assert_eq!(language, None);
        assert!(origin_from_parts("Four Tet", &cache).is_none());
    }
}
