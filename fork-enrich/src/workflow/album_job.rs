//! Per-album release lookup job
//!
//! Fills the evidence cache (album url → country/language/mbid) from release
//! lookups. A lookup never downgrades a known value: the new value wins when
//! present, otherwise the prior known value is kept, otherwise "Unknown".

use super::worker_pool::{run_pool, PoolSink, PoolStats};
use crate::codes::{is_known_tag, UNKNOWN};
use crate::config::LookupSettings;
use crate::fusion::artist_key;
use crate::services::{AlbumLookup, AlbumMatch, LookupError};
use crate::store::DataStore;
use crate::types::{AlbumEvidence, AlbumRecord, EvidenceCache};
use anyhow::Context;
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumJobOptions {
    /// Also retry albums whose cached country or language is unknown
    pub resolve_unknown: bool,
    /// Stop after this many lookups
    pub limit: Option<usize>,
    /// Copy an artist's majority country/language pair onto that artist's
    /// fully unknown entries before looking anything up
    pub infer_from_artist: bool,
}

/// Albums to look up, in catalog order, one per url
pub fn select_albums(
    albums: &[AlbumRecord],
    evidence: &EvidenceCache,
    options: &AlbumJobOptions,
) -> Vec<AlbumRecord> {
    let mut seen = HashSet::new();
    let selected = albums
        .iter()
        .filter(|a| !a.url.is_empty())
        .filter(|a| match evidence.get(&a.url) {
            None => true,
            Some(existing) => {
                options.resolve_unknown
                    && (!is_known_tag(existing.country.as_deref())
                        || !is_known_tag(existing.language.as_deref()))
            }
        })
        .filter(|a| seen.insert(a.url.clone()))
        .cloned();
    match options.limit {
        Some(limit) => selected.take(limit).collect(),
        None => selected.collect(),
    }
}

/// Copy each artist's most common known (country, language) pair onto that
/// artist's entries where both are unknown. Ties go to the pair seen first.
/// Returns the number of entries changed.
pub fn infer_unknowns_from_known_artists(
    albums: &[AlbumRecord],
    evidence: &mut EvidenceCache,
) -> usize {
    // artist key → pairs in first-seen order with counts
    let mut votes: HashMap<String, Vec<((String, String), usize)>> = HashMap::new();
    for album in albums {
        let key = artist_key(&album.artist);
        if key.is_empty() {
            continue;
        }
        let Some(entry) = evidence.get(&album.url) else {
            continue;
        };
        let (Some(country), Some(language)) = (entry.country.as_deref(), entry.language.as_deref())
        else {
            continue;
        };
        if !is_known_tag(Some(country)) || !is_known_tag(Some(language)) {
            continue;
        }
        let pair = (country.to_string(), language.to_string());
        let tally = votes.entry(key).or_default();
        match tally.iter_mut().find(|(p, _)| *p == pair) {
            Some((_, count)) => *count += 1,
            None => tally.push((pair, 1)),
        }
    }

    let mut inferred = 0;
    for album in albums {
        let key = artist_key(&album.artist);
        if key.is_empty() {
            continue;
        }
        let Some(entry) = evidence.get_mut(&album.url) else {
            continue;
        };
        if is_known_tag(entry.country.as_deref()) || is_known_tag(entry.language.as_deref()) {
            continue;
        }
        let Some(tally) = votes.get(&key) else {
            continue;
        };
        let mut best: Option<&(String, String)> = None;
        let mut best_count = 0;
        for (pair, count) in tally {
            if *count > best_count {
                best = Some(pair);
                best_count = *count;
            }
        }
        if let Some((country, language)) = best {
            entry.country = Some(country.clone());
            entry.language = Some(language.clone());
            inferred += 1;
        }
    }
    inferred
}

/// Fold one lookup outcome into the prior entry
pub fn merge_lookup(
    prior: Option<&AlbumEvidence>,
    outcome: &Result<Option<AlbumMatch>, LookupError>,
) -> AlbumEvidence {
    let mut merged = prior.cloned().unwrap_or_default();
    let known_prior =
        |value: &Option<String>| value.clone().filter(|v| is_known_tag(Some(v.as_str())));

    match outcome {
        Ok(found) => {
            let found = found.as_ref();
            merged.country = Some(
                found
                    .and_then(|m| m.country.clone())
                    .or_else(|| known_prior(&merged.country))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            );
            merged.language = Some(
                found
                    .and_then(|m| m.language.clone())
                    .or_else(|| known_prior(&merged.language))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            );
            if let Some(m) = found {
                if m.mbid.is_some() {
                    merged.mbid = m.mbid.clone();
                }
                merged.score = Some(m.score as f64);
            }
        }
        Err(_) => {
            if merged.country.is_none() {
                merged.country = Some(UNKNOWN.to_string());
            }
            if merged.language.is_none() {
                merged.language = Some(UNKNOWN.to_string());
            }
        }
    }
    merged
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlbumJobSummary {
    pub inferred: usize,
    pub selected: usize,
    /// Country and language both known after the lookup
    pub resolved: usize,
    pub unresolved: usize,
    pub failed: usize,
    pub pool: PoolStats,
}

type AlbumOutcome = (String, Result<Option<AlbumMatch>, LookupError>);

struct EvidenceSink<'a> {
    store: &'a DataStore,
    evidence: EvidenceCache,
    summary: AlbumJobSummary,
}

impl PoolSink<AlbumOutcome> for EvidenceSink<'_> {
    fn apply(&mut self, outcome: AlbumOutcome) {
        let (url, result) = outcome;
        if let Err(e) = &result {
            warn!(%url, error = %e, "Album lookup failed");
            self.summary.failed += 1;
        }
        let merged = merge_lookup(self.evidence.get(&url), &result);
        if result.is_ok()
            && is_known_tag(merged.country.as_deref())
            && is_known_tag(merged.language.as_deref())
        {
            self.summary.resolved += 1;
        } else {
            self.summary.unresolved += 1;
        }
        self.evidence.insert(url, merged);
    }

    fn checkpoint(&mut self, processed: usize) -> anyhow::Result<()> {
        self.store
            .save_evidence(&self.evidence)
            .with_context(|| format!("saving album evidence after {processed} lookups"))?;
        info!(
            processed,
            selected = self.summary.selected,
            resolved = self.summary.resolved,
            unresolved = self.summary.unresolved,
            failed = self.summary.failed,
            "Album evidence saved"
        );
        Ok(())
    }
}

pub async fn run_album_job(
    store: &DataStore,
    lookup: &dyn AlbumLookup,
    options: &AlbumJobOptions,
    settings: &LookupSettings,
    cancel: &CancellationToken,
) -> anyhow::Result<AlbumJobSummary> {
    let albums = store.load_albums()?;
    let mut evidence = store.load_evidence()?;
    let mut summary = AlbumJobSummary::default();

    if options.infer_from_artist {
        summary.inferred = infer_unknowns_from_known_artists(&albums, &mut evidence);
        if summary.inferred > 0 {
            store.save_evidence(&evidence)?;
            info!(inferred = summary.inferred, "Inferred unknown entries from known artists");
        }
    }

    let queue = select_albums(&albums, &evidence, options);
    summary.selected = queue.len();
    info!(
        albums = albums.len(),
        cached = evidence.len(),
        resolve_unknown = options.resolve_unknown,
        to_lookup = queue.len(),
        workers = settings.workers,
        "Album lookup job"
    );
    if queue.is_empty() {
        return Ok(summary);
    }

    let mut sink = EvidenceSink {
        store,
        evidence,
        summary,
    };
    let pool = run_pool(
        queue,
        settings.workers,
        settings.save_every,
        cancel,
        |album: AlbumRecord| async move {
            let result = lookup.lookup_album(&album.artist, &album.title).await;
            (album.url, result)
        },
        &mut sink,
    )
    .await?;

    sink.summary.pool = pool;
    info!(
        resolved = sink.summary.resolved,
        unresolved = sink.summary.unresolved,
        failed = sink.summary.failed,
        cancelled = pool.cancelled,
        "Album lookups done"
    );
    Ok(sink.summary)
}
