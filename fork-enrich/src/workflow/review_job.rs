//! Review text job
//!
//! For albums whose cached country is still unknown (or only a placeholder
//! region), fetches the review page and runs the contextual origin rules over
//! its text. A hit sets the country; the language is filled from the country
//! only when the entry has no known language.

use super::worker_pool::{run_pool, PoolSink, PoolStats};
use crate::codes::{is_known_tag, primary_language, CountryCode, CountryResult, LanguageCode, UNKNOWN};
use crate::config::LookupSettings;
use crate::inference::infer_from_context;
use crate::services::{LookupError, ReviewTextSource};
use crate::store::DataStore;
use crate::types::{AlbumRecord, EvidenceCache};
use anyhow::Context;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewJobOptions {
    /// Count hits without touching the evidence cache
    pub dry_run: bool,
    pub limit: Option<usize>,
}

/// True when an evidence country still needs a real value
pub fn needs_country(raw: Option<&str>) -> bool {
    CountryResult::parse(raw).known().is_none()
}

/// Albums with an evidence entry, an unresolved country and a site-relative
/// review path, one per url
pub fn select_reviews(
    albums: &[AlbumRecord],
    evidence: &EvidenceCache,
    options: &ReviewJobOptions,
) -> Vec<AlbumRecord> {
    let mut seen = HashSet::new();
    let selected = albums
        .iter()
        .filter(|a| a.url.starts_with('/'))
        .filter(|a| {
            evidence
                .get(&a.url)
                .is_some_and(|entry| needs_country(entry.country.as_deref()))
        })
        .filter(|a| seen.insert(a.url.clone()))
        .cloned();
    match options.limit {
        Some(limit) => selected.take(limit).collect(),
        None => selected.collect(),
    }
}

/// Set a found country on an existing evidence entry
///
/// The language is filled only when the entry has no known language: from
/// `language` when given, else from the country. Returns false when `url`
/// has no entry.
pub fn apply_found_country(
    evidence: &mut EvidenceCache,
    url: &str,
    country: &CountryCode,
    language: Option<&LanguageCode>,
) -> bool {
    let Some(entry) = evidence.get_mut(url) else {
        return false;
    };
    entry.country = Some(country.to_string());
    if !is_known_tag(entry.language.as_deref()) {
        entry.language = Some(
            language
                .cloned()
                .or_else(|| primary_language(country))
                .map(|l| l.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        );
    }
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewJobSummary {
    pub selected: usize,
    pub found: usize,
    pub missed: usize,
    pub errors: usize,
    /// Albums whose country is still unresolved after the run
    pub remaining: usize,
    pub pool: PoolStats,
}

type ReviewOutcome = (AlbumRecord, Result<Option<String>, LookupError>);

struct ReviewSink<'a> {
    store: &'a DataStore,
    evidence: EvidenceCache,
    dry_run: bool,
    summary: ReviewJobSummary,
}

impl PoolSink<ReviewOutcome> for ReviewSink<'_> {
    fn apply(&mut self, outcome: ReviewOutcome) {
        let (album, result) = outcome;
        let text = match result {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(url = %album.url, "Review page not found");
                self.summary.errors += 1;
                return;
            }
            Err(e) => {
                warn!(url = %album.url, error = %e, "Review fetch failed");
                self.summary.errors += 1;
                return;
            }
        };

        match infer_from_context(&text) {
            Some(country) => {
                self.summary.found += 1;
                info!(
                    artist = %album.artist,
                    title = %album.title,
                    country = %country,
                    dry_run = self.dry_run,
                    "Country found in review text"
                );
                if !self.dry_run {
                    apply_found_country(&mut self.evidence, &album.url, &country, None);
                }
            }
            None => self.summary.missed += 1,
        }
    }

    fn checkpoint(&mut self, processed: usize) -> anyhow::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        self.store
            .save_evidence(&self.evidence)
            .with_context(|| format!("saving album evidence after {processed} reviews"))?;
        debug!(processed, found = self.summary.found, "Album evidence saved");
        Ok(())
    }
}

pub async fn run_review_job(
    store: &DataStore,
    source: &dyn ReviewTextSource,
    options: &ReviewJobOptions,
    settings: &LookupSettings,
    cancel: &CancellationToken,
) -> anyhow::Result<ReviewJobSummary> {
    let albums = store.load_albums()?;
    let evidence = store.load_evidence()?;
    let queue = select_reviews(&albums, &evidence, options);

    info!(
        to_fetch = queue.len(),
        workers = settings.workers,
        dry_run = options.dry_run,
        "Review text job"
    );

    let mut sink = ReviewSink {
        store,
        evidence,
        dry_run: options.dry_run,
        summary: ReviewJobSummary {
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
            |album: AlbumRecord| async move {
                let result = source.fetch_review_text(&album.url).await;
                (album, result)
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
        remaining = sink.summary.remaining,
        hit_rate = %format!("{hit_rate:.1}%"),
        "Review text done"
    );
    Ok(sink.summary)
}
