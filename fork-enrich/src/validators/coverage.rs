//! Coverage Statistics
//!
//! Summarizes how much of the catalog carries real country/language values
//! after resolution, which codes dominate, and which evidence source filled
//! each field.
//!
//! # Buckets
//! Every album lands in exactly one of: both known, country only, language
//! only, both unknown.
//!
//! # Ordering
//! Top-N lists sort by count descending, then code ascending, so output is
//! stable across runs.

use crate::codes::{is_known_tag, CountryResult};
use crate::fusion::catalog_voting::VotingStats;
use crate::fusion::resolver::Resolution;
use crate::fusion::EvidenceSource;
use crate::types::{AlbumRecord, EvidenceCache};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    pub total: usize,
    pub both_known: usize,
    pub country_only: usize,
    pub language_only: usize,
    pub both_unknown: usize,
    pub countries: BTreeMap<String, usize>,
    pub languages: BTreeMap<String, usize>,
    pub country_sources: BTreeMap<EvidenceSource, usize>,
    pub language_sources: BTreeMap<EvidenceSource, usize>,
    pub voting: VotingStats,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one engine result
    pub fn record(&mut self, resolution: &Resolution) {
        self.count_fields(
            resolution.country.as_ref().map(|c| c.as_str()),
            resolution.language.as_ref().map(|l| l.as_str()),
        );
        if let Some(source) = resolution.country_source {
            *self.country_sources.entry(source).or_default() += 1;
        }
        if let Some(source) = resolution.language_source {
            *self.language_sources.entry(source).or_default() += 1;
        }
    }

    /// Report over albums already carrying `country` / `language` values
    ///
    /// Provenance is not stored in album files, so source counts stay empty.
    pub fn from_albums(albums: &[AlbumRecord]) -> Self {
        let mut report = Self::new();
        for album in albums {
            let country = album.country.as_deref().filter(|c| is_known_tag(Some(*c)));
            let language = album.language.as_deref().filter(|l| is_known_tag(Some(*l)));
            report.count_fields(country, language);
        }
        report
    }

    fn count_fields(&mut self, country: Option<&str>, language: Option<&str>) {
        self.total += 1;
        match (country, language) {
            (Some(_), Some(_)) => self.both_known += 1,
            (Some(_), None) => self.country_only += 1,
            (None, Some(_)) => self.language_only += 1,
            (None, None) => self.both_unknown += 1,
        }
        if let Some(c) = country {
            *self.countries.entry(c.to_string()).or_default() += 1;
        }
        if let Some(l) = language {
            *self.languages.entry(l.to_string()).or_default() += 1;
        }
    }

    /// Albums with a known country
    pub fn country_known(&self) -> usize {
        self.both_known + self.country_only
    }

    /// Albums with a known language
    pub fn language_known(&self) -> usize {
        self.both_known + self.language_only
    }

    /// Share of albums with both fields known (0.0-100.0)
    pub fn coverage_pct(&self) -> f64 {
        percent(self.both_known, self.total)
    }

    pub fn top_countries(&self, n: usize) -> Vec<(String, usize)> {
        top_n(&self.countries, n)
    }

    pub fn top_languages(&self, n: usize) -> Vec<(String, usize)> {
        top_n(&self.languages, n)
    }

    pub fn log_summary(&self, top: usize) {
        info!(
            total = self.total,
            both_known = self.both_known,
            country_only = self.country_only,
            language_only = self.language_only,
            both_unknown = self.both_unknown,
            coverage_pct = %format!("{:.1}", self.coverage_pct()),
            "Coverage"
        );
        for (code, count) in self.top_countries(top) {
            info!(country = %code, count, "Top country");
        }
        for (code, count) in self.top_languages(top) {
            info!(language = %code, count, "Top language");
        }
        for (source, count) in &self.country_sources {
            info!(%source, count, "Country source");
        }
        for (source, count) in &self.language_sources {
            info!(%source, count, "Language source");
        }
        if self.voting.artists_voted > 0 {
            info!(
                artists_voted = self.voting.artists_voted,
                accepted = self.voting.accepted,
                noise = self.voting.rejected_distribution_noise,
                margin = self.voting.rejected_insufficient_margin,
                "Catalog voting"
            );
        }
    }
}

/// State of the per-album evidence cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceSummary {
    pub entries: usize,
    pub known_country: usize,
    pub placeholder_country: usize,
    pub unresolved_country: usize,
    pub known_language: usize,
    /// Albums with no evidence entry at all
    pub albums_without_entry: usize,
}

impl EvidenceSummary {
    pub fn build(albums: &[AlbumRecord], evidence: &EvidenceCache) -> Self {
        let mut summary = Self {
            entries: evidence.len(),
            ..Default::default()
        };
        for entry in evidence.values() {
            match CountryResult::parse(entry.country.as_deref()) {
                CountryResult::Known(_) => summary.known_country += 1,
                CountryResult::Placeholder(_) => summary.placeholder_country += 1,
                CountryResult::Unresolved => summary.unresolved_country += 1,
            }
            if is_known_tag(entry.language.as_deref()) {
                summary.known_language += 1;
            }
        }
        summary.albums_without_entry = albums
            .iter()
            .filter(|a| !evidence.contains_key(&a.url))
            .count();
        summary
    }

    pub fn log_summary(&self) {
        info!(
            entries = self.entries,
            known_country = self.known_country,
            placeholder_country = self.placeholder_country,
            unresolved_country = self.unresolved_country,
            known_language = self.known_language,
            albums_without_entry = self.albums_without_entry,
            "Evidence cache"
        );
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

fn top_n(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(n);
    sorted
}
