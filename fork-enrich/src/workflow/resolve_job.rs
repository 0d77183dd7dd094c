//! Resolve job
//!
//! Runs the resolution engine over the stored catalog and writes the result
//! back. Both caches are loaded strictly: a cache that exists but cannot be
//! read aborts the run before anything is written.

use crate::store::DataStore;
use crate::validators::{CoverageReport, EvidenceSummary};
use crate::ResolutionEngine;
use anyhow::Context;
use std::path::Path;
use tracing::info;

/// Resolve every album and write `albums.json` (or `out`)
pub fn run_resolve(store: &DataStore, out: Option<&Path>) -> anyhow::Result<CoverageReport> {
    let mut albums = store.load_albums().context("Failed to load albums")?;
    let evidence = store.load_evidence().with_context(|| {
        format!("Failed to load album evidence {}", store.evidence_path().display())
    })?;
    let artist_cache = store.load_artist_cache().with_context(|| {
        format!("Failed to load artist cache {}", store.artist_cache_path().display())
    })?;

    EvidenceSummary::build(&albums, &evidence).log_summary();

    let engine = ResolutionEngine::new(&albums, &artist_cache, evidence);
    let report = engine.resolve_all(&mut albums);

    let written = store
        .save_albums(&albums, out)
        .context("Failed to write resolved albums")?;
    info!(path = %written.display(), albums = albums.len(), "Resolved albums written");
    Ok(report)
}
