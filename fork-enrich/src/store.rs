//! Persistence adapter
//!
//! The catalog lives in one data folder as three JSON files:
//! - `albums.json`: array of album records
//! - `enrichment.json`: album url → per-album evidence
//! - `artist-cache.json`: artist name → artist lookup
//!
//! Writes go through [`fork_common::atomic`]. Cache maps are written with
//! sorted keys so checkpoints diff cleanly.

use crate::types::{AlbumRecord, ArtistCache, EvidenceCache};
use fork_common::atomic::write_json_atomic;
use fork_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ALBUMS_FILE: &str = "albums.json";
pub const EVIDENCE_FILE: &str = "enrichment.json";
pub const ARTIST_CACHE_FILE: &str = "artist-cache.json";

#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn albums_path(&self) -> PathBuf {
        self.root.join(ALBUMS_FILE)
    }

    pub fn evidence_path(&self) -> PathBuf {
        self.root.join(EVIDENCE_FILE)
    }

    pub fn artist_cache_path(&self) -> PathBuf {
        self.root.join(ARTIST_CACHE_FILE)
    }

    /// Album records; a missing file is an error
    pub fn load_albums(&self) -> Result<Vec<AlbumRecord>> {
        let path = self.albums_path();
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "album file not found: {}",
                path.display()
            )));
        }
        let albums: Vec<AlbumRecord> = read_json(&path)?;
        debug!(path = %path.display(), count = albums.len(), "Loaded albums");
        Ok(albums)
    }

    /// Write albums to `albums.json`, or to `out` when given
    pub fn save_albums(&self, albums: &[AlbumRecord], out: Option<&Path>) -> Result<PathBuf> {
        let path = out.map(Path::to_path_buf).unwrap_or_else(|| self.albums_path());
        write_json_atomic(&path, albums)?;
        debug!(path = %path.display(), count = albums.len(), "Saved albums");
        Ok(path)
    }

    /// Evidence cache; missing file is empty, unreadable file is an error
    pub fn load_evidence(&self) -> Result<EvidenceCache> {
        load_map(&self.evidence_path())
    }

    /// Evidence cache for read-only use; any problem degrades to empty
    pub fn load_evidence_or_empty(&self) -> EvidenceCache {
        load_map_or_empty(&self.evidence_path())
    }

    pub fn save_evidence(&self, evidence: &EvidenceCache) -> Result<()> {
        save_map(&self.evidence_path(), evidence)
    }

    /// Artist cache; missing file is empty, unreadable file is an error
    pub fn load_artist_cache(&self) -> Result<ArtistCache> {
        load_map(&self.artist_cache_path())
    }

    pub fn save_artist_cache(&self, cache: &ArtistCache) -> Result<()> {
        save_map(&self.artist_cache_path(), cache)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn load_map<V: DeserializeOwned>(path: &Path) -> Result<HashMap<String, V>> {
    if !path.exists() {
        debug!(path = %path.display(), "Cache file missing, starting empty");
        return Ok(HashMap::new());
    }
    let map: HashMap<String, V> = read_json(path)?;
    debug!(path = %path.display(), entries = map.len(), "Loaded cache");
    Ok(map)
}

fn load_map_or_empty<V: DeserializeOwned>(path: &Path) -> HashMap<String, V> {
    match load_map(path) {
        Ok(map) => map,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable cache, treating as empty");
            HashMap::new()
        }
    }
}

fn save_map<V: Serialize>(path: &Path, map: &HashMap<String, V>) -> Result<()> {
    let sorted: BTreeMap<&String, &V> = map.iter().collect();
    write_json_atomic(path, &sorted)?;
    debug!(path = %path.display(), entries = map.len(), "Saved cache");
    Ok(())
}
