//! Configuration loading and data folder resolution
//!
//! The data folder holds `albums.json`, `enrichment.json` and
//! `artist-cache.json`. It is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`FORK_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup; it is logged and
//! replaced by defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data folder
pub const ROOT_FOLDER_ENV: &str = "FORK_ROOT_FOLDER";

/// Config file name looked up under the platform config directory
pub const CONFIG_FILE_NAME: &str = "fork.toml";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// External lookup settings shared by the enrichment jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// User-Agent sent to MusicBrainz, Wikidata and review pages
    pub user_agent: String,
    /// MusicBrainz web service root
    pub musicbrainz_url: String,
    /// Wikidata action API endpoint
    pub wikidata_url: String,
    /// Origin that album `url` paths are relative to
    pub review_origin: String,
    /// Minimum spacing between outgoing requests, in milliseconds
    pub delay_ms: u64,
    /// Concurrent workers per job
    pub workers: usize,
    /// Checkpoint the cache every N processed items
    pub save_every: usize,
    /// Attempts per request (first try included)
    pub max_attempts: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            user_agent: "TheFork/1.0 (album-review-browser)".to_string(),
            musicbrainz_url: "https://musicbrainz.org/ws/2".to_string(),
            wikidata_url: "https://www.wikidata.org/w/api.php".to_string(),
            review_origin: "https://pitchfork.com".to_string(),
            delay_ms: 350,
            workers: 4,
            save_every: 100,
            max_attempts: 3,
        }
    }
}

/// Contents of `fork.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Data folder (overridden by CLI and environment)
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub lookup: LookupConfig,
}

/// Platform config file location (`~/.config/fork/fork.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fork").join(CONFIG_FILE_NAME))
}

/// OS-dependent default data folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("fork"))
        .unwrap_or_else(|| PathBuf::from("./fork_data"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    Ok(toml::from_str(&content)?)
}

/// Load the config file, degrading to defaults on any problem
///
/// `explicit` is a path given on the command line; when absent the platform
/// default location is tried. A missing explicit file is reported as a
/// warning, a missing default file silently yields defaults.
pub fn load_toml_config_or_default(explicit: Option<&Path>) -> TomlConfig {
    let (path, is_explicit) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return TomlConfig::default(),
        },
    };

    if !path.exists() {
        if is_explicit {
            warn!(path = %path.display(), "Config file not found, using defaults");
        }
        return TomlConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded config file");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Config file unusable, using defaults");
            TomlConfig::default()
        }
    }
}

/// Resolve the data folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Write the config atomically
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    crate::atomic::write_atomic(path, content.as_bytes())
}
