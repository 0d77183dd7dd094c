//! Configuration resolution for fork-enrich
//!
//! Lookup settings come from the `[lookup]` table of `fork.toml`, with
//! command-line overrides on top. Out-of-range values are clamped rather
//! than rejected.

use fork_common::config::{LookupConfig, TomlConfig};
use std::time::Duration;
use tracing::warn;

/// Command-line overrides for a job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOverrides {
    pub workers: Option<usize>,
    pub delay_ms: Option<u64>,
    pub save_every: Option<usize>,
}

/// Effective settings for external lookups and the worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub user_agent: String,
    pub musicbrainz_url: String,
    pub wikidata_url: String,
    pub review_origin: String,
    pub delay: Duration,
    pub workers: usize,
    pub save_every: usize,
    pub max_attempts: u32,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self::from_lookup_config(&LookupConfig::default(), &JobOverrides::default())
    }
}

impl LookupSettings {
    pub fn resolve(toml_config: &TomlConfig, overrides: &JobOverrides) -> Self {
        Self::from_lookup_config(&toml_config.lookup, overrides)
    }

    pub fn from_lookup_config(lookup: &LookupConfig, overrides: &JobOverrides) -> Self {
        let workers = overrides.workers.unwrap_or(lookup.workers);
        let save_every = overrides.save_every.unwrap_or(lookup.save_every);
        let delay_ms = overrides.delay_ms.unwrap_or(lookup.delay_ms);

        if workers == 0 {
            warn!("workers must be at least 1, using 1");
        }
        if save_every == 0 {
            warn!("save_every must be at least 1, using 1");
        }
        if lookup.max_attempts == 0 {
            warn!("max_attempts must be at least 1, using 1");
        }

        Self {
            user_agent: lookup.user_agent.clone(),
            musicbrainz_url: lookup.musicbrainz_url.trim_end_matches('/').to_string(),
            wikidata_url: lookup.wikidata_url.trim().to_string(),
            review_origin: lookup.review_origin.trim_end_matches('/').to_string(),
            delay: Duration::from_millis(delay_ms),
            workers: workers.max(1),
            save_every: save_every.max(1),
            max_attempts: lookup.max_attempts.max(1),
        }
    }
}
