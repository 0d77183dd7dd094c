//! fork-enrich library interface
//!
//! Country and language resolution for the album review catalog, plus the
//! lookup jobs that populate its caches. Exposed as a library for the
//! binary and the integration tests.

pub mod codes;
pub mod config;
pub mod fusion;
pub mod inference;
pub mod services;
pub mod store;
pub mod types;
pub mod validators;
pub mod workflow;

pub use crate::fusion::resolver::{Resolution, ResolutionEngine};
pub use crate::store::DataStore;
pub use crate::types::{AlbumEvidence, AlbumRecord, ArtistCache, ArtistCacheEntry, EvidenceCache};
