//! Catalog jobs
//!
//! The cache-populating jobs select their work from the catalog and the
//! current caches, run lookups through a bounded [`worker_pool`], and
//! checkpoint the cache they own through the
//! [`DataStore`](crate::store::DataStore). [`resolve_job`] turns the caches
//! into resolved album fields.

pub mod album_job;
pub mod artist_job;
pub mod recovery_job;
pub mod resolve_job;
pub mod review_job;
pub mod wikidata_job;
pub mod worker_pool;

pub use album_job::{run_album_job, AlbumJobOptions, AlbumJobSummary};
pub use artist_job::{read_artist_list, run_artist_job, ArtistJobSummary, ArtistSelection};
pub use recovery_job::{name_variations, run_recovery_job, RecoveryJobSummary};
pub use resolve_job::run_resolve;
pub use review_job::{run_review_job, ReviewJobOptions, ReviewJobSummary};
pub use wikidata_job::{run_wikidata_job, WikidataJobOptions, WikidataJobSummary};
pub use worker_pool::{run_pool, PoolSink, PoolStats};
