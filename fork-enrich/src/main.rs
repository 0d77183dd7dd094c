//! fork-enrich - country and language enrichment for the album review catalog
//!
//! Subcommands:
//! - `resolve`: merge all cached evidence into `albums.json`
//! - `enrich-artists`, `enrich-albums`, `enrich-reviews`, `enrich-wikidata`:
//!   populate the caches
//! - `stats`: coverage of the stored catalog

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fork_common::config::{load_toml_config_or_default, resolve_root_folder};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fork_enrich::config::{JobOverrides, LookupSettings};
use fork_enrich::services::{MusicBrainzClient, ReviewClient, WikidataClient};
use fork_enrich::store::DataStore;
use fork_enrich::validators::{CoverageReport, EvidenceSummary};
use fork_enrich::workflow::{
    read_artist_list, run_album_job, run_artist_job, run_recovery_job, run_resolve,
    run_review_job, run_wikidata_job, AlbumJobOptions, ArtistSelection, ReviewJobOptions,
    WikidataJobOptions,
};

/// Number of countries/languages listed in coverage summaries
const TOP_N: usize = 15;

/// Command-line arguments for fork-enrich
#[derive(Parser, Debug)]
#[command(name = "fork-enrich")]
#[command(about = "Country and language enrichment for the album review catalog")]
#[command(version)]
struct Cli {
    /// Data folder holding albums.json and the caches
    #[arg(short, long, global = true, env = "FORK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    lookup: LookupArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Concurrent lookups
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Minimum spacing between outgoing requests, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Save the cache every N processed items
    #[arg(long, global = true)]
    save_every: Option<usize>,
}

impl From<&LookupArgs> for JobOverrides {
    fn from(args: &LookupArgs) -> Self {
        Self {
            workers: args.workers,
            delay_ms: args.delay_ms,
            save_every: args.save_every,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve country and language for every album
    Resolve {
        /// Write the result here instead of replacing albums.json
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Look up artist origins
    EnrichArtists {
        /// Look up a single artist
        #[arg(long, conflicts_with_all = ["artists_file", "refresh_missing_country", "refresh_missing", "variations"])]
        artist: Option<String>,

        /// Look up artists listed in a file (JSON array or one per line)
        #[arg(long, conflicts_with_all = ["refresh_missing_country", "refresh_missing", "variations"])]
        artists_file: Option<PathBuf>,

        /// Retry cached artists without a known country
        #[arg(long, conflicts_with_all = ["refresh_missing", "variations"])]
        refresh_missing_country: bool,

        /// Retry cached artists without a known country or language
        #[arg(long, conflicts_with = "variations")]
        refresh_missing: bool,

        /// Recover artists with no resolved album from collaboration parts
        /// and name variations
        #[arg(long)]
        variations: bool,
    },

    /// Look up releases for albums
    EnrichAlbums {
        /// Also retry albums whose cached country or language is unknown
        #[arg(long)]
        resolve_unknown: bool,

        /// Stop after N albums
        #[arg(long)]
        limit: Option<usize>,

        /// Fill fully unknown albums from the artist's other albums first
        #[arg(long)]
        infer_from_artist: bool,
    },

    /// Infer countries from review text for still-unknown albums
    EnrichReviews {
        /// Report hits without saving
        #[arg(long)]
        dry_run: bool,

        /// Stop after N albums
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Look up still-unknown artists on Wikidata
    EnrichWikidata {
        /// Report hits without saving
        #[arg(long)]
        dry_run: bool,

        /// Stop after N artists
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Coverage of the stored catalog
    Stats {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let toml_config = load_toml_config_or_default(cli.config.as_deref());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let root_folder = resolve_root_folder(cli.root_folder.as_deref(), &toml_config);
    let store = DataStore::new(root_folder);
    let settings = LookupSettings::resolve(&toml_config, &JobOverrides::from(&cli.lookup));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        root_folder = %store.root().display(),
        "Starting fork-enrich"
    );

    match cli.command {
        Command::Resolve { out } => {
            let report = run_resolve(&store, out.as_deref())?;
            report.log_summary(TOP_N);
            Ok(())
        }
        Command::EnrichArtists {
            variations: true, ..
        } => {
            let client = MusicBrainzClient::new(&settings)
                .context("Failed to build MusicBrainz client")?;
            let cancel = cancel_on_shutdown();
            run_recovery_job(&store, &client, &settings, &cancel).await?;
            Ok(())
        }
        Command::EnrichArtists {
            artist,
            artists_file,
            refresh_missing_country,
            refresh_missing,
            ..
        } => {
            let selection = if let Some(path) = artists_file {
                ArtistSelection::List(read_artist_list(&path)?)
            } else if let Some(name) = artist {
                ArtistSelection::Named(name)
            } else if refresh_missing_country {
                ArtistSelection::RefreshMissingCountry
            } else if refresh_missing {
                ArtistSelection::RefreshMissing
            } else {
                ArtistSelection::Uncached
            };
            let client = MusicBrainzClient::new(&settings)
                .context("Failed to build MusicBrainz client")?;
            let cancel = cancel_on_shutdown();
            run_artist_job(&store, &client, &selection, &settings, &cancel).await?;
            Ok(())
        }
        Command::EnrichAlbums {
            resolve_unknown,
            limit,
            infer_from_artist,
        } => {
            let options = AlbumJobOptions {
                resolve_unknown,
                limit,
                infer_from_artist,
            };
            let client = MusicBrainzClient::new(&settings)
                .context("Failed to build MusicBrainz client")?;
            let cancel = cancel_on_shutdown();
            run_album_job(&store, &client, &options, &settings, &cancel).await?;
            Ok(())
        }
        Command::EnrichReviews { dry_run, limit } => {
            let options = ReviewJobOptions { dry_run, limit };
            let client =
                ReviewClient::new(&settings).context("Failed to build review client")?;
            let cancel = cancel_on_shutdown();
            run_review_job(&store, &client, &options, &settings, &cancel).await?;
            Ok(())
        }
        Command::EnrichWikidata { dry_run, limit } => {
            let options = WikidataJobOptions { dry_run, limit };
            let client =
                WikidataClient::new(&settings).context("Failed to build Wikidata client")?;
            let cancel = cancel_on_shutdown();
            run_wikidata_job(&store, &client, &options, &settings, &cancel).await?;
            Ok(())
        }
        Command::Stats { json } => stats(&store, json),
    }
}

fn stats(store: &DataStore, json: bool) -> Result<()> {
    let albums = store.load_albums().context("Failed to load albums")?;
    let evidence = store.load_evidence_or_empty();
    let report = CoverageReport::from_albums(&albums);
    let summary = EvidenceSummary::build(&albums, &evidence);

    if json {
        let body = serde_json::json!({
            "coverage": report,
            "evidence": summary,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        report.log_summary(TOP_N);
        summary.log_summary();
    }
    Ok(())
}

/// Token cancelled on Ctrl+C or SIGTERM
fn cancel_on_shutdown() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        token.cancel();
    });
    cancel
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, finishing in-flight lookups");
        },
        _ = terminate => {
            info!("Received terminate signal, finishing in-flight lookups");
        },
    }
}
