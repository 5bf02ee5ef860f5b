//! TuneTag - organize music files into a clean library layout.
//!
//! Each file found under the search path is identified via catalog
//! lookup, acoustic fingerprint, or its own tags, then copied into the
//! store under artist/album directories, retagged, and optionally given
//! a lyric sidecar.

pub mod cli;
pub mod config;
pub mod copier;
pub mod error;
pub mod location;
pub mod locks;
pub mod model;
pub mod organizer;
pub mod resolver;
pub mod sanitize;
pub mod services;
pub mod tags;
#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::organizer::Organizer;
use crate::resolver::MetadataResolver;
use crate::services::acoustid::AcoustidRecognizer;
use crate::services::catalog::client::SpotifyCredentials;
use crate::services::catalog::SpotifyClient;
use crate::services::lyrics::LrclibClient;
use crate::services::traits::{CatalogApi, Fingerprinter, LyricsApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("tunetag=info".parse().unwrap()))
        .init();

    let mut config = config::load();
    if config.absorb_credentials(
        args.catalog_client_id.as_deref(),
        args.catalog_client_secret.as_deref(),
        args.acoustid_api_key.as_deref(),
    ) {
        if let Err(e) = config::save(&config) {
            warn!(error = %e, "Could not persist credentials to the config file");
        }
    }

    let store = args
        .store_path
        .clone()
        .or_else(|| config.store_or_default())
        .ok_or_else(|| anyhow::anyhow!("no store path given and no default could be determined"))?;
    let search = match args.search_path.clone() {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let catalog = build_catalog(&args, &config)?;
    let fingerprinters = build_fingerprinters(&args, &config);
    let lyrics = build_lyrics(&args, &config)?;
    let jobs = args
        .jobs
        .or(config.organize.jobs)
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, |n| n.get()));

    info!(
        store = %store.display(),
        search = %search.display(),
        jobs,
        "Starting organize run"
    );

    let resolver = MetadataResolver::new(catalog, fingerprinters);
    let organizer = Arc::new(Organizer::new(
        store,
        search,
        resolver,
        lyrics,
        jobs,
        args.patterns.clone(),
    ));

    let report = organizer.run().await?;

    println!(
        "Organized {} of {} files ({} already in place, {} filtered out, {} failed)",
        report.organized,
        report.scanned,
        report.skipped_existing,
        report.skipped,
        report.failures.len()
    );
    if !report.is_clean() {
        for failure in &report.failures {
            error!(path = %failure.path.display(), "{}", failure.message);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Catalog client from CLI overrides or the config file; None when no
/// credentials are configured at all.
fn build_catalog(
    args: &cli::Cli,
    config: &config::Config,
) -> anyhow::Result<Option<Arc<dyn CatalogApi>>> {
    let client_id = args
        .catalog_client_id
        .clone()
        .or_else(|| config.credentials.catalog_client_id.clone());
    let client_secret = args
        .catalog_client_secret
        .clone()
        .or_else(|| config.credentials.catalog_client_secret.clone());

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => {
            let client = SpotifyClient::new(
                SpotifyCredentials {
                    client_id,
                    client_secret,
                },
                config::config_dir(),
            )?;
            Ok(Some(Arc::new(client)))
        }
        (None, None) => {
            warn!("No catalog credentials configured; skipping catalog lookups");
            Ok(None)
        }
        _ => anyhow::bail!("catalog client ID and secret must be configured together"),
    }
}

fn build_fingerprinters(args: &cli::Cli, config: &config::Config) -> Vec<Arc<dyn Fingerprinter>> {
    if !(args.fingerprint || config.organize.fingerprint) {
        return Vec::new();
    }

    let api_key = args
        .acoustid_api_key
        .clone()
        .or_else(|| config.credentials.acoustid_api_key.clone());
    match api_key {
        Some(key) => {
            if !services::fingerprint::is_fpcalc_available() {
                warn!("fpcalc not found; fingerprinting will fail per file until it is installed");
            }
            vec![Arc::new(AcoustidRecognizer::new(key))]
        }
        None => {
            warn!("Fingerprinting requested but no AcoustID API key is configured");
            Vec::new()
        }
    }
}

fn build_lyrics(
    args: &cli::Cli,
    config: &config::Config,
) -> anyhow::Result<Option<Arc<dyn LyricsApi>>> {
    if !(args.lyrics || config.organize.lyrics) {
        return Ok(None);
    }
    Ok(Some(Arc::new(LrclibClient::new()?)))
}
