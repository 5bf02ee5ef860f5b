//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

/// Organize music files into a clean store layout.
///
/// Files found under SEARCH_PATH are identified (catalog lookup,
/// acoustic fingerprint, or their own tags), copied into STORE_PATH
/// under artist/album directories, and retagged.
#[derive(Debug, Parser)]
#[command(name = "tunetag", version, about)]
pub struct Cli {
    /// Root of the organized library; defaults to the configured store
    pub store_path: Option<PathBuf>,

    /// Directory to scan for music; defaults to the current directory
    pub search_path: Option<PathBuf>,

    /// Fingerprint files that tags and catalog cannot identify
    #[arg(short, long)]
    pub fingerprint: bool,

    /// Fetch lyric sidecar files for organized tracks
    #[arg(short, long)]
    pub lyrics: bool,

    /// Only process files whose name contains PATTERN (repeatable)
    #[arg(short, long = "pattern", value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Worker pool size; defaults to available parallelism
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Catalog API client ID (overrides the config file)
    #[arg(long, env = "TUNETAG_CATALOG_CLIENT_ID", hide_env_values = true)]
    pub catalog_client_id: Option<String>,

    /// Catalog API client secret (overrides the config file)
    #[arg(long, env = "TUNETAG_CATALOG_CLIENT_SECRET", hide_env_values = true)]
    pub catalog_client_secret: Option<String>,

    /// AcoustID API key (overrides the config file)
    #[arg(long, env = "TUNETAG_ACOUSTID_API_KEY", hide_env_values = true)]
    pub acoustid_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_paths() {
        let cli = Cli::parse_from(["tunetag", "/music/store", "/downloads"]);
        assert_eq!(cli.store_path, Some(PathBuf::from("/music/store")));
        assert_eq!(cli.search_path, Some(PathBuf::from("/downloads")));
        assert!(!cli.fingerprint);
        assert!(!cli.lyrics);
    }

    #[test]
    fn test_defaults_when_no_args() {
        let cli = Cli::parse_from(["tunetag"]);
        assert!(cli.store_path.is_none());
        assert!(cli.search_path.is_none());
        assert!(cli.patterns.is_empty());
        assert!(cli.jobs.is_none());
    }

    #[test]
    fn test_repeatable_patterns() {
        let cli = Cli::parse_from(["tunetag", "-p", "live", "--pattern", "remix"]);
        assert_eq!(cli.patterns, vec!["live", "remix"]);
    }

    #[test]
    fn test_flags_and_jobs() {
        let cli = Cli::parse_from(["tunetag", "-f", "-l", "--jobs", "8"]);
        assert!(cli.fingerprint);
        assert!(cli.lyrics);
        assert_eq!(cli.jobs, Some(8));
    }
}
