//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\tunetag\config.toml
//! - macOS: ~/Library/Application Support/tunetag/config.toml
//! - Linux: ~/.config/tunetag/config.toml
//!
//! The config file is human-readable and editable. Command-line flags
//! override whatever is loaded from it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Organizing defaults
    pub organize: OrganizeConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Catalog (Spotify) client-credentials pair
    pub catalog_client_id: Option<String>,
    pub catalog_client_secret: Option<String>,

    /// AcoustID API key for fingerprint lookups
    pub acoustid_api_key: Option<String>,
}

/// Organizing defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Store root used when no store path is given on the command line
    pub default_store: Option<PathBuf>,

    /// Run fingerprint recognizers on unmatched files
    pub fingerprint: bool,

    /// Fetch lyric sidecars for organized files
    pub lyrics: bool,

    /// Worker pool size; None means available parallelism
    pub jobs: Option<usize>,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            default_store: None,
            fingerprint: false,
            lyrics: false,
            jobs: None,
        }
    }
}

impl Config {
    /// Store root to use when the command line gives none: the configured
    /// default, else `~/Music/TuneTagLibrary`.
    pub fn store_or_default(&self) -> Option<PathBuf> {
        self.organize
            .default_store
            .clone()
            .or_else(|| dirs::audio_dir().map(|d| d.join("TuneTagLibrary")))
            .or_else(|| dirs::home_dir().map(|d| d.join("Music/TuneTagLibrary")))
    }

    /// Folds command-line credentials into the stored set so later runs can
    /// omit them. Returns true when anything actually changed.
    pub fn absorb_credentials(
        &mut self,
        catalog_client_id: Option<&str>,
        catalog_client_secret: Option<&str>,
        acoustid_api_key: Option<&str>,
    ) -> bool {
        let mut changed = false;
        for (slot, given) in [
            (&mut self.credentials.catalog_client_id, catalog_client_id),
            (
                &mut self.credentials.catalog_client_secret,
                catalog_client_secret,
            ),
            (&mut self.credentials.acoustid_api_key, acoustid_api_key),
        ] {
            if let Some(given) = given
                && slot.as_deref() != Some(given)
            {
                *slot = Some(given.to_string());
                changed = true;
            }
        }
        changed
    }
}

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunetag"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.credentials.catalog_client_id.is_none());
        assert!(!parsed.organize.lyrics);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [credentials]
            acoustid_api_key = "key123"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.credentials.acoustid_api_key.as_deref(), Some("key123"));
        assert!(parsed.credentials.catalog_client_id.is_none());
        assert!(parsed.organize.jobs.is_none());
    }

    #[test]
    fn test_absorb_credentials_records_new_values() {
        let mut config = Config::default();
        let changed = config.absorb_credentials(Some("id1"), Some("secret1"), None);
        assert!(changed);
        assert_eq!(config.credentials.catalog_client_id.as_deref(), Some("id1"));
        assert_eq!(
            config.credentials.catalog_client_secret.as_deref(),
            Some("secret1")
        );
        assert!(config.credentials.acoustid_api_key.is_none());
    }

    #[test]
    fn test_absorb_credentials_is_a_no_op_for_known_values() {
        let mut config = Config::default();
        config.credentials.acoustid_api_key = Some("key123".into());
        assert!(!config.absorb_credentials(None, None, Some("key123")));
        assert!(!config.absorb_credentials(None, None, None));
    }

    #[test]
    fn test_absorb_credentials_overwrites_a_stale_value() {
        let mut config = Config::default();
        config.credentials.catalog_client_id = Some("old-id".into());
        assert!(config.absorb_credentials(Some("new-id"), None, None));
        assert_eq!(
            config.credentials.catalog_client_id.as_deref(),
            Some("new-id")
        );
    }

    #[test]
    fn test_configured_store_wins_over_fallback() {
        let config = Config {
            organize: OrganizeConfig {
                default_store: Some(PathBuf::from("/srv/music")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.store_or_default(), Some(PathBuf::from("/srv/music")));
    }
}
