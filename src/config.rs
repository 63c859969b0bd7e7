use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ports::credentials::AccountRole;
use crate::services::library_sync::types::{
    MAX_PAGE_SIZE, MAX_PLAYLIST_ADD_BATCH, MAX_SAVE_TRACKS_BATCH, SyncSettings,
};
use crate::spotify_rs::client::DEFAULT_API_BASE_URL;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpotifyConfig {
    pub api_base_url: String,
    /// Per-request timeout, e.g. `"10s"` or `"1m 30s"`.
    pub request_timeout: String,
    pub requests_per_second: u32,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: "10s".to_string(),
            requests_per_second: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: u32,
    pub liked_tracks_batch_size: usize,
    pub playlist_batch_size: usize,
    pub description_prefix: String,
    pub public_playlists: bool,
    /// Account that libraries selected on the secondary side are read from.
    pub secondary_selection_source: AccountRole,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let settings = SyncSettings::default();
        Self {
            page_size: settings.page_size,
            liked_tracks_batch_size: settings.liked_tracks_batch_size.get(),
            playlist_batch_size: settings.playlist_batch_size.get(),
            description_prefix: settings.description_prefix,
            public_playlists: settings.public_playlists,
            secondary_selection_source: AccountRole::Primary,
        }
    }
}

fn check_range(name: &str, value: usize, max: usize) -> Result<NonZeroUsize> {
    match NonZeroUsize::new(value) {
        Some(value) if value.get() <= max => Ok(value),
        _ => bail!("`{}` must be between 1 and {}, got {}", name, max, value),
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("library-sync").join("config.toml"))
    }

    /// Load the default config file, falling back to built-in defaults when it doesn't exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the default path, unless a file is already there
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| eyre!("No config directory available"))?;
        if path.exists() {
            tracing::info!("Config already exists at {}", path.display());
            return Ok(path);
        }
        Self::default().write_to(&path)?;
        Ok(path)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.api_base_url()?;
        self.request_timeout()?;
        self.requests_per_second()?;
        self.sync_settings()?;
        Ok(())
    }

    pub fn api_base_url(&self) -> Result<Url> {
        Url::parse(&self.spotify.api_base_url)
            .wrap_err_with(|| format!("Invalid api_base_url: {}", self.spotify.api_base_url))
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.spotify.request_timeout).wrap_err_with(|| {
            format!(
                "Invalid request_timeout: {}",
                self.spotify.request_timeout
            )
        })
    }

    pub fn requests_per_second(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.spotify.requests_per_second)
            .ok_or_else(|| eyre!("`requests_per_second` must be at least 1"))
    }

    /// Engine settings, range-checked against the Web API limits.
    pub fn sync_settings(&self) -> Result<SyncSettings> {
        let page_size = check_range("page_size", self.sync.page_size as usize, MAX_PAGE_SIZE as usize)?;
        Ok(SyncSettings {
            page_size: page_size.get() as u32,
            liked_tracks_batch_size: check_range(
                "liked_tracks_batch_size",
                self.sync.liked_tracks_batch_size,
                MAX_SAVE_TRACKS_BATCH.get(),
            )?,
            playlist_batch_size: check_range(
                "playlist_batch_size",
                self.sync.playlist_batch_size,
                MAX_PLAYLIST_ADD_BATCH.get(),
            )?,
            description_prefix: self.sync.description_prefix.clone(),
            public_playlists: self.sync.public_playlists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults_match_api_limits() {
        let config = Config::default();
        assert_ok!(config.validate());

        let settings = config.sync_settings().unwrap();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.liked_tracks_batch_size.get(), 50);
        assert_eq!(settings.playlist_batch_size.get(), 100);
        assert_eq!(settings.description_prefix, "Synced from {account} account - ");
        assert!(!settings.public_playlists);
        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(
            config.sync.secondary_selection_source,
            AccountRole::Primary
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[spotify]
request_timeout = "30s"

[sync]
playlist_batch_size = 25
secondary_selection_source = "secondary"
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.spotify.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.sync.playlist_batch_size, 25);
        assert_eq!(config.sync.page_size, 50);
        assert_eq!(
            config.sync.secondary_selection_source,
            AccountRole::Secondary
        );
    }

    #[test]
    fn test_rejects_batch_sizes_above_api_limits() {
        let mut config = Config::default();
        config.sync.liked_tracks_batch_size = 51;
        let error = assert_err!(config.validate());
        assert!(error.to_string().contains("`liked_tracks_batch_size` must be between 1 and 50"));

        let mut config = Config::default();
        config.sync.playlist_batch_size = 0;
        let error = assert_err!(config.validate());
        assert!(error.to_string().contains("`playlist_batch_size` must be between 1 and 100"));

        let mut config = Config::default();
        config.sync.page_size = 51;
        let error = assert_err!(config.validate());
        assert!(error.to_string().contains("`page_size` must be between 1 and 50"));
    }

    #[test]
    fn test_rejects_bad_timeout_and_rate() {
        let mut config = Config::default();
        config.spotify.request_timeout = "soon".into();
        let error = assert_err!(config.validate());
        assert!(error.to_string().contains("Invalid request_timeout: soon"));

        let mut config = Config::default();
        config.spotify.requests_per_second = 0;
        let error = assert_err!(config.validate());
        assert!(error.to_string().contains("`requests_per_second` must be at least 1"));
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.sync.public_playlists = true;
        config.write_to(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }
}
