use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ports::youtube_music::SearchFilter;
use crate::services::migration::retry::{RetryPolicy, SearchRetryPolicy};
use crate::services::migration::{DEFAULT_PLAYLIST_DESCRIPTION, DEFAULT_WORKERS};
use crate::spotify_rs::auth::SPOTIFY_ACCOUNTS_BASE;
use crate::spotify_rs::client::SPOTIFY_API_BASE;
use crate::youtube_music_rs::YTM_BASE_URL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent search workers
    pub threads: usize,
    pub playlist_type: SearchFilter,
    pub playlist_description: String,
    pub retry: RetryConfig,
    pub search: SearchConfig,
    pub spotify: SpotifyConfig,
    pub youtube_music: YoutubeMusicConfig,
}

/// Bulk-add retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    #[serde(with = "humantime_duration")]
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_attempts: usize,
    #[serde(with = "humantime_duration")]
    pub initial_backoff: Duration,
    /// Shared across all workers, 0 disables the limit
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub api_base: String,
    pub accounts_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeMusicConfig {
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: DEFAULT_WORKERS,
            playlist_type: SearchFilter::default(),
            playlist_description: DEFAULT_PLAYLIST_DESCRIPTION.to_string(),
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
            spotify: SpotifyConfig::default(),
            youtube_music: YoutubeMusicConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            delay: policy.delay,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let policy = SearchRetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff: policy.initial_backoff,
            requests_per_second: 10,
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base: SPOTIFY_API_BASE.to_string(),
            accounts_base: SPOTIFY_ACCOUNTS_BASE.to_string(),
        }
    }
}

impl Default for YoutubeMusicConfig {
    fn default() -> Self {
        Self {
            base_url: YTM_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-migrator").join("config.toml"))
    }

    /// Load the config at `path` if given, otherwise the default config file
    /// if it exists, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Create a default config file, if it doesn't exist
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or(eyre!("Could not determine config directory"))?;
        Self::write_default_to(&path)?;
        Ok(path)
    }

    fn write_default_to(path: &Path) -> Result<()> {
        if path.exists() {
            log::info!("Config file already exists at {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            delay: self.retry.delay,
        }
    }

    pub fn search_retry_policy(&self) -> SearchRetryPolicy {
        SearchRetryPolicy {
            max_attempts: self.search.max_attempts,
            initial_backoff: self.search.initial_backoff,
        }
    }

    pub fn spotify_api_base(&self) -> Result<Url> {
        parse_base_url(&self.spotify.api_base).wrap_err("Invalid spotify.api_base")
    }

    pub fn spotify_accounts_base(&self) -> Result<Url> {
        parse_base_url(&self.spotify.accounts_base).wrap_err("Invalid spotify.accounts_base")
    }

    pub fn youtube_music_base_url(&self) -> Result<Url> {
        parse_base_url(&self.youtube_music.base_url).wrap_err("Invalid youtube_music.base_url")
    }
}

/// Base URLs are joined with relative paths, so they need a trailing slash.
fn parse_base_url(raw: &str) -> Result<Url> {
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

/// (De)serialize a [`Duration`] as a human readable string such as `"5s"` or `"500ms"`.
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.threads, 20);
        assert_eq!(config.playlist_type, SearchFilter::Videos);
        assert_eq!(config.playlist_description, "Spotify playlist");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.search_retry_policy(), SearchRetryPolicy::default());
        assert_eq!(config.search.requests_per_second, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
threads = 4
playlist_type = "songs"

[retry]
delay = "250ms"

[search]
requests_per_second = 0
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.threads, 4);
        assert_eq!(config.playlist_type, SearchFilter::Songs);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.search.requests_per_second, 0);
        assert_eq!(config.search.max_attempts, 3);
        assert_eq!(config.playlist_description, "Spotify playlist");
    }

    #[test]
    fn test_invalid_duration_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\ndelay = \"soon\"\n").unwrap();

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }

    #[test]
    fn test_written_default_parses_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::write_default_to(&path).unwrap();
        let config = Config::from_file(&path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "threads = 3\n").unwrap();

        Config::write_default_to(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap().threads, 3);
    }

    #[test]
    fn test_base_urls_get_trailing_slash() {
        let mut config = Config::default();
        config.youtube_music.base_url = "http://localhost:8080/youtubei/v1".to_string();

        let url = config.youtube_music_base_url().unwrap();
        assert_eq!(url.join("search").unwrap().path(), "/youtubei/v1/search");
        assert_eq!(
            config.spotify_api_base().unwrap().as_str(),
            "https://api.spotify.com/v1/"
        );
    }
}
