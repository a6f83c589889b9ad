use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};

/// Which YouTube Music collection a search is restricted to, and therefore
/// what kind of items end up in the created playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    #[default]
    Videos,
    Songs,
}

impl std::fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchFilter::Videos => write!(f, "videos"),
            SearchFilter::Songs => write!(f, "songs"),
        }
    }
}

/// A single search result, ranked by position in the returned list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub video_id: String,
    pub title: Option<String>,
}

/// Outcome reported by the bulk-add endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddItemsStatus {
    Succeeded,
    Failed { status: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request never produced an HTTP response.
    #[error("Failed to send search request: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Search was rate limited")]
    RateLimited,
    #[error("YouTube Music returned server error {status}")]
    Server { status: u16 },
    #[error("YouTube Music rejected the search: {reason}")]
    Provider { reason: String },
}

impl SearchError {
    /// Errors worth retrying locally before giving up on the track.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::RateLimited | SearchError::Server { .. } => true,
            SearchError::Transport(error) => error.is_timeout(),
            SearchError::Provider { .. } => false,
        }
    }

    /// Errors that abort the worker instead of degrading the track to unresolved.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SearchError::Transport(error) if !error.is_timeout())
    }
}

/// Port trait for the (unauthenticated) YouTube Music search capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait YoutubeMusicSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        filter: SearchFilter,
        ignore_spelling: bool,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

/// Port trait for the authenticated YouTube Music library capabilities.
///
/// Implementations live in `services::youtube_music::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait YoutubeMusicPlaylists: Send + Sync {
    async fn create_playlist(&self, title: &str, description: &str) -> Result<String>;

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        video_ids: &[String],
        duplicates: bool,
    ) -> Result<AddItemsStatus>;
}
