use color_eyre::eyre::Result;

/// Decoupled representation of a Spotify playlist's header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiPlaylist {
    pub name: String,
    pub total_tracks: u32,
}

/// Decoupled representation of a Spotify track from a playlist items page.
///
/// `artists` keeps the order Spotify returns, primary artist first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiTrack {
    pub name: String,
    pub artists: Vec<String>,
}

/// One entry of a playlist items page. Spotify returns `track: null` for
/// entries that are no longer available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyPlaylistEntry {
    Track(SpotifyApiTrack),
    Unavailable,
}

/// Port trait wrapping the Spotify API capabilities used by the migration.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyClient: Send + Sync {
    async fn playlist_metadata(&self, playlist_id: &str) -> Result<SpotifyApiPlaylist>;

    /// Fetch the page of entries starting at `offset`. An empty page means
    /// there is nothing left to paginate.
    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
    ) -> Result<Vec<SpotifyPlaylistEntry>>;
}
