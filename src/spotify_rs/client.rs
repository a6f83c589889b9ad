use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use url::Url;

use crate::spotify_rs::types::{SpotifyPlaylist, SpotifyPlaylistItemsPage};

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1/";

/// Maximum page size of the playlist items endpoint
pub const PLAYLIST_ITEMS_PAGE_SIZE: u32 = 100;

/// Spotify Web API client
pub struct SpotifyClient {
    access_token: String,
    api_base: Url,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(client: reqwest::Client, api_base: Url, access_token: String) -> Self {
        Self {
            access_token,
            api_base,
            client,
        }
    }

    /// Get a playlist's name and track total
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist> {
        let mut url = self.api_base.join(&format!("playlists/{}", playlist_id))?;
        url.query_pairs_mut()
            .append_pair("fields", "name,tracks.total");

        let playlist = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json::<SpotifyPlaylist>()
            .await
            .wrap_err("Failed to deserialize Spotify playlist response")?;

        Ok(playlist)
    }

    /// Get one page of a playlist's items, starting at `offset`
    pub async fn get_playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
    ) -> Result<SpotifyPlaylistItemsPage> {
        let mut url = self
            .api_base
            .join(&format!("playlists/{}/tracks", playlist_id))?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &PLAYLIST_ITEMS_PAGE_SIZE.to_string())
            .append_pair("fields", "items(track(name,artists(name)))");

        let page = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json::<SpotifyPlaylistItemsPage>()
            .await
            .wrap_err("Failed to deserialize Spotify playlist items response")?;

        Ok(page)
    }
}
