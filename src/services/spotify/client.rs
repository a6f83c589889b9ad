use std::time::{Duration, Instant};

use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use tokio::sync::Mutex;
use url::Url;

use crate::ports::spotify::{
    SpotifyApiPlaylist, SpotifyApiTrack, SpotifyClient, SpotifyPlaylistEntry,
};
use crate::spotify_rs::client::SpotifyClient as SpotifyApi;
use crate::spotify_rs::{SpotifyCredentials, request_client_credentials_token};

/// Refresh the app token this long before Spotify says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Spotify port adapter authenticated with the client-credentials flow.
pub struct SpotifyHttpAdapter {
    client: Client,
    api_base: Url,
    accounts_base: Url,
    credentials: SpotifyCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyHttpAdapter {
    pub fn new(credentials: SpotifyCredentials, api_base: Url, accounts_base: Url) -> Self {
        Self {
            client: Client::new(),
            api_base,
            accounts_base,
            credentials,
            token: Mutex::new(None),
        }
    }

    async fn api(&self) -> Result<SpotifyApi> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token
            .as_ref()
            .filter(|cached| cached.expires_at > Instant::now())
        {
            return Ok(SpotifyApi::new(
                self.client.clone(),
                self.api_base.clone(),
                cached.access_token.clone(),
            ));
        }

        tracing::debug!(client_id = %self.credentials.client_id(), "Requesting Spotify app token");
        let response =
            request_client_credentials_token(&self.client, &self.accounts_base, &self.credentials)
                .await
                .wrap_err("Failed to authenticate with Spotify")?;
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *token = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        let access_token = response.access_token;

        Ok(SpotifyApi::new(
            self.client.clone(),
            self.api_base.clone(),
            access_token,
        ))
    }
}

#[async_trait::async_trait]
impl SpotifyClient for SpotifyHttpAdapter {
    async fn playlist_metadata(&self, playlist_id: &str) -> Result<SpotifyApiPlaylist> {
        let playlist = self.api().await?.get_playlist(playlist_id).await?;
        Ok(SpotifyApiPlaylist {
            name: playlist.name,
            total_tracks: playlist.tracks.total,
        })
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
    ) -> Result<Vec<SpotifyPlaylistEntry>> {
        let page = self
            .api()
            .await?
            .get_playlist_items_page(playlist_id, offset)
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|item| match item.track {
                Some(track) => SpotifyPlaylistEntry::Track(SpotifyApiTrack {
                    name: track.name,
                    artists: track.artists.into_iter().map(|artist| artist.name).collect(),
                }),
                None => SpotifyPlaylistEntry::Unavailable,
            })
            .collect())
    }
}
