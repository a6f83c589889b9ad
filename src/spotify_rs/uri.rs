use url::Url;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlaylistUriError {
    #[error("`{0}` is not a Spotify playlist URI, URL or id")]
    NotAPlaylist(String),
    #[error("Spotify playlist id `{0}` contains invalid characters")]
    InvalidId(String),
}

/// Extract the playlist id from `spotify:playlist:<id>`,
/// `https://open.spotify.com/playlist/<id>?si=...` or a bare id.
pub fn parse_playlist_id(input: &str) -> Result<String, PlaylistUriError> {
    let input = input.trim();

    let id = if let Some(rest) = input.strip_prefix("spotify:") {
        match rest.split(':').collect::<Vec<_>>().as_slice() {
            ["playlist", id] => id.to_string(),
            // Legacy user-scoped URIs: spotify:user:<user>:playlist:<id>
            ["user", _, "playlist", id] => id.to_string(),
            _ => return Err(PlaylistUriError::NotAPlaylist(input.to_string())),
        }
    } else if input.starts_with("http://") || input.starts_with("https://") {
        let url =
            Url::parse(input).map_err(|_| PlaylistUriError::NotAPlaylist(input.to_string()))?;
        if url.host_str() != Some("open.spotify.com") {
            return Err(PlaylistUriError::NotAPlaylist(input.to_string()));
        }
        let segments: Vec<_> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        match segments
            .iter()
            .position(|segment| *segment == "playlist")
            .and_then(|index| segments.get(index + 1))
        {
            Some(id) => id.to_string(),
            None => return Err(PlaylistUriError::NotAPlaylist(input.to_string())),
        }
    } else {
        input.to_string()
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PlaylistUriError::InvalidId(id));
    }
    Ok(id)
}
