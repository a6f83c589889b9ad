use serde_json::{Value, json};

use crate::youtube_music_rs::{InnerTubeClient, InnerTubeError};

pub const STATUS_SUCCEEDED: &str = "STATUS_SUCCEEDED";

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error(transparent)]
    Request(#[from] InnerTubeError),
    #[error("YouTube Music did not return a playlist id")]
    MissingPlaylistId,
}

/// Create an empty private playlist and return its id.
pub async fn create_playlist(
    client: &InnerTubeClient,
    title: &str,
    description: &str,
) -> Result<String, PlaylistError> {
    let body = json!({
        "title": title,
        "description": description,
        "privacyStatus": "PRIVATE",
    });
    let response = client.post("playlist/create", body).await?;

    response
        .get("playlistId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(PlaylistError::MissingPlaylistId)
}

/// Append `video_ids` to a playlist in one request and return the raw
/// `status` field. A missing status is returned as `None`.
///
/// With `allow_duplicates` the server is told to keep repeated ids instead of
/// rejecting the whole batch.
pub async fn add_playlist_items(
    client: &InnerTubeClient,
    playlist_id: &str,
    video_ids: &[String],
    allow_duplicates: bool,
) -> Result<Option<String>, InnerTubeError> {
    let actions: Vec<Value> = video_ids
        .iter()
        .map(|video_id| {
            let mut action = json!({
                "action": "ACTION_ADD_VIDEO",
                "addedVideoId": video_id,
            });
            if allow_duplicates {
                action["dedupeOption"] = json!("DEDUPE_OPTION_SKIP");
            }
            action
        })
        .collect();

    let body = json!({
        "playlistId": browse_id_to_playlist_id(playlist_id),
        "actions": actions,
    });
    let response = client.post("browse/edit_playlist", body).await?;

    Ok(response
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Playlist browse ids carry a `VL` prefix the edit endpoint does not accept.
fn browse_id_to_playlist_id(playlist_id: &str) -> &str {
    playlist_id.strip_prefix("VL").unwrap_or(playlist_id)
}

#[cfg(test)]
mod tests {
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::youtube_music_rs::BrowserAuth;

    fn client_for(server: &MockServer) -> InnerTubeClient {
        InnerTubeClient::new(
            Url::parse(&format!("{}/youtubei/v1/", server.uri())).unwrap(),
            Some(BrowserAuth::from_raw_headers("Cookie: SAPISID=abc").unwrap()),
        )
    }

    #[test]
    fn test_browse_id_prefix_is_stripped() {
        assert_eq!(browse_id_to_playlist_id("VLPLabc"), "PLabc");
        assert_eq!(browse_id_to_playlist_id("PLabc"), "PLabc");
    }

    #[tokio::test]
    async fn test_create_playlist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/playlist/create"))
            .and(body_partial_json(json!({
                "title": "Road Trip",
                "description": "Spotify playlist",
                "privacyStatus": "PRIVATE"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "playlistId": "PLnew" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = create_playlist(&client_for(&server), "Road Trip", "Spotify playlist")
            .await
            .unwrap();

        assert_eq!(id, "PLnew");
    }

    #[tokio::test]
    async fn test_create_playlist_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let result = create_playlist(&client_for(&server), "x", "y").await;
        assert!(matches!(result, Err(PlaylistError::MissingPlaylistId)));
    }

    #[tokio::test]
    async fn test_add_items_keeps_order_and_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/browse/edit_playlist"))
            .and(body_partial_json(json!({
                "playlistId": "PLnew",
                "actions": [
                    { "action": "ACTION_ADD_VIDEO", "addedVideoId": "a", "dedupeOption": "DEDUPE_OPTION_SKIP" },
                    { "action": "ACTION_ADD_VIDEO", "addedVideoId": "b", "dedupeOption": "DEDUPE_OPTION_SKIP" },
                    { "action": "ACTION_ADD_VIDEO", "addedVideoId": "a", "dedupeOption": "DEDUPE_OPTION_SKIP" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": STATUS_SUCCEEDED })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ids = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let status = add_playlist_items(&client_for(&server), "VLPLnew", &ids, true)
            .await
            .unwrap();

        assert_eq!(status.as_deref(), Some(STATUS_SUCCEEDED));
    }

    #[tokio::test]
    async fn test_add_items_missing_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "actions": [] })))
            .mount(&server)
            .await;

        let status = add_playlist_items(&client_for(&server), "PLnew", &["a".to_string()], false)
            .await
            .unwrap();

        assert_eq!(status, None);
    }
}
