use std::num::NonZeroU32;

use color_eyre::eyre::{Result, WrapErr, eyre};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};
use url::Url;

use crate::ports::youtube_music::{
    AddItemsStatus, SearchError, SearchFilter, SearchHit, YoutubeMusicPlaylists,
    YoutubeMusicSearch,
};
use crate::youtube_music_rs::playlist::{STATUS_SUCCEEDED, add_playlist_items, create_playlist};
use crate::youtube_music_rs::search::search;
use crate::youtube_music_rs::{BrowserAuth, InnerTubeClient, InnerTubeError};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// YouTube Music port adapter over the InnerTube API.
///
/// Search works anonymously; playlist edits need [`BrowserAuth`].
pub struct YoutubeMusicHttpAdapter {
    client: InnerTubeClient,
    search_limiter: Option<DirectRateLimiter>,
}

impl YoutubeMusicHttpAdapter {
    /// Anonymous adapter used by the search workers.
    pub fn anonymous(base_url: Url) -> Self {
        Self {
            client: InnerTubeClient::new(base_url, None),
            search_limiter: None,
        }
    }

    pub fn authenticated(base_url: Url, auth: BrowserAuth) -> Self {
        Self {
            client: InnerTubeClient::new(base_url, Some(auth)),
            search_limiter: None,
        }
    }

    /// Cap searches across all workers sharing this adapter. `0` disables the cap.
    pub fn with_search_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.search_limiter = NonZeroU32::new(requests_per_second)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));
        self
    }

    fn require_auth(&self) -> Result<()> {
        if self.client.is_authenticated() {
            Ok(())
        } else {
            Err(eyre!("YouTube Music playlist changes require browser headers"))
        }
    }
}

fn to_search_error(error: InnerTubeError) -> SearchError {
    match error {
        InnerTubeError::Transport(error) => SearchError::Transport(error),
        InnerTubeError::Status { status: 429, .. } => SearchError::RateLimited,
        InnerTubeError::Status { status, .. } if status >= 500 => SearchError::Server { status },
        other => SearchError::Provider {
            reason: other.to_string(),
        },
    }
}

#[async_trait::async_trait]
impl YoutubeMusicSearch for YoutubeMusicHttpAdapter {
    async fn search(
        &self,
        query: &str,
        filter: SearchFilter,
        ignore_spelling: bool,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if let Some(limiter) = &self.search_limiter {
            limiter.until_ready().await;
        }

        let results = search(&self.client, query, filter, ignore_spelling)
            .await
            .map_err(to_search_error)?;

        Ok(results
            .into_iter()
            .map(|result| SearchHit {
                video_id: result.video_id,
                title: result.title,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl YoutubeMusicPlaylists for YoutubeMusicHttpAdapter {
    async fn create_playlist(&self, title: &str, description: &str) -> Result<String> {
        self.require_auth()?;
        create_playlist(&self.client, title, description)
            .await
            .wrap_err_with(|| format!("Failed to create YouTube Music playlist '{}'", title))
    }

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        video_ids: &[String],
        duplicates: bool,
    ) -> Result<AddItemsStatus> {
        self.require_auth()?;
        let status = add_playlist_items(&self.client, playlist_id, video_ids, duplicates)
            .await
            .wrap_err("Failed to add items to YouTube Music playlist")?;

        Ok(match status {
            Some(status) if status == STATUS_SUCCEEDED => AddItemsStatus::Succeeded,
            Some(status) => AddItemsStatus::Failed { status },
            None => AddItemsStatus::Failed {
                status: "missing status".to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn base_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/youtubei/v1/", server.uri())).unwrap()
    }

    fn authenticated(server: &MockServer) -> YoutubeMusicHttpAdapter {
        YoutubeMusicHttpAdapter::authenticated(
            base_url(server),
            BrowserAuth::from_raw_headers("Cookie: SAPISID=abc").unwrap(),
        )
    }

    async fn respond_to_search(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/search"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start().await;
        respond_to_search(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "contents": { "sectionListRenderer": { "contents": [{
                    "musicShelfRenderer": { "contents": [{
                        "musicResponsiveListItemRenderer": { "playlistItemData": { "videoId": "vid1" } }
                    }] }
                }] } }
            })),
        )
        .await;

        let adapter = YoutubeMusicHttpAdapter::anonymous(base_url(&server));
        let hits = adapter
            .search("Song A", SearchFilter::Songs, false)
            .await
            .unwrap();

        assert_eq!(
            hits,
            vec![SearchHit {
                video_id: "vid1".into(),
                title: None
            }]
        );
    }

    #[tokio::test]
    async fn test_search_error_classification() {
        let server = MockServer::start().await;
        let adapter = YoutubeMusicHttpAdapter::anonymous(base_url(&server));

        respond_to_search(&server, ResponseTemplate::new(429)).await;
        let error = adapter.search("q", SearchFilter::Videos, false).await.unwrap_err();
        assert!(matches!(error, SearchError::RateLimited));
        assert!(error.is_transient());

        server.reset().await;
        respond_to_search(&server, ResponseTemplate::new(503)).await;
        let error = adapter.search("q", SearchFilter::Videos, false).await.unwrap_err();
        assert!(matches!(error, SearchError::Server { status: 503 }));

        server.reset().await;
        respond_to_search(&server, ResponseTemplate::new(400).set_body_string("bad")).await;
        let error = adapter.search("q", SearchFilter::Videos, false).await.unwrap_err();
        assert!(matches!(error, SearchError::Provider { .. }));
        assert!(!error.is_transient());
        assert!(!error.is_fatal());
    }

    #[tokio::test]
    async fn test_search_connection_failure_is_fatal() {
        let adapter =
            YoutubeMusicHttpAdapter::anonymous(Url::parse("http://127.0.0.1:1/youtubei/v1/").unwrap());
        let error = adapter.search("q", SearchFilter::Videos, false).await.unwrap_err();
        assert!(error.is_fatal());
    }

    #[tokio::test]
    async fn test_search_rate_limit_spaces_requests() {
        let server = MockServer::start().await;
        respond_to_search(&server, ResponseTemplate::new(200).set_body_json(json!({}))).await;

        let adapter =
            YoutubeMusicHttpAdapter::anonymous(base_url(&server)).with_search_rate_limit(2);
        let started = Instant::now();
        for _ in 0..4 {
            adapter.search("q", SearchFilter::Videos, false).await.unwrap();
        }

        // 2 requests of burst, then one every 500ms
        assert!(started.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_playlist_changes_need_auth() {
        let server = MockServer::start().await;
        let adapter = YoutubeMusicHttpAdapter::anonymous(base_url(&server));

        assert!(adapter.create_playlist("x", "y").await.is_err());
        assert!(
            adapter
                .add_playlist_items("PL", &["a".to_string()], true)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_add_items_status_mapping() {
        let server = MockServer::start().await;
        let adapter = authenticated(&server);
        let ids = vec!["a".to_string()];

        Mock::given(method("POST"))
            .and(path("/youtubei/v1/browse/edit_playlist"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "STATUS_SUCCEEDED" })),
            )
            .mount(&server)
            .await;
        assert_eq!(
            adapter.add_playlist_items("PL", &ids, true).await.unwrap(),
            AddItemsStatus::Succeeded
        );

        server.reset().await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/browse/edit_playlist"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "STATUS_FAILED" })),
            )
            .mount(&server)
            .await;
        assert_eq!(
            adapter.add_playlist_items("PL", &ids, true).await.unwrap(),
            AddItemsStatus::Failed {
                status: "STATUS_FAILED".into()
            }
        );

        server.reset().await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/browse/edit_playlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        assert_ne!(
            adapter.add_playlist_items("PL", &ids, true).await.unwrap(),
            AddItemsStatus::Succeeded
        );
    }

    #[tokio::test]
    async fn test_create_playlist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/playlist/create"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "playlistId": "PLx" })))
            .mount(&server)
            .await;

        let id = authenticated(&server)
            .create_playlist("Road Trip", "Spotify playlist")
            .await
            .unwrap();
        assert_eq!(id, "PLx");
    }
}
