use std::sync::Arc;

use backon::Retryable;
use color_eyre::eyre::{Result, WrapErr};
use tracing::instrument;

use super::progress::{MigrationEvent, ProgressReporter};
use super::queue::TrackReceiver;
use super::retry::SearchRetryPolicy;
use super::types::{SearchOutcome, Track, WorkerResult};
use crate::ports::youtube_music::{SearchError, SearchFilter, SearchHit, YoutubeMusicSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub filter: SearchFilter,
    pub ignore_spelling: bool,
    pub retry: SearchRetryPolicy,
}

/// Drain the queue, resolving every track, until the producer has finished
/// and nothing is left.
#[instrument(skip(searcher, queue, options, progress))]
pub async fn run_search_worker(
    worker_id: usize,
    searcher: Arc<dyn YoutubeMusicSearch>,
    queue: TrackReceiver,
    options: SearchOptions,
    progress: Arc<dyn ProgressReporter>,
) -> Result<WorkerResult> {
    let mut result = WorkerResult::default();

    while let Some(track) = queue.pop().await {
        let outcome = resolve_track(searcher.as_ref(), &track, &options).await?;
        match &outcome {
            SearchOutcome::Matched(video_id) => {
                tracing::debug!(track = %track.name, %video_id, "Resolved track");
            }
            SearchOutcome::Unresolved(name) => {
                tracing::info!(track = %name, "No YouTube Music match for track");
                progress.report(MigrationEvent::TrackUnresolved { name: name.clone() });
            }
        }
        result.record(outcome);
    }

    tracing::debug!(processed = result.processed(), "Search worker finished");
    Ok(result)
}

/// Full query first, then name + primary artist when there are several
/// artists. The first hit of whichever search answers wins.
pub async fn resolve_track(
    searcher: &dyn YoutubeMusicSearch,
    track: &Track,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    let queries = std::iter::once(track.full_query()).chain(track.primary_artist_query());

    for query in queries {
        let Some(hits) = search_or_degrade(searcher, &query, options).await? else {
            return Ok(SearchOutcome::Unresolved(track.name.clone()));
        };
        if let Some(hit) = hits.into_iter().next() {
            tracing::trace!(%query, title = ?hit.title, "Taking first search result");
            return Ok(SearchOutcome::Matched(hit.video_id));
        }
        tracing::debug!(%query, "Search returned no results");
    }

    Ok(SearchOutcome::Unresolved(track.name.clone()))
}

/// `Ok(None)` when the provider failed for this query and the track should be
/// given up on; `Err` only for transport failures.
async fn search_or_degrade(
    searcher: &dyn YoutubeMusicSearch,
    query: &str,
    options: &SearchOptions,
) -> Result<Option<Vec<SearchHit>>> {
    let search = || searcher.search(query, options.filter, options.ignore_spelling);

    match search
        .retry(options.retry.backoff())
        .when(SearchError::is_transient)
        .notify(|error, delay| {
            tracing::warn!(%query, error = %error, ?delay, "Transient search failure, retrying");
        })
        .await
    {
        Ok(hits) => Ok(Some(hits)),
        Err(error) if error.is_fatal() => {
            Err(error).wrap_err_with(|| format!("Failed to search YouTube Music for '{query}'"))
        }
        Err(error) => {
            tracing::warn!(%query, error = %error, "Search failed, leaving track unresolved");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::predicate::eq;

    use super::*;
    use crate::ports::youtube_music::MockYoutubeMusicSearch;
    use crate::services::migration::progress::SilentProgress;
    use crate::services::migration::progress::testing::RecordingProgress;
    use crate::services::migration::queue::work_queue;

    fn options() -> SearchOptions {
        SearchOptions {
            filter: SearchFilter::Songs,
            ignore_spelling: false,
            retry: SearchRetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::ZERO,
            },
        }
    }

    fn hit(video_id: &str) -> SearchHit {
        SearchHit {
            video_id: video_id.into(),
            title: None,
        }
    }

    fn song_a() -> Track {
        Track::new("Song A", vec!["Artist1".into(), "Artist2".into()])
    }

    #[tokio::test]
    async fn test_full_query_match_takes_first_hit() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher
            .expect_search()
            .with(eq("Song A Artist1 Artist2"), eq(SearchFilter::Songs), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(vec![hit("first"), hit("second")]));

        let outcome = resolve_track(&searcher, &song_a(), &options()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Matched("first".into()));
    }

    #[tokio::test]
    async fn test_fallback_to_primary_artist_when_full_query_is_empty() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher
            .expect_search()
            .with(eq("Song A Artist1 Artist2"), eq(SearchFilter::Songs), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(vec![]));
        searcher
            .expect_search()
            .with(eq("Song A Artist1"), eq(SearchFilter::Songs), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(vec![hit("fallback")]));

        let outcome = resolve_track(&searcher, &song_a(), &options()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Matched("fallback".into()));
    }

    #[tokio::test]
    async fn test_exactly_one_fallback_before_unresolved() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher
            .expect_search()
            .with(eq("Song A Artist1 Artist2"), eq(SearchFilter::Songs), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(vec![]));
        searcher
            .expect_search()
            .with(eq("Song A Artist1"), eq(SearchFilter::Songs), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let outcome = resolve_track(&searcher, &song_a(), &options()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Unresolved("Song A".into()));
    }

    #[tokio::test]
    async fn test_single_artist_track_has_no_fallback() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher
            .expect_search()
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let track = Track::new("Song B", vec!["Artist3".into()]);
        let outcome = resolve_track(&searcher, &track, &options()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Unresolved("Song B".into()));
    }

    #[tokio::test]
    async fn test_ignore_spelling_and_filter_are_forwarded() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher
            .expect_search()
            .with(eq("Song B Artist3"), eq(SearchFilter::Videos), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(vec![hit("video")]));

        let options = SearchOptions {
            filter: SearchFilter::Videos,
            ignore_spelling: true,
            ..options()
        };
        let track = Track::new("Song B", vec!["Artist3".into()]);
        let outcome = resolve_track(&searcher, &track, &options).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Matched("video".into()));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_locally() {
        let mut searcher = MockYoutubeMusicSearch::new();
        let mut calls = 0;
        searcher.expect_search().times(3).returning(move |_, _, _| {
            calls += 1;
            match calls {
                1 => Err(SearchError::RateLimited),
                2 => Err(SearchError::Server { status: 503 }),
                _ => Ok(vec![hit("eventually")]),
            }
        });

        let track = Track::new("Song B", vec!["Artist3".into()]);
        let outcome = resolve_track(&searcher, &track, &options()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Matched("eventually".into()));
    }

    #[tokio::test]
    async fn test_exhausted_transient_errors_degrade_to_unresolved() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher
            .expect_search()
            .times(3)
            .returning(|_, _, _| Err(SearchError::RateLimited));

        let track = Track::new("Song B", vec!["Artist3".into()]);
        let outcome = resolve_track(&searcher, &track, &options()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Unresolved("Song B".into()));
    }

    #[tokio::test]
    async fn test_provider_error_is_not_retried_and_skips_fallback() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher.expect_search().times(1).returning(|_, _, _| {
            Err(SearchError::Provider {
                reason: "bad request".into(),
            })
        });

        let outcome = resolve_track(&searcher, &song_a(), &options()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Unresolved("Song A".into()));
    }

    #[tokio::test]
    async fn test_worker_drains_queue_and_reports_unresolved() {
        let mut searcher = MockYoutubeMusicSearch::new();
        searcher
            .expect_search()
            .returning(|query, _, _| {
                if query.starts_with("Found") {
                    Ok(vec![hit(query)])
                } else {
                    Ok(vec![])
                }
            });

        let (sender, receiver) = work_queue();
        sender.push(Track::new("Found 1", vec!["X".into()])).unwrap();
        sender.push(Track::new("Missing", vec!["Y".into()])).unwrap();
        sender.push(Track::new("Found 2", vec!["Z".into()])).unwrap();
        sender.finish();

        let progress = Arc::new(RecordingProgress::default());
        let result = run_search_worker(0, Arc::new(searcher), receiver, options(), progress.clone())
            .await
            .unwrap();

        assert_eq!(result.resolved_ids, vec!["Found 1 X", "Found 2 Z"]);
        assert_eq!(result.unresolved_names, vec!["Missing"]);
        assert_eq!(
            progress.events(),
            vec![MigrationEvent::TrackUnresolved {
                name: "Missing".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_worker_exits_immediately_on_finished_empty_queue() {
        let searcher = MockYoutubeMusicSearch::new();
        let (sender, receiver) = work_queue();
        sender.finish();

        let result = run_search_worker(
            3,
            Arc::new(searcher),
            receiver,
            options(),
            Arc::new(SilentProgress),
        )
        .await
        .unwrap();

        assert_eq!(result, WorkerResult::default());
    }
}
