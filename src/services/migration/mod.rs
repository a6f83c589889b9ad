//! Spotify playlist -> YouTube Music playlist migration.
//!
//! One producer pages through the Spotify playlist and feeds a work queue;
//! a pool of search workers drains it, each keeping its own results. Once
//! the producer and every worker are done the results are merged and a
//! single playlist is created and populated.

pub mod aggregator;
pub mod creator;
pub mod producer;
pub mod progress;
pub mod queue;
pub mod retry;
pub mod types;
pub mod worker;

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tokio::task::JoinSet;
use tracing::{Instrument, instrument};

use crate::ports::spotify::SpotifyClient;
use crate::ports::youtube_music::{YoutubeMusicPlaylists, YoutubeMusicSearch};
use aggregator::gather_worker_results;
use creator::create_and_populate;
use producer::produce_tracks;
use progress::{MigrationEvent, ProgressReporter};
use queue::work_queue;
use retry::RetryPolicy;
use worker::{SearchOptions, run_search_worker};

pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str = "Spotify playlist";

#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub playlist_id: String,
    pub workers: usize,
    pub search: SearchOptions,
    pub description: String,
    pub add_retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub playlist_name: String,
    pub source_total: u32,
    pub destination_playlist_id: String,
    pub resolved: usize,
    pub unresolved_names: Vec<String>,
    pub populated: bool,
    pub add_attempts: usize,
}

pub struct PlaylistMigrator {
    spotify: Arc<dyn SpotifyClient>,
    searcher: Arc<dyn YoutubeMusicSearch>,
    library: Arc<dyn YoutubeMusicPlaylists>,
    progress: Arc<dyn ProgressReporter>,
}

impl PlaylistMigrator {
    pub fn new(
        spotify: Arc<dyn SpotifyClient>,
        searcher: Arc<dyn YoutubeMusicSearch>,
        library: Arc<dyn YoutubeMusicPlaylists>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            spotify,
            searcher,
            library,
            progress,
        }
    }

    #[instrument(skip(self, request), fields(playlist_id = %request.playlist_id, workers = request.workers))]
    pub async fn migrate(&self, request: &MigrationRequest) -> Result<MigrationReport> {
        let (sender, receiver) = work_queue();

        let producer = tokio::spawn(
            produce_tracks(
                self.spotify.clone(),
                request.playlist_id.clone(),
                sender,
                self.progress.clone(),
            )
            .in_current_span(),
        );

        let workers = request.workers.max(1);
        self.progress
            .report(MigrationEvent::SearchStarted { workers });
        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(
                run_search_worker(
                    worker_id,
                    self.searcher.clone(),
                    receiver.clone(),
                    request.search,
                    self.progress.clone(),
                )
                .in_current_span(),
            );
        }
        drop(receiver);

        let aggregate = gather_worker_results(pool).await;
        let metadata = producer.await.wrap_err("Spotify producer panicked")?;
        // A worker failure also makes the producer fail on its next push;
        // the worker's error is the one worth reporting.
        let aggregate = aggregate?;
        let metadata = metadata?;

        tracing::info!(
            processed = aggregate.total(),
            resolved = aggregate.resolved_ids.len(),
            unresolved = aggregate.unresolved_names.len(),
            "Finished searching YouTube Music"
        );

        let creation = create_and_populate(
            self.library.as_ref(),
            &metadata.name,
            &request.description,
            &aggregate.resolved_ids,
            request.add_retry,
            self.progress.as_ref(),
        )
        .await?;

        Ok(MigrationReport {
            playlist_name: metadata.name,
            source_total: metadata.total_tracks,
            destination_playlist_id: creation.playlist_id,
            resolved: aggregate.resolved_ids.len(),
            unresolved_names: aggregate.unresolved_names,
            populated: creation.populated,
            add_attempts: creation.add_attempts,
        })
    }
}
