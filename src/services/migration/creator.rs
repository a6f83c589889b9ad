use std::sync::atomic::{AtomicUsize, Ordering};

use backon::Retryable;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::instrument;

use super::progress::{MigrationEvent, ProgressReporter};
use super::retry::RetryPolicy;
use crate::ports::youtube_music::{AddItemsStatus, YoutubeMusicPlaylists};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistCreation {
    pub playlist_id: String,
    /// Whether the bulk-add eventually succeeded. Vacuously true when there
    /// was nothing to add.
    pub populated: bool,
    pub add_attempts: usize,
}

/// Create the destination playlist, then bulk-add every resolved id,
/// duplicates included.
///
/// Failing to create the playlist is fatal. Failing to populate it is not:
/// after the retry policy is exhausted the empty playlist is left in place.
#[instrument(skip(library, video_ids, retry, progress), fields(items = video_ids.len()))]
pub async fn create_and_populate(
    library: &dyn YoutubeMusicPlaylists,
    name: &str,
    description: &str,
    video_ids: &[String],
    retry: RetryPolicy,
    progress: &dyn ProgressReporter,
) -> Result<PlaylistCreation> {
    progress.report(MigrationEvent::CreatingPlaylist {
        name: name.to_string(),
    });
    let playlist_id = library
        .create_playlist(name, description)
        .await
        .wrap_err("Failed to create YouTube Music playlist")?;
    tracing::info!(%playlist_id, "Created YouTube Music playlist");

    if video_ids.is_empty() {
        tracing::warn!("No tracks were resolved, leaving the playlist empty");
        return Ok(PlaylistCreation {
            playlist_id,
            populated: true,
            add_attempts: 0,
        });
    }

    progress.report(MigrationEvent::AddingItems {
        count: video_ids.len(),
    });

    let attempts = AtomicUsize::new(0);
    let add = || add_once(library, &playlist_id, video_ids, &attempts);
    let outcome = add
        .retry(retry.backoff())
        .notify(|error, delay| {
            let attempt = attempts.load(Ordering::SeqCst);
            tracing::warn!(attempt, ?delay, error = %error, "Failed adding items to playlist, retrying");
            progress.report(MigrationEvent::AddRetryScheduled { attempt, delay });
        })
        .await;
    let add_attempts = attempts.load(Ordering::SeqCst);

    let populated = match outcome {
        Ok(()) => {
            progress.report(MigrationEvent::AddSucceeded {
                count: video_ids.len(),
            });
            true
        }
        Err(error) => {
            tracing::error!(
                %playlist_id,
                attempts = add_attempts,
                max_attempts = retry.max_attempts(),
                error = ?error,
                "Giving up adding items to playlist"
            );
            progress.report(MigrationEvent::AddFailed {
                attempts: add_attempts,
            });
            false
        }
    };

    Ok(PlaylistCreation {
        playlist_id,
        populated,
        add_attempts,
    })
}

async fn add_once(
    library: &dyn YoutubeMusicPlaylists,
    playlist_id: &str,
    video_ids: &[String],
    attempts: &AtomicUsize,
) -> Result<()> {
    attempts.fetch_add(1, Ordering::SeqCst);
    match library.add_playlist_items(playlist_id, video_ids, true).await? {
        AddItemsStatus::Succeeded => Ok(()),
        AddItemsStatus::Failed { status } => Err(eyre!("YouTube Music reported status {status}")),
    }
}
